pub mod accompany;
pub mod harmony;
pub mod midi;
pub mod oscillator;
pub mod synth;
pub mod visualization;
pub mod voice;

pub use accompany::{Accompanist, Part};
pub use harmony::HarmonyTracker;
pub use synth::{InstrumentBus, InstrumentHandle};
