//! Piano helper: a polyphonic software synth that listens to what you play,
//! guesses the key and accompanies you with drums, chords and bass.

pub mod app;
pub mod audio;
pub mod core;
pub mod error;
pub mod messaging;
pub mod settings;

pub use app::{Session, Snapshot};
pub use error::{Error, Result};
pub use settings::Settings;
