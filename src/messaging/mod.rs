mod bus;
mod types;

pub use bus::{NoteQueue, QueueReceiver};
pub use types::{PressRequest, RawMidiMessage, ReleaseRequest};
