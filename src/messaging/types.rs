use crate::core::oscillator::Note;

/// Asks an instrument bus to start a new voice. `serial` increases with every
/// press sent through the same instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressRequest {
    pub note: Note,
    pub serial: u64,
}

/// Asks an instrument bus to release voices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseRequest {
    /// Release the oldest still-held voice with this pitch
    Pitch(u8),
    /// Release every voice whose press serial is below `before`, i.e. every
    /// voice pressed before the request was made
    All { before: u64 },
}

/// `(status, data1, data2)` exactly as the MIDI collaborator delivers it
pub type RawMidiMessage = (u8, u8, u8);
