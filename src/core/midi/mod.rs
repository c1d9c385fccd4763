mod input;

pub use input::MidiInputHandler;

pub const NOTE_ON: u8 = 144;
pub const NOTE_OFF: u8 = 128;

/// Note messages the session acts on. Everything else a device sends is
/// dropped at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { pitch: u8, velocity: u8 },
    NoteOff { pitch: u8 },
}

impl MidiEvent {
    /// Only the exact status bytes 144 and 128 are understood, so note
    /// messages on channels other than the first are ignored too. A note-on
    /// with velocity 0 is a note-off, as most keyboards send it that way.
    pub fn decode(status: u8, data1: u8, data2: u8) -> Option<Self> {
        match status {
            NOTE_ON if data2 == 0 => Some(MidiEvent::NoteOff { pitch: data1 }),
            NOTE_ON => Some(MidiEvent::NoteOn {
                pitch: data1,
                velocity: data2,
            }),
            NOTE_OFF => Some(MidiEvent::NoteOff { pitch: data1 }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_note_messages_only() {
        assert_eq!(
            MidiEvent::decode(144, 60, 100),
            Some(MidiEvent::NoteOn { pitch: 60, velocity: 100 })
        );
        assert_eq!(MidiEvent::decode(128, 60, 64), Some(MidiEvent::NoteOff { pitch: 60 }));
        assert_eq!(MidiEvent::decode(144, 60, 0), Some(MidiEvent::NoteOff { pitch: 60 }));
        // control change, pitch bend, note-on on channel 2
        assert_eq!(MidiEvent::decode(176, 1, 64), None);
        assert_eq!(MidiEvent::decode(224, 0, 64), None);
        assert_eq!(MidiEvent::decode(145, 60, 100), None);
    }
}
