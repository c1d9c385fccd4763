use crate::error::{Error, Result};

const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const FLAT_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

/// Convert MIDI note number to frequency in Hz
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

/// Name of a pitch class (0..12), spelled with sharps or flats
pub fn pitch_class_name(pitch_class: u8, sharps: bool) -> &'static str {
    let names = if sharps { &SHARP_NAMES } else { &FLAT_NAMES };
    names[(pitch_class % 12) as usize]
}

/// A pressed key: MIDI pitch plus strike velocity. Both are validated on
/// construction, so a `Note` inside the core is always in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pitch: u8,
    velocity: u8,
}

impl Note {
    pub fn new(pitch: i32, velocity: i32) -> Result<Self> {
        if !(0..=127).contains(&pitch) || !(0..=127).contains(&velocity) {
            return Err(Error::InvalidNote { pitch, velocity });
        }
        Ok(Self {
            pitch: pitch as u8,
            velocity: velocity as u8,
        })
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn frequency(&self) -> f32 {
        midi_note_to_freq(self.pitch)
    }

    /// Amplitude factor derived from velocity, 0.0..=1.0
    pub fn gain(&self) -> f32 {
        self.velocity as f32 / 127.0
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }

    /// Scientific pitch name, e.g. `C4` for pitch 60
    pub fn name(&self, sharps: bool) -> String {
        let octave = self.pitch as i32 / 12 - 1;
        format!("{}{}", pitch_class_name(self.pitch_class(), sharps), octave)
    }
}
