use crate::core::oscillator::{Envelope, EnvelopeParams, Note, Oscillator, Waveform};

/// One sounding pitch: the note that started it, its oscillator and its
/// envelope. Owned by exactly one instrument bus.
#[derive(Debug, Clone)]
pub struct Voice {
    note: Note,
    serial: u64,
    oscillator: Oscillator,
    envelope: Envelope,
}

impl Voice {
    pub fn new(note: Note, waveform: Waveform, params: EnvelopeParams, amplitude: f32, sample_rate: f32) -> Self {
        Self {
            note,
            serial: 0,
            oscillator: Oscillator::new(waveform, note.frequency(), sample_rate),
            envelope: Envelope::new(params, sample_rate, amplitude * note.gain()),
        }
    }

    /// Tag the voice with the serial of the press that started it
    pub fn with_serial(mut self, serial: u64) -> Self {
        self.serial = serial;
        self
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn pitch(&self) -> u8 {
        self.note.pitch()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn release(&mut self) {
        self.envelope.release();
    }

    pub fn is_released(&self) -> bool {
        self.envelope.is_released()
    }

    pub fn is_dead(&self) -> bool {
        self.envelope.is_dead()
    }

    /// Adds this voice's next `buffer.len()` samples into `buffer`
    pub fn render_into(&mut self, buffer: &mut [f32]) {
        let len = buffer.len();
        let envelope = &mut self.envelope;
        for (out, sample) in buffer.iter_mut().zip(self.oscillator.samples(len)) {
            *out += sample * envelope.value();
        }
    }
}
