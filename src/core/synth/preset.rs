use serde::{Deserialize, Serialize};
use crate::core::oscillator::{EnvelopeParams, Waveform};

/// Sound of one instrument: waveform, ADSR and output amplitude. Fixed when
/// the instrument is constructed; every voice of the instrument shares it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstrumentPreset {
    pub waveform: Waveform,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub amplitude: f32,
}

impl InstrumentPreset {
    pub fn new(waveform: Waveform, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            waveform,
            attack,
            decay,
            sustain,
            release,
            amplitude: 0.1,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn envelope(&self) -> EnvelopeParams {
        EnvelopeParams::new(self.attack, self.decay, self.sustain, self.release)
    }

    /// The playable keyboard
    pub fn keyboard() -> Self {
        Self::new(Waveform::Square, 0.1, 0.1, 0.5, 0.3)
    }

    pub fn drums() -> Self {
        Self::new(Waveform::Noise, 0.01, 0.0, 1.0, 0.1)
    }

    pub fn chords() -> Self {
        Self::new(Waveform::Sine, 0.1, 0.2, 0.9, 0.4)
    }

    pub fn bass() -> Self {
        Self::new(Waveform::Sine, 0.1, 0.2, 0.9, 0.4)
    }
}

impl Default for InstrumentPreset {
    fn default() -> Self {
        Self::keyboard()
    }
}
