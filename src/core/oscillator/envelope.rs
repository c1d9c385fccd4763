use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Decay,
    Sustain,
    Release,
    Dead,
}

/// ADSR timings in seconds plus the sustain level (0.0..=1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl EnvelopeParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: attack.max(0.0),
            decay: decay.max(0.0),
            sustain: sustain.clamp(0.0, 1.0),
            release: release.max(0.0),
        }
    }
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self::new(0.1, 0.2, 0.7, 0.3)
    }
}

/// Per-voice amplitude shape. Every call to [`Envelope::value`] consumes one
/// sample of time, so the envelope must be read exactly once per rendered
/// sample.
#[derive(Debug, Clone)]
pub struct Envelope {
    params: EnvelopeParams,
    sample_rate: f32,
    gain: f32,
    counter: u64,
    released_at: Option<u64>,
}

impl Envelope {
    /// `gain` is the constant factor applied on top of the ADSR shape:
    /// instrument amplitude times the note's velocity gain.
    pub fn new(params: EnvelopeParams, sample_rate: f32, gain: f32) -> Self {
        Self {
            params,
            sample_rate,
            gain,
            counter: 0,
            released_at: None,
        }
    }

    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    /// Seconds since the envelope was created
    pub fn elapsed(&self) -> f32 {
        self.counter as f32 / self.sample_rate
    }

    fn release_elapsed(&self) -> Option<f32> {
        self.released_at
            .map(|at| (self.counter - at) as f32 / self.sample_rate)
    }

    /// Enter the release stage, which always ramps down from the sustain
    /// level. Later calls are ignored.
    pub fn release(&mut self) {
        if self.released_at.is_none() {
            self.released_at = Some(self.counter);
        }
    }

    pub fn is_released(&self) -> bool {
        self.released_at.is_some()
    }

    pub fn is_dead(&self) -> bool {
        self.stage() == EnvelopeStage::Dead
    }

    pub fn stage(&self) -> EnvelopeStage {
        if let Some(elapsed) = self.release_elapsed() {
            return if elapsed > self.params.release {
                EnvelopeStage::Dead
            } else {
                EnvelopeStage::Release
            };
        }
        let t = self.elapsed();
        if t < self.params.attack {
            EnvelopeStage::Attack
        } else if t < self.params.attack + self.params.decay {
            EnvelopeStage::Decay
        } else {
            EnvelopeStage::Sustain
        }
    }

    // ADSR level at the current counter, without the gain
    fn shape(&self) -> f32 {
        let p = &self.params;
        match self.stage() {
            EnvelopeStage::Attack => self.elapsed() / p.attack,
            EnvelopeStage::Decay => {
                let t = self.elapsed() - p.attack;
                1.0 - (1.0 - p.sustain) * (t / p.decay)
            },
            EnvelopeStage::Sustain => p.sustain,
            EnvelopeStage::Release => {
                let t = self.release_elapsed().unwrap_or_default();
                if p.release > 0.0 {
                    (p.sustain * (1.0 - t / p.release)).max(0.0)
                } else {
                    0.0
                }
            },
            EnvelopeStage::Dead => 0.0,
        }
    }

    /// Current amplitude, then advance one sample
    pub fn value(&mut self) -> f32 {
        let value = self.shape() * self.gain;
        self.counter += 1;
        value
    }
}
