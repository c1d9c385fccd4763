use serde::{Deserialize, Serialize};

/// Soft knee-less compressor. Magnitudes above `threshold` grow at
/// `1/ratio` of their input rate; the sign is preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compressor {
    threshold: f32,
    ratio: f32,
}

impl Compressor {
    pub fn new(threshold: f32, ratio: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
            // below 1:1 would expand
            ratio: ratio.max(1.0),
        }
    }

    pub fn process(&self, sample: f32) -> f32 {
        let magnitude = sample.abs();
        if magnitude > self.threshold {
            (self.threshold + (magnitude - self.threshold) / self.ratio) * sample.signum()
        } else {
            sample
        }
    }
}

/// Hard clamp to `-ceiling..=ceiling`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limiter {
    ceiling: f32,
}

impl Limiter {
    pub fn new(ceiling: f32) -> Self {
        Self { ceiling: ceiling.abs() }
    }

    pub fn process(&self, sample: f32) -> f32 {
        sample.clamp(-self.ceiling, self.ceiling)
    }
}

/// Master processing settings, as stored in the settings file
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MasterSettings {
    pub threshold: f32,
    pub ratio: f32,
    pub ceiling: f32,
    pub headroom: f32,
}

impl Default for MasterSettings {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            ratio: 4.0,
            ceiling: 1.0,
            headroom: 0.8,
        }
    }
}

/// Compressor, then limiter, then output headroom scaling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectChain {
    compressor: Compressor,
    limiter: Limiter,
    headroom: f32,
}

impl EffectChain {
    pub fn new(settings: &MasterSettings) -> Self {
        Self {
            compressor: Compressor::new(settings.threshold, settings.ratio),
            limiter: Limiter::new(settings.ceiling),
            headroom: settings.headroom.clamp(0.0, 1.0),
        }
    }

    pub fn process(&self, sample: f32) -> f32 {
        self.limiter.process(self.compressor.process(sample)) * self.headroom
    }

    pub fn process_buffer(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }
}

impl Default for EffectChain {
    fn default() -> Self {
        Self::new(&MasterSettings::default())
    }
}
