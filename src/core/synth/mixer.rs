use super::effects::{EffectChain, MasterSettings};
use super::InstrumentBus;

/// Fixed output rate of the engine
pub const SAMPLE_RATE: u32 = 44100;
/// Frames produced per pull
pub const BUFFER_SIZE: usize = 256;

/// Sums every registered instrument bus and runs the master effect chain.
/// Lives on the audio thread once the engine starts.
#[derive(Debug)]
pub struct Mixer {
    buses: Vec<InstrumentBus>,
    effects: EffectChain,
    scratch: Vec<f32>,
}

impl Mixer {
    pub fn new(master: &MasterSettings) -> Self {
        Self {
            buses: Vec::new(),
            effects: EffectChain::new(master),
            scratch: vec![0.0; BUFFER_SIZE],
        }
    }

    pub fn add_bus(&mut self, bus: InstrumentBus) {
        log::debug!("registering instrument '{}'", bus.name());
        self.buses.push(bus);
    }

    pub fn buses(&self) -> &[InstrumentBus] {
        &self.buses
    }

    /// Fill `out` with the processed mix, as floats within the output headroom.
    /// Works in chunks of at most [`BUFFER_SIZE`] so the scratch buffer never grows.
    pub fn pull_mix(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(BUFFER_SIZE) {
            chunk.fill(0.0);
            let scratch = &mut self.scratch[..chunk.len()];
            for bus in self.buses.iter_mut() {
                bus.pull_samples(scratch);
                for (mixed, sample) in chunk.iter_mut().zip(scratch.iter()) {
                    *mixed += *sample;
                }
            }
            self.effects.process_buffer(chunk);
        }
    }

    /// Same as [`pull_mix`](Self::pull_mix), quantized to signed 16-bit
    pub fn pull_mix_i16(&mut self, out: &mut [i16]) {
        let mut floats = [0.0f32; BUFFER_SIZE];
        for chunk in out.chunks_mut(BUFFER_SIZE) {
            let floats = &mut floats[..chunk.len()];
            self.pull_mix(floats);
            for (quantized, sample) in chunk.iter_mut().zip(floats.iter()) {
                *quantized = quantize(*sample);
            }
        }
    }
}

/// Map -1.0..=1.0 onto the full i16 range
pub fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}
