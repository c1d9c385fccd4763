mod envelope;
mod note;
mod waveform;

// Re-export key types so they're accessible from core::oscillator
pub use self::envelope::{Envelope, EnvelopeParams, EnvelopeStage};
pub use self::note::{midi_note_to_freq, pitch_class_name, Note};
pub use self::waveform::Waveform;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Sample generator for one sounding pitch. The running sample counter is the
/// only state a periodic waveform needs, so consecutive buffers join without
/// a phase jump.
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    sample_rate: f32,
    counter: u64,
    rng: SmallRng,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self::with_seed(waveform, frequency, sample_rate, rand::random())
    }

    pub fn with_seed(waveform: Waveform, frequency: f32, sample_rate: f32, seed: u64) -> Self {
        Self {
            waveform,
            frequency,
            sample_rate,
            counter: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Number of samples produced so far
    pub fn counter(&self) -> u64 {
        self.counter
    }

    fn phase(&self) -> f32 {
        // f64 keeps the phase exact over hours of counter growth
        let cycles = self.counter as f64 * self.frequency as f64 / self.sample_rate as f64;
        cycles.fract() as f32
    }

    pub fn next_sample(&mut self) -> f32 {
        let value = match self.waveform {
            Waveform::Noise => self.rng.random::<f32>() * 2.0 - 1.0,
            waveform => waveform.sample(self.phase()),
        };
        self.counter += 1;
        value
    }

    /// Lazily yields the next `length` samples. The counter always moves by
    /// exactly `length`, even if the iterator is dropped early.
    pub fn samples(&mut self, length: usize) -> Samples<'_> {
        Samples {
            oscillator: self,
            remaining: length,
        }
    }
}

pub struct Samples<'a> {
    oscillator: &'a mut Oscillator,
    remaining: usize,
}

impl Iterator for Samples<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.oscillator.next_sample())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Samples<'_> {}

impl Drop for Samples<'_> {
    fn drop(&mut self) {
        self.oscillator.counter += self.remaining as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    const SAMPLE_RATE: f32 = 44100.0;

    #[test]
    fn consecutive_buffers_are_phase_continuous() {
        for waveform in [Waveform::Sine, Waveform::Square, Waveform::Saw, Waveform::Triangle] {
            let mut whole = Oscillator::new(waveform, 261.63, SAMPLE_RATE);
            let mut split = Oscillator::new(waveform, 261.63, SAMPLE_RATE);

            let expected: Vec<f32> = whole.samples(512).collect();
            let mut actual: Vec<f32> = split.samples(256).collect();
            actual.extend(split.samples(256));

            assert_eq!(split.counter(), 512);
            for (a, b) in expected.iter().zip(actual.iter()) {
                assert!(approx_eq!(f32, *a, *b, epsilon = 1e-6));
            }
        }
    }

    #[test]
    fn dropped_iterator_still_advances() {
        let mut osc = Oscillator::new(Waveform::Sine, 440.0, SAMPLE_RATE);
        let first: Vec<f32> = osc.samples(256).take(10).collect();
        assert_eq!(first.len(), 10);
        assert_eq!(osc.counter(), 256);
    }

    #[test]
    fn sine_completes_one_cycle_per_period() {
        // 441 Hz at 44.1 kHz is exactly 100 samples per period.
        let mut osc = Oscillator::new(Waveform::Sine, 441.0, SAMPLE_RATE);
        let samples: Vec<f32> = osc.samples(101).collect();
        assert!(approx_eq!(f32, samples[0], 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, samples[25], 1.0, epsilon = 1e-4));
        assert!(approx_eq!(f32, samples[75], -1.0, epsilon = 1e-4));
        assert!(approx_eq!(f32, samples[100], 0.0, epsilon = 1e-4));
    }

    #[test]
    fn noise_ignores_frequency_and_is_bounded() {
        let mut low = Oscillator::with_seed(Waveform::Noise, 20.0, SAMPLE_RATE, 7);
        let mut high = Oscillator::with_seed(Waveform::Noise, 8000.0, SAMPLE_RATE, 7);
        let a: Vec<f32> = low.samples(1024).collect();
        let b: Vec<f32> = high.samples(1024).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(a.iter().any(|s| *s != a[0]));
    }
}
