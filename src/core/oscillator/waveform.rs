use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
    Noise,
}

impl Waveform {
    /// Value of a periodic waveform at `phase` (0.0..1.0 within one period).
    /// Noise has no periodic shape and reads as silence here; the oscillator
    /// draws noise from its own generator.
    pub fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            // sign of the sine
            Waveform::Square => if phase < 0.5 { 1.0 } else { -1.0 },
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    -4.0 + 4.0 * phase
                }
            },
            Waveform::Noise => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn shapes_hit_their_landmarks() {
        assert!(approx_eq!(f32, Waveform::Sine.sample(0.25), 1.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, Waveform::Sine.sample(0.75), -1.0, epsilon = 1e-6));
        assert_eq!(Waveform::Square.sample(0.1), 1.0);
        assert_eq!(Waveform::Square.sample(0.6), -1.0);
        assert_eq!(Waveform::Saw.sample(0.0), -1.0);
        assert_eq!(Waveform::Saw.sample(0.5), 0.0);
        assert_eq!(Waveform::Triangle.sample(0.0), 0.0);
        assert_eq!(Waveform::Triangle.sample(0.25), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.75), -1.0);
    }

    #[test]
    fn periodic_shapes_stay_bipolar() {
        for waveform in [Waveform::Sine, Waveform::Square, Waveform::Saw, Waveform::Triangle] {
            for i in 0..1000 {
                let value = waveform.sample(i as f32 / 1000.0);
                assert!((-1.0..=1.0).contains(&value), "{waveform:?} gave {value}");
            }
        }
    }
}
