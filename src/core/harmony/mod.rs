//! Key and chord estimation from recently played pitch classes.
//!
//! Every struck note bumps its pitch-class bin and then decays the whole
//! histogram, so the estimate follows what was played most recently rather
//! than what is currently held. Only major keys are considered.

use crate::core::oscillator::pitch_class_name;

/// Applied to every bin after each note
pub const DECAY: f32 = 0.9;
/// Semitone offsets of the major scale degrees
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
/// Roman numerals of the triads on each major scale degree
pub const DEGREE_NAMES: [&str; 7] = ["I", "ii", "iii", "IV", "V", "vi", "vii"];

#[derive(Debug, Clone, Default)]
pub struct HarmonyTracker {
    histogram: [f32; 12],
    held: Vec<u8>,
}

impl HarmonyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_note(&mut self, pitch: u8) {
        self.held.push(pitch);
        self.histogram[(pitch % 12) as usize] += 1.0;
        for bin in self.histogram.iter_mut() {
            *bin *= DECAY;
        }
    }

    /// Forget a held note. The histogram is left untouched.
    pub fn remove_note(&mut self, pitch: u8) {
        if let Some(index) = self.held.iter().position(|p| *p == pitch) {
            self.held.remove(index);
        }
    }

    /// True until the first note is played
    pub fn is_empty(&self) -> bool {
        self.histogram.iter().all(|bin| *bin == 0.0)
    }

    pub fn histogram(&self) -> &[f32; 12] {
        &self.histogram
    }

    /// Pitches currently held down, in press order
    pub fn held_notes(&self) -> &[u8] {
        &self.held
    }

    /// Sum of the bins `included` accepts, always added in ascending pitch
    /// class order so the same set of bins gives the same total bit for bit.
    fn ordered_sum(&self, included: impl Fn(u8) -> bool) -> f32 {
        (0..12u8)
            .filter(|pc| included(*pc))
            .map(|pc| self.histogram[pc as usize])
            .sum()
    }

    fn key_weight(&self, root: u8) -> f32 {
        self.ordered_sum(|pc| MAJOR_SCALE.contains(&((pc + 12 - root) % 12)))
    }

    /// Root pitch class of the best-matching major key. Ties go to the lowest
    /// root; an empty histogram reads as C.
    pub fn key_signature(&self) -> u8 {
        let mut best = 0;
        let mut best_weight = self.key_weight(0);
        for root in 1..12 {
            let weight = self.key_weight(root);
            if weight > best_weight {
                best = root;
                best_weight = weight;
            }
        }
        best
    }

    /// e.g. "C major" or "Eb major"
    pub fn key_signature_name(&self, sharps: bool) -> String {
        format!("{} major", pitch_class_name(self.key_signature(), sharps))
    }

    /// Pitch classes of the detected key's seven degrees. Values may exceed
    /// 11 (root + offset is not wrapped) so they can be added to a base pitch
    /// and stay ascending.
    pub fn key_notes(&self) -> [u8; 7] {
        let root = self.key_signature();
        MAJOR_SCALE.map(|offset| root + offset)
    }

    /// Summed histogram weight of the triad built on each scale degree
    pub fn chord_likelihood_table(&self) -> [f32; 7] {
        let notes = self.key_notes();
        std::array::from_fn(|i| {
            let triad = [i, i + 2, i + 4].map(|degree| notes[degree % 7] % 12);
            self.ordered_sum(|pc| triad.contains(&pc))
        })
    }

    /// Scale degree of the strongest triad, or `None` before anything was played
    pub fn most_likely_chord(&self) -> Option<usize> {
        argmax(&self.chord_likelihood_table())
    }
}

/// Index of the largest positive value; earliest index wins ties
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, value) in values.iter().enumerate() {
        if *value > best.map_or(0.0, |b| values[b]) {
            best = Some(i);
        }
    }
    best
}
