//! Renderer-facing record of who played what, and when.

use std::time::{Duration, Instant};

use crate::core::accompany::Part;
use crate::core::oscillator::Note;

/// How long a finished bar stays visible
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteBar {
    pub pitch: u8,
    pub velocity: u8,
    pub part: Part,
    pub pressed_at: Instant,
    pub released_at: Option<Instant>,
}

impl NoteBar {
    pub fn is_open(&self) -> bool {
        self.released_at.is_none()
    }

    /// How long the bar has been (or was) sounding at `now`
    pub fn length(&self, now: Instant) -> Duration {
        self.released_at.unwrap_or(now).saturating_duration_since(self.pressed_at)
    }
}

#[derive(Debug, Clone)]
pub struct NoteLog {
    bars: Vec<NoteBar>,
    retention: Duration,
}

impl Default for NoteLog {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl NoteLog {
    pub fn new(retention: Duration) -> Self {
        Self {
            bars: Vec::new(),
            retention,
        }
    }

    pub fn press(&mut self, note: &Note, part: Part, now: Instant) {
        self.bars.push(NoteBar {
            pitch: note.pitch(),
            velocity: note.velocity(),
            part,
            pressed_at: now,
            released_at: None,
        });
    }

    /// Close the oldest open bar for this pitch and part. Unmatched releases
    /// are ignored.
    pub fn release(&mut self, pitch: u8, part: Part, now: Instant) {
        if let Some(bar) = self
            .bars
            .iter_mut()
            .find(|b| b.pitch == pitch && b.part == part && b.is_open())
        {
            bar.released_at = Some(now);
        }
    }

    pub fn release_all(&mut self, part: Part, now: Instant) {
        for bar in self.bars.iter_mut().filter(|b| b.part == part && b.is_open()) {
            bar.released_at = Some(now);
        }
    }

    /// Drop closed bars released more than the retention window ago
    pub fn prune(&mut self, now: Instant) {
        let retention = self.retention;
        self.bars.retain(|b| match b.released_at {
            Some(released) => now.saturating_duration_since(released) <= retention,
            None => true,
        });
    }

    pub fn bars(&self) -> &[NoteBar] {
        &self.bars
    }

    pub fn open_bars(&self, part: Part) -> impl Iterator<Item = &NoteBar> + '_ {
        self.bars.iter().filter(move |b| b.part == part && b.is_open())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: i32) -> Note {
        Note::new(pitch, 100).unwrap()
    }

    #[test]
    fn release_closes_oldest_matching_bar() {
        let start = Instant::now();
        let later = start + Duration::from_millis(100);
        let mut log = NoteLog::default();
        log.press(&note(60), Part::Keyboard, start);
        log.press(&note(60), Part::Chords, start);
        log.press(&note(60), Part::Keyboard, later);

        log.release(60, Part::Keyboard, later);
        let open: Vec<Instant> = log.open_bars(Part::Keyboard).map(|b| b.pressed_at).collect();
        assert_eq!(open, vec![later]);
        assert_eq!(log.open_bars(Part::Chords).count(), 1);
        assert_eq!(log.bars()[0].length(start + Duration::from_secs(5)), Duration::from_millis(100));

        // stray
        log.release(61, Part::Keyboard, later);
        assert_eq!(log.open_bars(Part::Keyboard).count(), 1);
    }

    #[test]
    fn release_all_is_per_part() {
        let now = Instant::now();
        let mut log = NoteLog::default();
        for pitch in [60, 64, 67] {
            log.press(&note(pitch), Part::Chords, now);
        }
        log.press(&note(36), Part::Bass, now);
        log.release_all(Part::Chords, now);
        assert_eq!(log.open_bars(Part::Chords).count(), 0);
        assert_eq!(log.open_bars(Part::Bass).count(), 1);
    }

    #[test]
    fn prune_keeps_open_and_recent_bars() {
        let start = Instant::now();
        let mut log = NoteLog::new(Duration::from_secs(1));
        log.press(&note(60), Part::Keyboard, start);
        log.press(&note(62), Part::Keyboard, start);
        log.release(60, Part::Keyboard, start);

        log.prune(start + Duration::from_millis(500));
        assert_eq!(log.bars().len(), 2);
        log.prune(start + Duration::from_secs(2));
        assert_eq!(log.bars().len(), 1);
        assert_eq!(log.bars()[0].pitch, 62);
    }
}
