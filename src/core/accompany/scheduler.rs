use std::time::Instant;

use super::Part;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledRelease {
    pub due: Instant,
    pub part: Part,
    pub pitch: u8,
}

/// Deferred note-offs, fired by polling instead of by timer threads
#[derive(Debug, Clone, Default)]
pub struct ReleaseScheduler {
    pending: Vec<ScheduledRelease>,
}

impl ReleaseScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, part: Part, pitch: u8) {
        self.pending.push(ScheduledRelease { due, part, pitch });
    }

    /// Remove and return every release due at or before `now`, earliest first.
    /// Releases due at the same instant keep their scheduling order.
    pub fn take_due(&mut self, now: Instant) -> Vec<ScheduledRelease> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|r| r.due <= now);
        self.pending = pending;
        due.sort_by_key(|r| r.due);
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fires_once_when_due() {
        let start = Instant::now();
        let mut scheduler = ReleaseScheduler::new();
        scheduler.schedule(start + Duration::from_millis(50), Part::Drums, 13);
        scheduler.schedule(start + Duration::from_millis(20), Part::Drums, 12);
        scheduler.schedule(start + Duration::from_millis(500), Part::Bass, 36);

        assert!(scheduler.take_due(start + Duration::from_millis(10)).is_empty());

        let fired: Vec<u8> = scheduler
            .take_due(start + Duration::from_millis(60))
            .iter()
            .map(|r| r.pitch)
            .collect();
        assert_eq!(fired, vec![12, 13]);
        assert_eq!(scheduler.len(), 1);

        assert!(scheduler.take_due(start + Duration::from_millis(60)).is_empty());
        let last = scheduler.take_due(start + Duration::from_secs(1));
        assert_eq!(last[0].part, Part::Bass);
        assert!(scheduler.is_empty());
    }
}
