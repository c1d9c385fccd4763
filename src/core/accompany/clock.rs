use std::time::{Duration, Instant};

use crate::error::{Error, Result};

pub const DEFAULT_BPM: u32 = 120;
/// Clock resolution: sixteenth notes
pub const TICKS_PER_BEAT: u64 = 4;
pub const TICKS_PER_MEASURE: u64 = 16;

/// Polled sixteenth-note clock. The tick count only ever grows; tempo
/// changes affect the interval to the next tick and nothing else.
#[derive(Debug, Clone)]
pub struct AccompanimentClock {
    bpm: u32,
    ticks: u64,
    last_tick: Instant,
}

impl AccompanimentClock {
    pub fn new(bpm: u32, now: Instant) -> Result<Self> {
        validate(bpm as i64)?;
        Ok(Self {
            bpm,
            ticks: 0,
            last_tick: now,
        })
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: u32) -> Result<()> {
        validate(bpm as i64)?;
        if bpm != self.bpm {
            log::info!("tempo {} -> {} bpm", self.bpm, bpm);
        }
        self.bpm = bpm;
        Ok(())
    }

    /// Nudge the tempo. The tempo is left alone if the result would fall below 1.
    pub fn change_bpm(&mut self, delta: i32) -> Result<u32> {
        let bpm = self.bpm as i64 + delta as i64;
        validate(bpm)?;
        self.set_bpm(bpm.min(u32::MAX as i64) as u32)?;
        Ok(self.bpm)
    }

    /// Time between two ticks: `60 / bpm / 4` seconds
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.bpm as f64 / TICKS_PER_BEAT as f64)
    }

    /// Check the clock against `now`. When a tick interval has passed, returns
    /// the tick that is due (counting from 0) and advances the count by one.
    /// At most one tick fires per poll, however late the poll is.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        if now.saturating_duration_since(self.last_tick) < self.interval() {
            return None;
        }
        self.last_tick = now;
        let due = self.ticks;
        self.ticks += 1;
        Some(due)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn beat_count(&self) -> u64 {
        self.ticks / TICKS_PER_BEAT
    }

    pub fn measure(&self) -> u64 {
        self.ticks / TICKS_PER_MEASURE
    }

    pub fn beat_in_measure(&self) -> u64 {
        self.ticks % TICKS_PER_MEASURE / TICKS_PER_BEAT
    }

    pub fn tick_in_measure(&self) -> u64 {
        self.ticks % TICKS_PER_MEASURE
    }
}

fn validate(bpm: i64) -> Result<()> {
    if bpm < 1 {
        return Err(Error::InvalidTempo(bpm));
    }
    Ok(())
}

pub fn is_beat(tick: u64) -> bool {
    tick % TICKS_PER_BEAT == 0
}

pub fn is_downbeat(tick: u64) -> bool {
    tick % TICKS_PER_MEASURE == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn one_interval_is_one_tick() {
        let start = Instant::now();
        let mut clock = AccompanimentClock::new(120, start).unwrap();
        assert!(approx_eq!(f64, clock.interval().as_secs_f64(), 0.125));

        assert_eq!(clock.poll(start + Duration::from_millis(124)), None);
        assert_eq!(clock.ticks(), 0);
        assert_eq!(clock.poll(start + Duration::from_millis(125)), Some(0));
        assert_eq!(clock.ticks(), 1);
    }

    #[test]
    fn late_poll_fires_once_and_rebases() {
        let start = Instant::now();
        let mut clock = AccompanimentClock::new(120, start).unwrap();
        let late = start + Duration::from_secs(2);
        assert_eq!(clock.poll(late), Some(0));
        assert_eq!(clock.poll(late), None);
        assert_eq!(clock.poll(late + Duration::from_millis(125)), Some(1));
    }

    #[test]
    fn musical_position() {
        let start = Instant::now();
        let mut clock = AccompanimentClock::new(120, start).unwrap();
        let step = clock.interval();
        let mut now = start;
        for _ in 0..21 {
            now += step;
            clock.poll(now);
        }
        assert_eq!(clock.ticks(), 21);
        assert_eq!(clock.beat_count(), 5);
        assert_eq!(clock.measure(), 1);
        assert_eq!(clock.beat_in_measure(), 1);
        assert_eq!(clock.tick_in_measure(), 5);

        assert!(is_downbeat(0) && is_downbeat(16) && !is_downbeat(4));
        assert!(is_beat(4) && is_beat(16) && !is_beat(6));
    }

    #[test]
    fn tempo_changes_only_move_the_interval() {
        let start = Instant::now();
        let mut clock = AccompanimentClock::new(120, start).unwrap();
        clock.poll(start + Duration::from_millis(125));
        assert_eq!(clock.change_bpm(-60).unwrap(), 60);
        assert_eq!(clock.interval(), Duration::from_millis(250));
        assert_eq!(clock.ticks(), 1);

        assert!(matches!(clock.change_bpm(-60), Err(Error::InvalidTempo(0))));
        assert!(matches!(clock.set_bpm(0), Err(Error::InvalidTempo(0))));
        assert_eq!(clock.bpm(), 60);
        assert!(AccompanimentClock::new(0, start).is_err());
    }
}
