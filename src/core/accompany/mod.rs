//! Automatic drums, chords and bass that follow the player's key.
//!
//! The [`Accompanist`] is polled from the non-real-time side. Each poll first
//! fires any deferred releases that have come due, then, if the clock has
//! ticked, asks every registered instrument for its notes in registration
//! order and forwards them to the instrument's bus handle.

mod clock;
mod instruments;
mod scheduler;

pub use clock::{is_beat, is_downbeat, AccompanimentClock, DEFAULT_BPM, TICKS_PER_BEAT, TICKS_PER_MEASURE};
pub use instruments::{AutoInstrument, NoteEvent, Part, TickContext};
pub use scheduler::{ReleaseScheduler, ScheduledRelease};

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::core::harmony::HarmonyTracker;
use crate::core::synth::InstrumentHandle;
use crate::core::visualization::NoteLog;
use crate::error::Result;

#[derive(Debug)]
struct Performer {
    instrument: AutoInstrument,
    handle: InstrumentHandle,
}

#[derive(Debug)]
pub struct Accompanist {
    clock: AccompanimentClock,
    performers: Vec<Performer>,
    scheduler: ReleaseScheduler,
    current_chord: usize,
    rng: SmallRng,
}

impl Accompanist {
    pub fn new(bpm: u32, now: Instant) -> Result<Self> {
        Self::with_seed(bpm, now, rand::random())
    }

    /// Same as [`new`](Self::new) with reproducible dice rolls
    pub fn with_seed(bpm: u32, now: Instant, seed: u64) -> Result<Self> {
        Ok(Self {
            clock: AccompanimentClock::new(bpm, now)?,
            performers: Vec::new(),
            scheduler: ReleaseScheduler::new(),
            current_chord: 0,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    pub fn register(&mut self, instrument: AutoInstrument, handle: InstrumentHandle) {
        log::debug!("accompanist: {} on '{}'", instrument.part(), handle.name());
        self.performers.push(Performer { instrument, handle });
    }

    pub fn instruments(&self) -> impl Iterator<Item = (AutoInstrument, &InstrumentHandle)> + '_ {
        self.performers.iter().map(|p| (p.instrument, &p.handle))
    }

    pub fn clock(&self) -> &AccompanimentClock {
        &self.clock
    }

    pub fn set_bpm(&mut self, bpm: u32) -> Result<()> {
        self.clock.set_bpm(bpm)
    }

    pub fn change_bpm(&mut self, delta: i32) -> Result<u32> {
        self.clock.change_bpm(delta)
    }

    /// Scale degree of the chord the accompaniment is currently playing
    pub fn current_chord(&self) -> usize {
        self.current_chord
    }

    pub fn pending_releases(&self) -> usize {
        self.scheduler.len()
    }

    /// Advance to `now`. Returns the tick that fired, if any.
    ///
    /// A handle that refuses an event does not stop the rest of the update:
    /// every due release and every instrument still gets its turn, a refused
    /// release is kept for the next poll, and the first error is returned at
    /// the end.
    pub fn update(&mut self, now: Instant, harmony: &HarmonyTracker, bars: &mut NoteLog) -> Result<Option<u64>> {
        let mut first_error = None;

        for due in self.scheduler.take_due(now) {
            let sent = match self.performers.iter().find(|p| p.instrument.part() == due.part) {
                Some(performer) => performer.handle.release(due.pitch),
                None => Ok(()),
            };
            match sent {
                Ok(()) => bars.release(due.pitch, due.part, now),
                Err(err) => {
                    log::warn!("{} release of {} postponed: {err}", due.part, due.pitch);
                    self.scheduler.schedule(due.due, due.part, due.pitch);
                    first_error.get_or_insert(err);
                },
            }
        }

        let fired = self.clock.poll(now);
        if let Some(tick) = fired {
            let mut ctx = TickContext {
                tick,
                harmony,
                current_chord: self.current_chord,
            };
            for performer in &self.performers {
                let part = performer.instrument.part();
                let events = match performer.instrument.on_tick(&mut ctx, &mut self.rng) {
                    Ok(events) => events,
                    Err(err) => {
                        log::warn!("{part} skipped tick {tick}: {err}");
                        first_error.get_or_insert(err);
                        continue;
                    },
                };
                for event in events {
                    let sent = match event {
                        NoteEvent::Press { note, release_after } => performer.handle.play(note).map(|()| {
                            bars.press(&note, part, now);
                            if let Some(delay) = release_after {
                                self.scheduler.schedule(now + delay, part, note.pitch());
                            }
                        }),
                        NoteEvent::ReleaseAll => performer.handle.release_all().map(|()| bars.release_all(part, now)),
                    };
                    if let Err(err) = sent {
                        first_error.get_or_insert(err);
                    }
                }
            }
            self.current_chord = ctx.current_chord;
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(fired),
        }
    }
}
