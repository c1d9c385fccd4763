use std::fmt;
use std::time::Duration;

use rand::Rng;

use super::clock::{is_beat, is_downbeat};
use crate::core::harmony::HarmonyTracker;
use crate::core::oscillator::Note;
use crate::core::synth::preset::InstrumentPreset;
use crate::error::Result;

/// Who played a note. The keyboard is the player; the rest are automatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Keyboard,
    Drums,
    Chords,
    Bass,
}

impl Part {
    pub const ALL: [Part; 4] = [Part::Keyboard, Part::Drums, Part::Chords, Part::Bass];

    pub fn name(&self) -> &'static str {
        match self {
            Part::Keyboard => "keyboard",
            Part::Drums => "drums",
            Part::Chords => "chords",
            Part::Bass => "bass",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an automatic instrument wants done on a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteEvent {
    /// Start a note, optionally letting it go again after a delay
    Press { note: Note, release_after: Option<Duration> },
    ReleaseAll,
}

impl NoteEvent {
    fn hit(pitch: i32, velocity: i32, release_after: Duration) -> Result<Self> {
        Ok(NoteEvent::Press {
            note: Note::new(pitch, velocity)?,
            release_after: Some(release_after),
        })
    }
}

/// State shared by every instrument during one tick. Instruments run in
/// registration order, so a chord chosen here is visible to the bass on
/// the same tick.
#[derive(Debug)]
pub struct TickContext<'a> {
    pub tick: u64,
    pub harmony: &'a HarmonyTracker,
    pub current_chord: usize,
}

pub const SNARE: i32 = 12;
pub const HAT: i32 = 13;
/// Chord voicings start at middle C
pub const CHORD_BASE: i32 = 60;
/// Two octaves under the chords
pub const BASS_BASE: i32 = CHORD_BASE - 24;

const SNARE_LENGTH: Duration = Duration::from_millis(20);
const HAT_LENGTH: Duration = Duration::from_millis(50);
const BASS_LENGTH: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoInstrument {
    Drums,
    Chords,
    Bass,
}

impl AutoInstrument {
    pub fn part(&self) -> Part {
        match self {
            AutoInstrument::Drums => Part::Drums,
            AutoInstrument::Chords => Part::Chords,
            AutoInstrument::Bass => Part::Bass,
        }
    }

    pub fn default_preset(&self) -> InstrumentPreset {
        match self {
            AutoInstrument::Drums => InstrumentPreset::drums(),
            AutoInstrument::Chords => InstrumentPreset::chords(),
            AutoInstrument::Bass => InstrumentPreset::bass(),
        }
    }

    /// Called once per sixteenth note
    pub fn on_tick<R: Rng>(&self, ctx: &mut TickContext<'_>, rng: &mut R) -> Result<Vec<NoteEvent>> {
        match self {
            AutoInstrument::Drums => drums(ctx.tick, rng),
            AutoInstrument::Chords => chords(ctx),
            AutoInstrument::Bass => bass(ctx, rng),
        }
    }
}

fn drums<R: Rng>(tick: u64, rng: &mut R) -> Result<Vec<NoteEvent>> {
    if is_beat(tick) {
        return Ok(vec![NoteEvent::hit(SNARE, 40, SNARE_LENGTH)?]);
    }
    // eighth notes always, the other sixteenths half the time
    if tick % 2 == 0 || rng.random_bool(0.5) {
        return Ok(vec![NoteEvent::hit(HAT, 20, HAT_LENGTH)?]);
    }
    Ok(Vec::new())
}

fn chords(ctx: &mut TickContext<'_>) -> Result<Vec<NoteEvent>> {
    if !is_beat(ctx.tick) {
        return Ok(Vec::new());
    }
    // nothing has been played yet
    let Some(chord) = ctx.harmony.most_likely_chord() else {
        return Ok(Vec::new());
    };
    ctx.current_chord = chord;

    let key_notes = ctx.harmony.key_notes();
    let voicing = [(chord, 80), ((chord + 2) % 7, 60), ((chord + 4) % 7, 55)];
    let mut events = vec![NoteEvent::ReleaseAll];
    for (degree, velocity) in voicing {
        events.push(NoteEvent::Press {
            note: Note::new(CHORD_BASE + key_notes[degree] as i32, velocity)?,
            release_after: None,
        });
    }
    Ok(events)
}

fn bass<R: Rng>(ctx: &TickContext<'_>, rng: &mut R) -> Result<Vec<NoteEvent>> {
    if !is_beat(ctx.tick) || ctx.harmony.most_likely_chord().is_none() {
        return Ok(Vec::new());
    }
    let root = ctx.current_chord;
    let degree = if is_downbeat(ctx.tick) {
        root
    } else if rng.random_bool(0.5) {
        // root, third or fifth of the current chord
        (root + [0, 2, 4][rng.random_range(0..3)]) % 7
    } else {
        return Ok(Vec::new());
    };
    let pitch = BASS_BASE + ctx.harmony.key_notes()[degree] as i32;
    Ok(vec![NoteEvent::hit(pitch, 127, BASS_LENGTH)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn c_major() -> HarmonyTracker {
        let mut harmony = HarmonyTracker::new();
        for _ in 0..10 {
            for pitch in [60, 64, 67] {
                harmony.add_note(pitch);
            }
        }
        harmony
    }

    fn pressed(events: &[NoteEvent]) -> Vec<(u8, u8, Option<Duration>)> {
        events
            .iter()
            .filter_map(|e| match e {
                NoteEvent::Press { note, release_after } => Some((note.pitch(), note.velocity(), *release_after)),
                NoteEvent::ReleaseAll => None,
            })
            .collect()
    }

    #[test]
    fn drums_hit_snare_on_beats_and_hats_on_eighths() {
        let harmony = HarmonyTracker::new();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut ctx = TickContext { tick: 0, harmony: &harmony, current_chord: 0 };

        let events = AutoInstrument::Drums.on_tick(&mut ctx, &mut rng).unwrap();
        assert_eq!(pressed(&events), vec![(12, 40, Some(Duration::from_millis(20)))]);

        ctx.tick = 2;
        let events = AutoInstrument::Drums.on_tick(&mut ctx, &mut rng).unwrap();
        assert_eq!(pressed(&events), vec![(13, 20, Some(Duration::from_millis(50)))]);
    }

    #[test]
    fn drums_sometimes_fill_odd_sixteenths() {
        let harmony = HarmonyTracker::new();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut hits = 0;
        for i in 0..200 {
            let mut ctx = TickContext { tick: i * 2 + 1, harmony: &harmony, current_chord: 0 };
            let events = AutoInstrument::Drums.on_tick(&mut ctx, &mut rng).unwrap();
            if let Some((pitch, _, _)) = pressed(&events).first() {
                assert_eq!(*pitch, 13);
                hits += 1;
            }
        }
        assert!(hits > 50 && hits < 150, "{hits} fills out of 200");
    }

    #[test]
    fn chords_wait_for_the_player() {
        let harmony = HarmonyTracker::new();
        let mut ctx = TickContext { tick: 0, harmony: &harmony, current_chord: 3 };
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(AutoInstrument::Chords.on_tick(&mut ctx, &mut rng).unwrap().is_empty());
        assert!(AutoInstrument::Bass.on_tick(&mut ctx, &mut rng).unwrap().is_empty());
        assert_eq!(ctx.current_chord, 3);
    }

    #[test]
    fn chords_voice_the_likeliest_triad() {
        let harmony = c_major();
        let mut rng = SmallRng::seed_from_u64(0);
        let mut ctx = TickContext { tick: 4, harmony: &harmony, current_chord: 5 };
        let events = AutoInstrument::Chords.on_tick(&mut ctx, &mut rng).unwrap();
        assert_eq!(events[0], NoteEvent::ReleaseAll);
        assert_eq!(pressed(&events), vec![(60, 80, None), (64, 60, None), (67, 55, None)]);
        assert_eq!(ctx.current_chord, 0);

        ctx.tick = 5;
        assert!(AutoInstrument::Chords.on_tick(&mut ctx, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn bass_plays_the_root_on_downbeats() {
        let harmony = c_major();
        let mut rng = SmallRng::seed_from_u64(0);
        let mut ctx = TickContext { tick: 16, harmony: &harmony, current_chord: 0 };
        let events = AutoInstrument::Bass.on_tick(&mut ctx, &mut rng).unwrap();
        assert_eq!(pressed(&events), vec![(36, 127, Some(Duration::from_millis(500)))]);

        ctx.tick = 17;
        assert!(AutoInstrument::Bass.on_tick(&mut ctx, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn bass_offbeats_stay_in_the_chord() {
        let harmony = c_major();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut played = std::collections::BTreeSet::new();
        let mut silent = 0;
        for _ in 0..200 {
            let mut ctx = TickContext { tick: 4, harmony: &harmony, current_chord: 0 };
            match pressed(&AutoInstrument::Bass.on_tick(&mut ctx, &mut rng).unwrap()).first() {
                Some((pitch, _, _)) => {
                    played.insert(*pitch);
                },
                None => silent += 1,
            }
        }
        assert_eq!(played.into_iter().collect::<Vec<_>>(), vec![36, 40, 43]);
        assert!(silent > 50 && silent < 150);
    }
}
