use std::time::{Duration, Instant};

use crate::core::accompany::{Accompanist, AutoInstrument, Part};
use crate::core::harmony::{HarmonyTracker, DEGREE_NAMES};
use crate::core::midi::MidiEvent;
use crate::core::oscillator::Note;
use crate::core::synth::mixer::{Mixer, BUFFER_SIZE, SAMPLE_RATE};
use crate::core::synth::{InstrumentBus, InstrumentHandle, QUEUE_CAPACITY};
use crate::core::visualization::{NoteBar, NoteLog};
use crate::error::Result;
use crate::messaging::{NoteQueue, QueueReceiver, RawMidiMessage};
use crate::settings::Settings;

const ACCOMPANIMENT: [AutoInstrument; 3] = [AutoInstrument::Drums, AutoInstrument::Chords, AutoInstrument::Bass];

/// The running program minus its window and its audio device: player input,
/// harmony tracking and the accompaniment, with a handle on every instrument.
/// The matching [`Mixer`] is handed back at construction and belongs to
/// whoever renders audio.
pub struct Session {
    settings: Settings,
    harmony: HarmonyTracker,
    accompanist: Accompanist,
    keyboard: InstrumentHandle,
    bars: NoteLog,
    midi_queue: NoteQueue<RawMidiMessage>,
    midi: QueueReceiver<RawMidiMessage>,
}

/// Read-only view handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub held_keys: Vec<u8>,
    pub note_bars: Vec<NoteBar>,
    pub key_signature: String,
    pub bpm: u32,
    pub current_chord: Option<usize>,
    pub ticks: u64,
    pub voices: Vec<(Part, usize)>,
    /// Presses every instrument turned away at its voice limit
    pub dropped_presses: usize,
}

impl Snapshot {
    pub fn chord_name(&self) -> Option<&'static str> {
        self.current_chord.map(|degree| DEGREE_NAMES[degree])
    }

    pub fn total_voices(&self) -> usize {
        self.voices.iter().map(|(_, count)| count).sum()
    }
}

impl Session {
    pub fn new(settings: Settings, sample_rate: f32, now: Instant) -> Result<(Self, Mixer)> {
        let accompanist = Accompanist::new(settings.bpm, now)?;
        Ok(Self::build(settings, sample_rate, accompanist))
    }

    /// Same as [`new`](Self::new) with a reproducible accompaniment
    pub fn with_seed(settings: Settings, sample_rate: f32, now: Instant, seed: u64) -> Result<(Self, Mixer)> {
        let accompanist = Accompanist::with_seed(settings.bpm, now, seed)?;
        Ok(Self::build(settings, sample_rate, accompanist))
    }

    fn build(settings: Settings, sample_rate: f32, mut accompanist: Accompanist) -> (Self, Mixer) {
        let mut mixer = Mixer::new(&settings.master);

        let (bus, keyboard) = InstrumentBus::new(Part::Keyboard.name(), settings.preset(Part::Keyboard), sample_rate);
        mixer.add_bus(bus);
        for instrument in ACCOMPANIMENT {
            let part = instrument.part();
            let (bus, handle) = InstrumentBus::new(part.name(), settings.preset(part), sample_rate);
            mixer.add_bus(bus);
            accompanist.register(instrument, handle);
        }

        let (midi_queue, midi) = NoteQueue::new("midi", QUEUE_CAPACITY);
        let session = Self {
            settings,
            harmony: HarmonyTracker::new(),
            accompanist,
            keyboard,
            bars: NoteLog::default(),
            midi_queue,
            midi,
        };
        (session, mixer)
    }

    /// Sending end for a MIDI input adapter
    pub fn midi_queue(&self) -> NoteQueue<RawMidiMessage> {
        self.midi_queue.clone()
    }

    pub fn press(&mut self, pitch: i32, velocity: i32, now: Instant) -> Result<()> {
        let note = Note::new(pitch, velocity)?;
        self.keyboard.play(note)?;
        self.harmony.add_note(note.pitch());
        self.bars.press(&note, Part::Keyboard, now);
        Ok(())
    }

    pub fn release(&mut self, pitch: i32, now: Instant) -> Result<()> {
        let pitch = Note::new(pitch, 0)?.pitch();
        self.keyboard.release(pitch)?;
        self.harmony.remove_note(pitch);
        self.bars.release(pitch, Part::Keyboard, now);
        Ok(())
    }

    pub fn handle_midi(&mut self, (status, data1, data2): RawMidiMessage, now: Instant) -> Result<()> {
        match MidiEvent::decode(status, data1, data2) {
            Some(MidiEvent::NoteOn { pitch, velocity }) => self.press(pitch as i32, velocity as i32, now),
            Some(MidiEvent::NoteOff { pitch }) => self.release(pitch as i32, now),
            None => Ok(()),
        }
    }

    /// Handle everything the MIDI adapter queued since the last call
    pub fn process_midi(&mut self, now: Instant) -> Result<usize> {
        let mut handled = 0;
        while let Some(message) = self.midi.try_pop() {
            self.handle_midi(message, now)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Once per frame: pending MIDI, then the accompaniment, then old note bars.
    /// Returns the accompaniment tick that fired, if any. A MIDI failure does
    /// not hold up the accompaniment; the first error is returned afterwards.
    pub fn update(&mut self, now: Instant) -> Result<Option<u64>> {
        let midi = self.process_midi(now);
        let tick = self.accompanist.update(now, &self.harmony, &mut self.bars);
        self.bars.prune(now);
        midi?;
        tick
    }

    pub fn set_bpm(&mut self, bpm: u32) -> Result<()> {
        self.accompanist.set_bpm(bpm)?;
        self.settings.bpm = bpm;
        Ok(())
    }

    pub fn change_bpm(&mut self, delta: i32) -> Result<u32> {
        let bpm = self.accompanist.change_bpm(delta)?;
        self.settings.bpm = bpm;
        Ok(bpm)
    }

    pub fn bpm(&self) -> u32 {
        self.accompanist.clock().bpm()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn harmony(&self) -> &HarmonyTracker {
        &self.harmony
    }

    pub fn accompanist(&self) -> &Accompanist {
        &self.accompanist
    }

    pub fn note_log(&self) -> &NoteLog {
        &self.bars
    }

    pub fn key_signature_text(&self) -> String {
        if self.harmony.is_empty() {
            "Press any key to start composing".to_string()
        } else {
            format!("We think you're playing in {}", self.harmony.key_signature_name(self.settings.sharps))
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut voices = vec![(Part::Keyboard, self.keyboard.active_voices())];
        let mut dropped_presses = self.keyboard.dropped_presses();
        for (instrument, handle) in self.accompanist.instruments() {
            voices.push((instrument.part(), handle.active_voices()));
            dropped_presses += handle.dropped_presses();
        }
        Snapshot {
            held_keys: self.harmony.held_notes().to_vec(),
            note_bars: self.bars.bars().to_vec(),
            key_signature: self.key_signature_text(),
            bpm: self.bpm(),
            current_chord: (!self.harmony.is_empty()).then(|| self.accompanist.current_chord()),
            ticks: self.accompanist.clock().ticks(),
            voices,
            dropped_presses,
        }
    }
}

/// One keyboard note of an offline performance, timed from the start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedNote {
    pub at: Duration,
    pub pitch: i32,
    pub velocity: i32,
    pub length: Duration,
}

/// Play `script` through the session for `seconds` of synthetic time and
/// return the rendered mix. The session is updated once per buffer, so event
/// timing is quantized to [`BUFFER_SIZE`] samples.
pub fn render_offline(
    session: &mut Session,
    mixer: &mut Mixer,
    script: &[ScriptedNote],
    seconds: f32,
    start: Instant,
) -> Result<Vec<i16>> {
    let total = (seconds.max(0.0) * SAMPLE_RATE as f32).round() as usize;

    let mut events: Vec<(Duration, Option<(i32, i32)>, i32)> = Vec::with_capacity(script.len() * 2);
    for note in script {
        events.push((note.at, Some((note.pitch, note.velocity)), note.pitch));
        events.push((note.at + note.length, None, note.pitch));
    }
    // stable: a press and release at the same instant keep script order
    events.sort_by_key(|(at, _, _)| *at);
    let mut events = events.into_iter().peekable();

    let mut out = vec![0i16; total];
    for (index, chunk) in out.chunks_mut(BUFFER_SIZE).enumerate() {
        let offset = Duration::from_secs_f64((index * BUFFER_SIZE) as f64 / SAMPLE_RATE as f64);
        let now = start + offset;
        while let Some((_, press, pitch)) = events.next_if(|(at, _, _)| *at <= offset) {
            match press {
                Some((pitch, velocity)) => session.press(pitch, velocity, now)?,
                None => session.release(pitch, now)?,
            }
        }
        session.update(now)?;
        mixer.pull_mix_i16(chunk);
    }
    log::debug!("rendered {} samples offline", out.len());
    Ok(out)
}
