use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use piano_helper::app::{render_offline, ScriptedNote};
use piano_helper::audio::AudioEngine;
use piano_helper::core::midi::MidiInputHandler;
use piano_helper::core::synth::mixer::SAMPLE_RATE;
use piano_helper::core::synth::samples::write_wav;
use piano_helper::{Session, Settings};

/// How often the live loop polls input and the accompaniment clock
const FRAME: Duration = Duration::from_millis(5);

#[derive(Parser, Debug)]
#[command(version, about = "Play along with an automatic drummer, pianist and bassist")]
struct Args {
    /// Tempo of the accompaniment
    #[arg(long)]
    bpm: Option<u32>,

    /// MIDI input port to connect to (default: the first one found)
    #[arg(long)]
    midi_port: Option<String>,

    /// Don't open a MIDI input
    #[arg(long)]
    no_midi: bool,

    /// Render a demo performance to this WAV file instead of playing live
    #[arg(long, value_name = "WAV")]
    bounce: Option<PathBuf>,

    /// Length of the bounce
    #[arg(long, default_value_t = 8.0)]
    seconds: f32,

    /// Settings file to use instead of the one in the config directory
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let path = match &args.settings {
        Some(path) => path.clone(),
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load_or_default(&path);
    if let Some(bpm) = args.bpm {
        settings.bpm = bpm;
    }
    if args.midi_port.is_some() {
        settings.midi_port = args.midi_port.clone();
    }

    match &args.bounce {
        Some(out) => bounce(settings, out, args.seconds),
        None => run_live(settings, args.no_midi),
    }
}

/// I, IV, V, I arpeggios, four notes a beat at 120 bpm
fn demo_phrase() -> Vec<ScriptedNote> {
    let chords: [[i32; 4]; 4] = [[60, 64, 67, 72], [65, 69, 72, 77], [67, 71, 74, 79], [60, 64, 67, 72]];
    chords
        .iter()
        .flatten()
        .enumerate()
        .map(|(i, pitch)| ScriptedNote {
            at: Duration::from_millis(250 * i as u64),
            pitch: *pitch,
            velocity: 90,
            length: Duration::from_millis(200),
        })
        .collect()
}

fn bounce(settings: Settings, out: &Path, seconds: f32) -> Result<()> {
    let start = Instant::now();
    let (mut session, mut mixer) =
        Session::new(settings, SAMPLE_RATE as f32, start).context("failed to set up session")?;
    log::info!("bouncing {seconds} s to {}", out.display());
    let samples = render_offline(&mut session, &mut mixer, &demo_phrase(), seconds, start)?;
    write_wav(out, &samples, SAMPLE_RATE).with_context(|| format!("failed to write {}", out.display()))?;
    log::info!("{}", session.key_signature_text());
    Ok(())
}

fn run_live(settings: Settings, no_midi: bool) -> Result<()> {
    let midi_port = settings.midi_port.clone();
    let (mut session, mixer) =
        Session::new(settings, SAMPLE_RATE as f32, Instant::now()).context("failed to set up session")?;
    let engine = AudioEngine::start(mixer).context("failed to start audio output")?;

    let mut midi = MidiInputHandler::new(session.midi_queue());
    if no_midi {
        log::info!("MIDI input disabled");
    } else if let Err(err) = midi.connect(midi_port.as_deref()) {
        log::warn!("{err}; continuing without MIDI input");
    }

    let mut status = String::new();
    let mut dropped = 0;
    loop {
        engine.check()?;
        if let Err(err) = session.update(Instant::now()) {
            log::warn!("{err}");
        }

        let snapshot = session.snapshot();
        if snapshot.dropped_presses > dropped {
            log::warn!("{} notes dropped at the voice limit", snapshot.dropped_presses - dropped);
            dropped = snapshot.dropped_presses;
        }
        let line = format!(
            "{} | {} BPM | chord {}",
            snapshot.key_signature,
            snapshot.bpm,
            snapshot.chord_name().unwrap_or("-"),
        );
        if line != status {
            log::info!("{line}");
            status = line;
        }
        std::thread::sleep(FRAME);
    }
}
