pub mod effects;
pub mod mixer;
pub mod preset;
pub mod samples;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use preset::InstrumentPreset;
use crate::core::oscillator::Note;
use crate::core::voice::Voice;
use crate::error::Result;
use crate::messaging::{NoteQueue, PressRequest, QueueReceiver, ReleaseRequest};

/// Most voices one instrument keeps alive at once
pub const MAX_VOICES: usize = 64;
/// Pending presses (and, separately, releases) an instrument accepts between pulls
pub const QUEUE_CAPACITY: usize = 256;

/// Real-time half of an instrument: owns the voices and renders them.
/// Only the audio thread touches it; everything else talks to it through an
/// [`InstrumentHandle`].
#[derive(Debug)]
pub struct InstrumentBus {
    name: String,
    preset: InstrumentPreset,
    sample_rate: f32,
    voices: Vec<Voice>,
    presses: QueueReceiver<PressRequest>,
    releases: QueueReceiver<ReleaseRequest>,
    voice_count: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

/// Thread-safe, cloneable front of an [`InstrumentBus`]
#[derive(Debug, Clone)]
pub struct InstrumentHandle {
    name: String,
    presses: NoteQueue<PressRequest>,
    releases: NoteQueue<ReleaseRequest>,
    voice_count: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
    next_serial: Arc<AtomicU64>,
}

impl InstrumentBus {
    /// Create an instrument, returning the real-time bus and its handle
    pub fn new(name: impl Into<String>, preset: InstrumentPreset, sample_rate: f32) -> (Self, InstrumentHandle) {
        let name = name.into();
        let (press_queue, presses) = NoteQueue::new(format!("{name}/press"), QUEUE_CAPACITY);
        let (release_queue, releases) = NoteQueue::new(format!("{name}/release"), QUEUE_CAPACITY);
        let voice_count = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicUsize::new(0));

        let bus = Self {
            name: name.clone(),
            preset,
            sample_rate,
            voices: Vec::with_capacity(MAX_VOICES),
            presses,
            releases,
            voice_count: Arc::clone(&voice_count),
            dropped: Arc::clone(&dropped),
        };
        let handle = InstrumentHandle {
            name,
            presses: press_queue,
            releases: release_queue,
            voice_count,
            dropped,
            next_serial: Arc::new(AtomicU64::new(0)),
        };
        (bus, handle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn preset(&self) -> &InstrumentPreset {
        &self.preset
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Sounding voices are never cut off. At the cap the new press is
    /// dropped and counted instead.
    fn start_voice(&mut self, request: PressRequest) {
        if self.voices.len() >= MAX_VOICES {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let voice = Voice::new(
            request.note,
            self.preset.waveform,
            self.preset.envelope(),
            self.preset.amplitude,
            self.sample_rate,
        );
        self.voices.push(voice.with_serial(request.serial));
    }

    fn apply_release(&mut self, request: ReleaseRequest) {
        match request {
            ReleaseRequest::Pitch(pitch) => {
                // voices stay in press order, so the first match is the oldest
                if let Some(voice) = self.voices.iter_mut().find(|v| v.pitch() == pitch && !v.is_released()) {
                    voice.release();
                }
            },
            ReleaseRequest::All { before } => self
                .voices
                .iter_mut()
                .filter(|v| v.serial() < before)
                .for_each(Voice::release),
        }
    }

    /// Render the next `buffer.len()` samples of this instrument into `buffer`
    /// (overwriting it). Pending presses are applied before pending releases,
    /// and voices whose envelope has finished are dropped afterwards.
    pub fn pull_samples(&mut self, buffer: &mut [f32]) {
        while let Some(request) = self.presses.try_pop() {
            self.start_voice(request);
        }
        while let Some(request) = self.releases.try_pop() {
            self.apply_release(request);
        }

        buffer.fill(0.0);
        for voice in self.voices.iter_mut() {
            voice.render_into(buffer);
        }

        self.voices.retain(|v| !v.is_dead());
        self.voice_count.store(self.voices.len(), Ordering::Relaxed);
    }

    /// Allocating convenience over [`pull_samples`](Self::pull_samples)
    pub fn pull(&mut self, length: usize) -> Vec<f32> {
        let mut buffer = vec![0.0; length];
        self.pull_samples(&mut buffer);
        buffer
    }
}

impl InstrumentHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn play(&self, note: Note) -> Result<()> {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        self.presses.push(PressRequest { note, serial })
    }

    pub fn release(&self, pitch: u8) -> Result<()> {
        self.releases.push(ReleaseRequest::Pitch(pitch))
    }

    /// Release every voice pressed through this instrument so far. Presses
    /// made after this call are left alone, even when they reach the bus in
    /// the same pull.
    pub fn release_all(&self) -> Result<()> {
        let before = self.next_serial.load(Ordering::Relaxed);
        self.releases.push(ReleaseRequest::All { before })
    }

    /// Voices alive after the most recent pull
    pub fn active_voices(&self) -> usize {
        self.voice_count.load(Ordering::Relaxed)
    }

    /// Presses turned away because the instrument was already at [`MAX_VOICES`]
    pub fn dropped_presses(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}
