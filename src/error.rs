//! Error types shared by the synth core and the session.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid note: pitch {pitch} and velocity {velocity} must both be within 0..=127")]
    InvalidNote { pitch: i32, velocity: i32 },

    #[error("Invalid tempo: {0}. BPM must be at least 1")]
    InvalidTempo(i64),

    #[error("Hand-off queue for '{0}' is full")]
    QueueFull(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("MIDI error: {0}")]
    Midi(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl From<cpal::BuildStreamError> for Error {
    fn from(err: cpal::BuildStreamError) -> Self {
        Error::AudioDevice(format!("failed to build output stream: {err}"))
    }
}

impl From<cpal::PlayStreamError> for Error {
    fn from(err: cpal::PlayStreamError) -> Self {
        Error::AudioDevice(format!("failed to start output stream: {err}"))
    }
}

impl From<cpal::DefaultStreamConfigError> for Error {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        Error::AudioDevice(format!("no usable output config: {err}"))
    }
}

impl From<cpal::SupportedStreamConfigsError> for Error {
    fn from(err: cpal::SupportedStreamConfigsError) -> Self {
        Error::AudioDevice(format!("could not query output configs: {err}"))
    }
}

impl From<cpal::StreamError> for Error {
    fn from(err: cpal::StreamError) -> Self {
        Error::AudioDevice(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Settings(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
