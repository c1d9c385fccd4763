use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig, StreamError, SupportedBufferSize};
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::core::synth::mixer::{Mixer, BUFFER_SIZE, SAMPLE_RATE};
use crate::error::{Error, Result};

/// Owns the output stream. The mixer moves onto the audio thread and is only
/// reached through the instrument handles from then on. Dropping the engine
/// stops playback.
pub struct AudioEngine {
    _stream: Stream,
    config: StreamConfig,
    errors: Receiver<StreamError>,
}

impl AudioEngine {
    pub fn start(mixer: Mixer) -> Result<Self> {
        let host = cpal::default_host();
        log::info!("using audio host {}", host.id().name());

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::AudioDevice("no output device available".to_string()))?;
        log::info!("using output device {}", device.name().unwrap_or_else(|_| "<unnamed>".to_string()));

        // fewest channels that can run at the engine rate; mono when offered
        let supported = device
            .supported_output_configs()?
            .filter(|c| c.min_sample_rate().0 <= SAMPLE_RATE && SAMPLE_RATE <= c.max_sample_rate().0)
            .min_by_key(|c| c.channels())
            .ok_or_else(|| Error::AudioDevice(format!("device cannot play at {SAMPLE_RATE} Hz")))?
            .with_sample_rate(cpal::SampleRate(SAMPLE_RATE));

        let sample_format = supported.sample_format();
        let buffer_size = match supported.buffer_size() {
            SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&(BUFFER_SIZE as u32)) => {
                cpal::BufferSize::Fixed(BUFFER_SIZE as u32)
            },
            _ => {
                log::warn!("device does not take {BUFFER_SIZE}-frame buffers, using its default");
                cpal::BufferSize::Default
            },
        };
        let mut config = StreamConfig::from(supported);
        config.buffer_size = buffer_size;
        log::info!("output config: {config:?} ({sample_format})");

        let (error_tx, errors) = bounded(16);
        let stream = match sample_format {
            SampleFormat::F32 => create_stream::<f32>(&device, &config, mixer, error_tx),
            SampleFormat::I16 => create_stream::<i16>(&device, &config, mixer, error_tx),
            SampleFormat::U16 => create_stream::<u16>(&device, &config, mixer, error_tx),
            other => Err(Error::AudioDevice(format!("unsupported sample format {other}"))),
        }?;
        stream.play()?;
        log::info!("audio stream started");

        Ok(Self {
            _stream: stream,
            config,
            errors,
        })
    }

    /// Surface a stream failure reported since the last check. Stream errors
    /// are fatal to the engine and are not retried.
    pub fn check(&self) -> Result<()> {
        match self.errors.try_recv() {
            Ok(err) => Err(err.into()),
            Err(_) => Ok(()),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

fn create_stream<T>(device: &cpal::Device, config: &StreamConfig, mut mixer: Mixer, errors: Sender<StreamError>) -> Result<Stream>
where
    T: Sample + SizedSample + FromSample<f32> + Send + 'static,
{
    let channels = config.channels as usize;
    let mut mono = [0.0f32; BUFFER_SIZE];

    let err_fn = move |err: StreamError| {
        log::error!("audio stream error: {err}");
        let _ = errors.try_send(err);
    };

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for block in data.chunks_mut(BUFFER_SIZE * channels) {
                let mono = &mut mono[..block.len() / channels];
                mixer.pull_mix(mono);
                for (frame, sample) in block.chunks_mut(channels).zip(mono.iter()) {
                    frame.fill(T::from_sample(*sample));
                }
            }
        },
        err_fn,
        None,
    )?;
    Ok(stream)
}
