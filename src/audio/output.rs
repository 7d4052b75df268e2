use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::engine::ToneEngine;
use crate::types::events::ScheduledNote;

/// Failures of the playback path
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("audio output device '{0}' not found")]
    DeviceNotFound(String),
    #[error("unsupported output sample format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to open audio output: {0}")]
    Stream(String),
    #[error("failed to resume audio output: {0}")]
    Resume(String),
    #[error("audio engine is no longer running")]
    EngineGone,
}

/// The output side of the audio graph as the synthesizer sees it
pub trait OutputContext {
    /// Current output clock time in seconds
    fn current_time(&self) -> f64;

    /// Output starts suspended until the first playback
    fn is_suspended(&self) -> bool;

    fn resume(&mut self) -> Result<(), AudioError>;

    /// Hand a note to the audio thread
    fn schedule(&mut self, note: ScheduledNote) -> Result<(), AudioError>;
}

/// cpal-backed output context
/// Owns the stream; the engine lives inside the stream callback
pub struct AudioOutput {
    stream: cpal::Stream,
    suspended: bool,
    event_tx: Sender<ScheduledNote>,
    clock: Arc<AtomicU64>,
    sample_rate: f32,
}

impl AudioOutput {
    /// Open an output device by name (case-insensitive substring or index), or the default one
    pub fn open(device_name: Option<&str>, volume: f32) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(search) => find_output_device(&host, search)?,
            None => host.default_output_device().ok_or(AudioError::NoDevice)?,
        };

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate as f32;
        let num_channels = config.channels as usize;

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let clock = Arc::new(AtomicU64::new(0));
        let engine = ToneEngine::new(sample_rate, volume, event_rx, clock.clone());

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, engine, num_channels)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, engine, num_channels)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, engine, num_channels)?,
            other => return Err(AudioError::UnsupportedFormat(format!("{:?}", other))),
        };

        // Stay silent until something is played
        if let Err(e) = stream.pause() {
            debug!("could not pause fresh output stream: {}", e);
        }

        info!(sample_rate, num_channels, "audio output opened");

        Ok(Self {
            stream,
            suspended: true,
            event_tx,
            clock,
            sample_rate,
        })
    }
}

impl OutputContext for AudioOutput {
    fn current_time(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::Resume(e.to_string()))?;
        self.suspended = false;
        info!("audio output resumed");
        Ok(())
    }

    fn schedule(&mut self, note: ScheduledNote) -> Result<(), AudioError> {
        self.event_tx.send(note).map_err(|_| AudioError::EngineGone)
    }
}

/// Build the output stream with the engine moved into the callback
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: ToneEngine,
    num_channels: usize,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    // Pre-allocate buffer for processing
    let mut temp_buffer = vec![0.0f32; 512 * num_channels];

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if temp_buffer.len() < data.len() {
                    temp_buffer.resize(data.len(), 0.0);
                }

                engine.process(&mut temp_buffer[..data.len()], num_channels);

                for (out, sample) in data.iter_mut().zip(temp_buffer.iter()) {
                    *out = T::from_sample(*sample);
                }
            },
            |err| warn!("audio output stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    Ok(stream)
}

/// Names of all output devices, default device included
pub fn list_output_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut devices: Vec<String> = host
        .output_devices()
        .map(|iter| iter.filter_map(|device| device_name(&device)).collect())
        .unwrap_or_default();

    if let Some(name) = host.default_output_device().and_then(|d| device_name(&d)) {
        if !devices.contains(&name) {
            devices.push(name);
        }
    }

    devices
}

pub(crate) fn device_name(device: &cpal::Device) -> Option<String> {
    device
        .description()
        .ok()
        .map(|desc| desc.name().to_string())
}

/// Find an output device by index or case-insensitive name substring
fn find_output_device(host: &cpal::Host, search: &str) -> Result<cpal::Device, AudioError> {
    let devices: Vec<cpal::Device> = host
        .output_devices()
        .map_err(|e| AudioError::Stream(e.to_string()))?
        .collect();

    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();

    match crate::config::find_device_index(&names, search) {
        Some(index) => devices
            .into_iter()
            .nth(index)
            .ok_or_else(|| AudioError::DeviceNotFound(search.to_string())),
        None => Err(AudioError::DeviceNotFound(search.to_string())),
    }
}
