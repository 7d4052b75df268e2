//! # Microphone Input
//!
//! Opens a capture stream with cpal and forwards mono sample buffers to the
//! pitch tracker over a channel. The returned [`InputStream`] owns the device
//! handle: dropping it stops capture and releases the microphone.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use std::any::Any;
use thiserror::Error;
use tracing::{info, warn};

use crate::audio::output::device_name;

/// Failures of the capture path
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Permission denied, no device, or the device refused the stream
    #[error("microphone unavailable: {0}")]
    MicrophoneUnavailable(String),
}

impl TrackerError {
    fn unavailable(reason: impl ToString) -> Self {
        TrackerError::MicrophoneUnavailable(reason.to_string())
    }
}

/// A live capture stream; dropping it releases the device
pub struct InputStream {
    pub sample_rate: u32,
    _handle: Box<dyn Any>,
}

impl InputStream {
    pub fn new(sample_rate: u32, handle: impl Any) -> Self {
        Self {
            sample_rate,
            _handle: Box::new(handle),
        }
    }
}

/// Something that can grant access to a live audio stream
pub trait InputSource {
    /// Start capturing; mono frames are pushed into `frames` until the stream is dropped
    fn open(&mut self, frames: Sender<Vec<f32>>) -> Result<InputStream, TrackerError>;
}

/// cpal capture device, chosen by name or the host default
pub struct Microphone {
    device_name: Option<String>,
}

impl Microphone {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }

    fn find_device(&self, host: &cpal::Host) -> Result<cpal::Device, TrackerError> {
        let Some(search) = self.device_name.as_deref() else {
            return host
                .default_input_device()
                .ok_or_else(|| TrackerError::unavailable("no input device available"));
        };

        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(TrackerError::unavailable)?
            .collect();
        let names: Vec<String> = devices
            .iter()
            .map(|d| device_name(d).unwrap_or_default())
            .collect();

        crate::config::find_device_index(&names, search)
            .and_then(|index| devices.into_iter().nth(index))
            .ok_or_else(|| TrackerError::unavailable(format!("input device '{}' not found", search)))
    }
}

impl InputSource for Microphone {
    fn open(&mut self, frames: Sender<Vec<f32>>) -> Result<InputStream, TrackerError> {
        let host = cpal::default_host();
        let device = self.find_device(&host)?;

        let supported = device
            .default_input_config()
            .map_err(TrackerError::unavailable)?;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate as u32;

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_input::<f32>(&device, &config, frames)?,
            cpal::SampleFormat::I16 => build_input::<i16>(&device, &config, frames)?,
            cpal::SampleFormat::U16 => build_input::<u16>(&device, &config, frames)?,
            other => {
                return Err(TrackerError::unavailable(format!(
                    "unsupported input sample format {:?}",
                    other
                )));
            }
        };

        // The stream is dropped (and the device released) if play fails
        stream.play().map_err(TrackerError::unavailable)?;

        info!(
            device = %device_name(&device).unwrap_or_default(),
            sample_rate, "microphone opened"
        );
        Ok(InputStream::new(sample_rate, stream))
    }
}

/// Build a capture stream that downmixes each callback buffer to mono
fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    frames: Sender<Vec<f32>>,
) -> Result<cpal::Stream, TrackerError>
where
    T: cpal::Sample + cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let channels = (config.channels as usize).max(1);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mono: Vec<f32> = data
                    .chunks(channels)
                    .map(|frame| {
                        frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / frame.len() as f32
                    })
                    .collect();
                // Never block the audio thread; a full queue drops the buffer
                let _ = frames.try_send(mono);
            },
            |err| warn!("audio input stream error: {}", err),
            None,
        )
        .map_err(TrackerError::unavailable)
}

/// Names of all input devices, default device included
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut devices: Vec<String> = host
        .input_devices()
        .map(|iter| iter.filter_map(|device| device_name(&device)).collect())
        .unwrap_or_default();

    if let Some(name) = host.default_input_device().and_then(|d| device_name(&d)) {
        if !devices.contains(&name) {
            devices.push(name);
        }
    }

    devices
}
