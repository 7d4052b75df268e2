use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::pitch::C4_FREQUENCY;
use crate::types::waveform::Waveform;

/// Top-level configuration structure
/// Every section is optional; a missing file means all defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrainerConfig {
    #[serde(default)]
    pub devices: DeviceConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub detection: DetectionConfig,
}

impl TrainerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: TrainerConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .context("Invalid playback configuration")?;
        self.detection
            .validate()
            .context("Invalid detection configuration")?;
        Ok(())
    }
}

/// Device configuration; names match by index or case-insensitive substring
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audioin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audioout: Option<String>,
}

/// Tone playback settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Lower note of every recognition interval, in Hz
    #[serde(default = "default_root")]
    pub root: f32,

    /// Single-note length in seconds
    #[serde(default = "default_note_duration")]
    pub note_duration: f64,

    /// Silence between melodic notes, in seconds
    #[serde(default = "default_gap")]
    pub gap: f64,

    #[serde(default)]
    pub waveform: Waveform,

    #[serde(default = "default_volume")]
    pub volume: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            note_duration: default_note_duration(),
            gap: default_gap(),
            waveform: Waveform::default(),
            volume: default_volume(),
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<()> {
        if !(20.0..=2000.0).contains(&self.root) {
            return Err(anyhow!("Root must be between 20 and 2000 Hz"));
        }
        if !(0.1..=5.0).contains(&self.note_duration) {
            return Err(anyhow!("Note duration must be between 0.1 and 5.0 seconds"));
        }
        if !(0.0..=2.0).contains(&self.gap) {
            return Err(anyhow!("Gap must be between 0.0 and 2.0 seconds"));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(anyhow!("Volume must be between 0.0 and 1.0"));
        }
        Ok(())
    }
}

/// Pitch tracking thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectionConfig {
    /// Minimum estimator clarity for a pitch to count
    #[serde(default = "default_confidence")]
    pub confidence: f32,

    /// Pitches at or below this are treated as rumble/silence, in Hz
    #[serde(default = "default_min_frequency")]
    pub min_frequency: f32,

    /// Distance from the previous note that registers a new one, in semitones
    #[serde(default = "default_new_note_semitones")]
    pub new_note_semitones: f32,

    /// Samples per analysis window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Signal power below which the estimator reports no pitch
    #[serde(default = "default_power_threshold")]
    pub power_threshold: f32,

    /// Cents tolerance for the in-tune readout
    #[serde(default = "default_tolerance_cents")]
    pub tolerance_cents: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence: default_confidence(),
            min_frequency: default_min_frequency(),
            new_note_semitones: default_new_note_semitones(),
            window_size: default_window_size(),
            power_threshold: default_power_threshold(),
            tolerance_cents: default_tolerance_cents(),
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(anyhow!("Confidence must be between 0.0 and 1.0 (exclusive)"));
        }
        if !(0.0..=1000.0).contains(&self.min_frequency) {
            return Err(anyhow!("Minimum frequency must be between 0 and 1000 Hz"));
        }
        if !(self.new_note_semitones > 0.0 && self.new_note_semitones <= 12.0) {
            return Err(anyhow!("New-note distance must be between 0 and 12 semitones"));
        }
        if !(256..=16384).contains(&self.window_size) {
            return Err(anyhow!("Window size must be between 256 and 16384 samples"));
        }
        if !self.power_threshold.is_finite() || self.power_threshold < 0.0 {
            return Err(anyhow!("Power threshold must be a non-negative number"));
        }
        if !(self.tolerance_cents > 0.0 && self.tolerance_cents <= 100.0) {
            return Err(anyhow!("Tolerance must be between 0 and 100 cents"));
        }
        Ok(())
    }
}

/// Find a device index by index string or case-insensitive name substring
pub fn find_device_index(devices: &[String], search: &str) -> Option<usize> {
    if let Ok(index) = search.parse::<usize>() {
        return (index < devices.len()).then_some(index);
    }

    let search_lower = search.to_lowercase();
    devices
        .iter()
        .position(|device| device.to_lowercase().contains(&search_lower))
}

// Default value functions for serde
fn default_root() -> f32 {
    C4_FREQUENCY
}

fn default_note_duration() -> f64 {
    0.8
}

fn default_gap() -> f64 {
    0.1
}

fn default_volume() -> f32 {
    0.8
}

fn default_confidence() -> f32 {
    0.95
}

fn default_min_frequency() -> f32 {
    50.0
}

fn default_new_note_semitones() -> f32 {
    0.8
}

fn default_window_size() -> usize {
    2048
}

fn default_power_threshold() -> f32 {
    0.05
}

fn default_tolerance_cents() -> f32 {
    50.0
}
