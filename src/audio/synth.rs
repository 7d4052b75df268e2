use tracing::debug;

use super::output::{AudioError, OutputContext};
use crate::config::PlaybackConfig;
use crate::types::{events::ScheduledNote, pitch::transpose, waveform::Waveform};

/// How the two notes of an interval are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStyle {
    /// Both notes at once
    Harmonic,
    /// One after the other
    Melodic,
}

impl PlaybackStyle {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackStyle::Harmonic => "harmonic",
            PlaybackStyle::Melodic => "melodic",
        }
    }
}

/// Settle time after the last note before another playback may start
const PLAYBACK_TAIL: f64 = 0.1;

/// Schedules notes on an output context
pub struct Synthesizer {
    output: Box<dyn OutputContext>,
    settings: PlaybackConfig,
}

impl Synthesizer {
    pub fn new(output: Box<dyn OutputContext>, settings: PlaybackConfig) -> Self {
        Self { output, settings }
    }

    /// Schedule one enveloped note, resuming the output first if it is suspended
    pub fn play_note(
        &mut self,
        frequency: f32,
        start_time: f64,
        duration: f64,
        waveform: Waveform,
    ) -> Result<(), AudioError> {
        if self.output.is_suspended() {
            self.output.resume()?;
        }
        debug!(frequency, start_time, duration, waveform = waveform.name(), "note scheduled");
        self.output
            .schedule(ScheduledNote::new(frequency, start_time, duration, waveform))
    }

    /// Play `semitones` above the configured root
    /// Returns the total time the playback occupies, in seconds
    pub fn play_interval(&mut self, semitones: i32, style: PlaybackStyle) -> Result<f64, AudioError> {
        let root = self.settings.root;
        let upper = transpose(root, semitones);
        match style {
            PlaybackStyle::Harmonic => self.play_harmonic(root, upper),
            PlaybackStyle::Melodic => self.play_melodic(root, upper),
        }
    }

    /// Two notes starting together, each held twice the single-note duration
    pub fn play_harmonic(&mut self, first: f32, second: f32) -> Result<f64, AudioError> {
        let now = self.output.current_time();
        let duration = self.settings.note_duration * 2.0;
        let waveform = self.settings.waveform;
        self.play_note(first, now, duration, waveform)?;
        self.play_note(second, now, duration, waveform)?;
        Ok(self.playback_length())
    }

    /// Second note starts after the first one's duration plus the gap
    pub fn play_melodic(&mut self, first: f32, second: f32) -> Result<f64, AudioError> {
        let now = self.output.current_time();
        let duration = self.settings.note_duration;
        let waveform = self.settings.waveform;
        self.play_note(first, now, duration, waveform)?;
        self.play_note(second, now + duration + self.settings.gap, duration, waveform)?;
        Ok(self.playback_length())
    }

    /// Time a two-note playback keeps the trainer busy
    /// Covers the longer melodic span, so both styles share one window
    pub fn playback_length(&self) -> f64 {
        self.settings.note_duration * 2.0 + self.settings.gap + PLAYBACK_TAIL
    }
}
