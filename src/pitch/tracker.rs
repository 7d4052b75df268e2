use crossbeam_channel::{Receiver, bounded};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use super::estimator::PitchEstimator;
use super::input::{InputSource, InputStream, TrackerError};
use super::notes::NoteSequence;
use super::onset::{Onset, OnsetDetector};
use crate::config::DetectionConfig;

/// Capture buffers queued between two polls before the callback starts dropping them
const FRAME_QUEUE: usize = 64;

/// Tracker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    RequestingAccess,
    Listening,
    Stopped,
}

impl TrackerState {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerState::Idle => "idle",
            TrackerState::RequestingAccess => "requesting access",
            TrackerState::Listening => "listening",
            TrackerState::Stopped => "stopped",
        }
    }
}

/// Result of one sampling step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PollOutcome {
    /// Accepted pitch for the live readout
    pub pitch: Option<f32>,
    pub onset: Option<Onset>,
    /// The sequence just reached two notes and the tracker has stopped
    pub completed: bool,
}

/// Live monophonic pitch tracker
/// Owns the microphone stream. `poll` is the sampling loop body: it runs only
/// while listening, so a `stop` always lands before the next buffer read.
pub struct PitchTracker {
    source: Box<dyn InputSource>,
    estimator: Box<dyn PitchEstimator>,
    onsets: OnsetDetector,
    window_size: usize,
    state: TrackerState,
    stream: Option<InputStream>,
    frames_rx: Option<Receiver<Vec<f32>>>,
    window: VecDeque<f32>,
    sample_rate: u32,
}

impl PitchTracker {
    pub fn new(
        source: Box<dyn InputSource>,
        estimator: Box<dyn PitchEstimator>,
        config: &DetectionConfig,
    ) -> Self {
        Self {
            source,
            estimator,
            onsets: OnsetDetector::from_config(config),
            window_size: config.window_size,
            state: TrackerState::Idle,
            stream: None,
            frames_rx: None,
            window: VecDeque::with_capacity(config.window_size),
            sample_rate: 0,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == TrackerState::Listening
    }

    /// Request the microphone and begin listening; no-op if already listening
    pub fn start(&mut self) -> Result<(), TrackerError> {
        if self.is_listening() {
            return Ok(());
        }

        // Never hold two device handles at once
        self.release();
        self.state = TrackerState::RequestingAccess;

        let (frames_tx, frames_rx) = bounded(FRAME_QUEUE);
        match self.source.open(frames_tx) {
            Ok(stream) => {
                self.sample_rate = stream.sample_rate;
                self.stream = Some(stream);
                self.frames_rx = Some(frames_rx);
                self.state = TrackerState::Listening;
                info!(sample_rate = self.sample_rate, "pitch tracker listening");
                Ok(())
            }
            Err(e) => {
                warn!("pitch tracker could not start: {}", e);
                self.release();
                self.state = TrackerState::Stopped;
                Err(e)
            }
        }
    }

    /// Release the microphone and halt sampling; safe to call repeatedly
    pub fn stop(&mut self) {
        let was_listening = self.is_listening();
        self.release();
        if self.state != TrackerState::Idle {
            self.state = TrackerState::Stopped;
        }
        if was_listening {
            info!("pitch tracker stopped");
        }
    }

    fn release(&mut self) {
        self.stream = None;
        self.frames_rx = None;
        self.window.clear();
    }

    /// One sampling step: read the latest window, estimate, register onsets
    /// Stops the tracker itself when `notes` becomes complete
    pub fn poll(&mut self, notes: &mut NoteSequence) -> PollOutcome {
        if !self.is_listening() {
            return PollOutcome::default();
        }

        if let Some(rx) = &self.frames_rx {
            for frame in rx.try_iter() {
                self.window.extend(frame);
            }
        }
        let excess = self.window.len().saturating_sub(self.window_size);
        self.window.drain(..excess);

        if self.window.len() < self.window_size {
            return PollOutcome::default();
        }

        let estimate = self
            .estimator
            .estimate(self.window.make_contiguous(), self.sample_rate);
        let onset = self.onsets.offer(estimate, notes);

        let mut completed = false;
        if let Onset::NewNote { index, frequency } = onset {
            debug!(index, frequency, "note onset");
            if notes.is_complete() {
                self.stop();
                completed = true;
            }
        }

        PollOutcome {
            pitch: onset.pitch(),
            onset: Some(onset),
            completed,
        }
    }
}
