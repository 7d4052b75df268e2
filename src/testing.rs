//! In-memory stand-ins for the audio devices, shared by unit tests

use crossbeam_channel::Sender;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::audio::output::{AudioError, OutputContext};
use crate::pitch::estimator::{PitchEstimate, PitchEstimator};
use crate::pitch::input::{InputSource, InputStream, TrackerError};
use crate::types::events::ScheduledNote;

#[derive(Default)]
struct OutputState {
    time: f64,
    resumed: bool,
    resume_count: usize,
    fail_resume: bool,
    scheduled: Vec<ScheduledNote>,
}

/// Records scheduled notes; clones share state
#[derive(Clone, Default)]
pub struct FakeOutput {
    state: Rc<RefCell<OutputState>>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, time: f64) {
        self.state.borrow_mut().time = time;
    }

    pub fn scheduled(&self) -> Vec<ScheduledNote> {
        self.state.borrow().scheduled.clone()
    }

    pub fn resume_count(&self) -> usize {
        self.state.borrow().resume_count
    }

    pub fn fail_resume(&self) {
        self.state.borrow_mut().fail_resume = true;
    }

    pub fn is_suspended(&self) -> bool {
        !self.state.borrow().resumed
    }
}

impl OutputContext for FakeOutput {
    fn current_time(&self) -> f64 {
        self.state.borrow().time
    }

    fn is_suspended(&self) -> bool {
        FakeOutput::is_suspended(self)
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if state.fail_resume {
            return Err(AudioError::Resume("device lost".to_string()));
        }
        state.resumed = true;
        state.resume_count += 1;
        Ok(())
    }

    fn schedule(&mut self, note: ScheduledNote) -> Result<(), AudioError> {
        self.state.borrow_mut().scheduled.push(note);
        Ok(())
    }
}

#[derive(Default)]
struct InputState {
    fail: bool,
    open_count: usize,
    open_handles: usize,
    frames: Option<Sender<Vec<f32>>>,
}

/// Counts live handles so tests can see when the device is released
struct HandleGuard(Rc<RefCell<InputState>>);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        let mut state = self.0.borrow_mut();
        state.open_handles -= 1;
        state.frames = None;
    }
}

/// Microphone that is fed by hand
#[derive(Clone, Default)]
pub struct FakeInput {
    state: Rc<RefCell<InputState>>,
}

impl FakeInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every open is refused, as if permission were denied
    pub fn failing() -> Self {
        let input = Self::default();
        input.state.borrow_mut().fail = true;
        input
    }

    pub fn open_count(&self) -> usize {
        self.state.borrow().open_count
    }

    pub fn open_handles(&self) -> usize {
        self.state.borrow().open_handles
    }

    /// Deliver a capture buffer; dropped if no stream is open
    pub fn push(&self, samples: Vec<f32>) {
        if let Some(frames) = &self.state.borrow().frames {
            let _ = frames.try_send(samples);
        }
    }
}

impl InputSource for FakeInput {
    fn open(&mut self, frames: Sender<Vec<f32>>) -> Result<InputStream, TrackerError> {
        let mut state = self.state.borrow_mut();
        state.open_count += 1;
        if state.fail {
            return Err(TrackerError::MicrophoneUnavailable("permission denied".to_string()));
        }
        state.open_handles += 1;
        state.frames = Some(frames);
        drop(state);

        Ok(InputStream::new(44100, HandleGuard(self.state.clone())))
    }
}

#[derive(Default)]
struct EstimatorState {
    queue: VecDeque<PitchEstimate>,
    calls: usize,
    last_buffer_len: usize,
}

/// Returns queued estimates in order, then silence
#[derive(Clone, Default)]
pub struct ScriptedEstimator {
    state: Rc<RefCell<EstimatorState>>,
}

impl ScriptedEstimator {
    pub fn new(estimates: Vec<PitchEstimate>) -> Self {
        let estimator = Self::default();
        estimator.state.borrow_mut().queue = estimates.into();
        estimator
    }

    pub fn push(&self, estimate: PitchEstimate) {
        self.state.borrow_mut().queue.push_back(estimate);
    }

    pub fn calls(&self) -> usize {
        self.state.borrow().calls
    }

    pub fn last_buffer_len(&self) -> usize {
        self.state.borrow().last_buffer_len
    }
}

impl PitchEstimator for ScriptedEstimator {
    fn estimate(&mut self, buffer: &[f32], _sample_rate: u32) -> PitchEstimate {
        let mut state = self.state.borrow_mut();
        state.calls += 1;
        state.last_buffer_len = buffer.len();
        state.queue.pop_front().unwrap_or_else(PitchEstimate::silent)
    }
}
