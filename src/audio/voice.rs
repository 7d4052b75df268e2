use super::{envelope::Envelope, oscillator::Oscillator};
use crate::types::events::ScheduledNote;

/// Single playback voice
/// Signal chain: Oscillator → Envelope → gain, gated to start at a given clock sample
pub struct Voice {
    oscillator: Oscillator,
    envelope: Envelope,
    sample_rate: f32,
    /// Clock sample at which the note begins, while it is still waiting
    pending_start: Option<u64>,
    duration: f64,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            oscillator: Oscillator::new(sample_rate),
            envelope: Envelope::new(sample_rate),
            sample_rate,
            pending_start: None,
            duration: 0.0,
        }
    }

    /// Arm the voice for a note; it stays silent until the clock reaches the start time
    pub fn schedule(&mut self, note: &ScheduledNote) {
        self.envelope.reset();
        self.oscillator.set_waveform(note.waveform);
        self.oscillator.set_frequency(note.frequency);
        self.oscillator.reset();
        self.pending_start = Some(seconds_to_samples(note.start_time, self.sample_rate));
        self.duration = note.duration;
    }

    /// Voice is waiting for its start time or still sounding
    pub fn is_active(&self) -> bool {
        self.pending_start.is_some() || self.envelope.is_active()
    }

    /// Generate the sample for absolute clock position `clock`
    pub fn next_sample(&mut self, clock: u64) -> f32 {
        if let Some(start) = self.pending_start {
            if clock < start {
                return 0.0;
            }
            self.pending_start = None;
            self.envelope.note_on(self.duration);
        }

        if !self.envelope.is_active() {
            return 0.0;
        }

        let osc_sample = self.oscillator.next_sample();
        osc_sample * self.envelope.next_sample()
    }
}

/// Output-clock seconds to a sample index; times before zero start immediately
pub fn seconds_to_samples(seconds: f64, sample_rate: f32) -> u64 {
    (seconds.max(0.0) * sample_rate as f64).round() as u64
}
