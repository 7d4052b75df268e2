/// Time to ramp from silence to peak, in seconds
pub const ATTACK_TIME: f64 = 0.05;
/// Envelope peak amplitude
pub const PEAK_LEVEL: f32 = 0.5;
/// Oscillator keeps running this long after the envelope reaches silence
pub const STOP_DELAY: f64 = 0.1;

/// Trapezoidal note envelope
/// Linear ramp up to PEAK_LEVEL over ATTACK_TIME, linear ramp back to silence
/// ending exactly at the note duration, then a silent tail of STOP_DELAY
/// before the voice is released. Implemented as a sample-counting state machine.
pub struct Envelope {
    state: EnvelopeState,
    /// Samples since note on
    elapsed: u64,
    /// Sample at which the attack reaches the peak
    attack_end: u64,
    /// Sample at which the release reaches silence (note duration)
    release_end: u64,
    /// Sample at which the voice stops
    stop_at: u64,
    current_level: f32,
    sample_rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EnvelopeState {
    Idle,
    Attack,
    Release,
    Tail,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            state: EnvelopeState::Idle,
            elapsed: 0,
            attack_end: 0,
            release_end: 0,
            stop_at: 0,
            current_level: 0.0,
            sample_rate,
        }
    }

    /// Start a note lasting `duration` seconds
    pub fn note_on(&mut self, duration: f64) {
        let sample_rate = self.sample_rate as f64;
        let duration = duration.max(0.0);

        self.elapsed = 0;
        self.attack_end = (ATTACK_TIME.min(duration) * sample_rate).round() as u64;
        self.release_end = (duration * sample_rate).round() as u64;
        self.stop_at = ((duration + STOP_DELAY) * sample_rate).round() as u64;
        self.current_level = 0.0;

        // A zero-length note never opens the gate
        self.state = if self.release_end == 0 {
            EnvelopeState::Tail
        } else {
            EnvelopeState::Attack
        };
    }

    /// Check if envelope is active (not idle)
    pub fn is_active(&self) -> bool {
        !matches!(self.state, EnvelopeState::Idle)
    }

    /// Generate next envelope sample
    pub fn next_sample(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => {
                self.current_level = 0.0;
            }

            EnvelopeState::Attack if self.elapsed < self.attack_end => {
                let progress = self.elapsed as f32 / self.attack_end as f32;
                self.current_level = PEAK_LEVEL * progress;
            }

            EnvelopeState::Attack | EnvelopeState::Release => {
                if self.elapsed >= self.release_end {
                    self.current_level = 0.0;
                    self.state = EnvelopeState::Tail;
                } else {
                    self.state = EnvelopeState::Release;
                    let span = (self.release_end - self.attack_end) as f32;
                    let progress = (self.elapsed - self.attack_end) as f32 / span;
                    self.current_level = PEAK_LEVEL * (1.0 - progress);
                }
            }

            EnvelopeState::Tail => {
                self.current_level = 0.0;
                if self.elapsed >= self.stop_at {
                    self.state = EnvelopeState::Idle;
                }
            }
        }

        self.elapsed += 1;
        self.current_level
    }

    /// Reset envelope to idle state
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.current_level = 0.0;
        self.elapsed = 0;
    }
}
