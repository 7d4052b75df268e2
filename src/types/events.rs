use super::waveform::Waveform;

/// A note handed from the session thread to the audio thread
/// Times are seconds on the output clock; must be cheap to copy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub frequency: f32,
    pub start_time: f64,
    pub duration: f64,
    pub waveform: Waveform,
}

impl ScheduledNote {
    pub fn new(frequency: f32, start_time: f64, duration: f64, waveform: Waveform) -> Self {
        Self {
            frequency,
            start_time,
            duration,
            waveform,
        }
    }
}
