use pitch_detection::detector::{PitchDetector, mcleod::McLeodDetector};

/// Peak-picking constant of the McLeod method: the first NSDF key maximum
/// within this fraction of the highest one is taken as the period
const KEY_MAXIMUM_THRESHOLD: f32 = 0.9;

/// One estimator reading for a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    /// Fundamental frequency in Hz (0.0 when no pitch was found)
    pub frequency: f32,
    /// Clarity of the estimate, 0.0 to 1.0
    pub confidence: f32,
}

impl PitchEstimate {
    pub fn new(frequency: f32, confidence: f32) -> Self {
        Self {
            frequency,
            confidence,
        }
    }

    /// No periodic signal in the window
    pub fn silent() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Monophonic fundamental-frequency estimator
pub trait PitchEstimator {
    fn estimate(&mut self, buffer: &[f32], sample_rate: u32) -> PitchEstimate;
}

/// McLeod pitch method (NSDF peak picking) from the pitch-detection crate
pub struct McLeodEstimator {
    detector: McLeodDetector<f32>,
    size: usize,
    power_threshold: f32,
}

impl McLeodEstimator {
    pub fn new(size: usize, power_threshold: f32) -> Self {
        Self {
            detector: McLeodDetector::new(size, size / 2),
            size,
            power_threshold,
        }
    }
}

impl PitchEstimator for McLeodEstimator {
    fn estimate(&mut self, buffer: &[f32], sample_rate: u32) -> PitchEstimate {
        // Detector buffers are sized up front
        if buffer.len() != self.size {
            *self = Self::new(buffer.len(), self.power_threshold);
        }

        self.detector
            .get_pitch(
                buffer,
                sample_rate as usize,
                self.power_threshold,
                KEY_MAXIMUM_THRESHOLD,
            )
            .filter(|pitch| pitch.frequency.is_finite() && pitch.clarity.is_finite())
            .map(|pitch| PitchEstimate::new(pitch.frequency, pitch.clarity))
            .unwrap_or_else(PitchEstimate::silent)
    }
}
