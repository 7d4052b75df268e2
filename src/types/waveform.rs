use serde::{Deserialize, Serialize};

/// Oscillator shapes available for playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Square => "square",
        }
    }

    /// Generate sample for this waveform at given phase (0.0 to 1.0)
    pub fn generate(&self, phase: f32) -> f32 {
        use std::f32::consts::PI;

        match self {
            Waveform::Sine => (phase * 2.0 * PI).sin(),
            Waveform::Triangle => {
                // -1 to 1 and back over one cycle
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}
