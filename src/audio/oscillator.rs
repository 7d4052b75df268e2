use crate::types::waveform::Waveform;

/// Oscillator with phase accumulation
/// Supports multiple waveforms: sine, triangle, sawtooth, square
pub struct Oscillator {
    /// Current phase position (0.0 to 1.0)
    phase: f32,
    /// Phase increment per sample (frequency / sample_rate)
    phase_delta: f32,
    frequency: f32,
    sample_rate: f32,
    waveform: Waveform,
}

impl Oscillator {
    pub fn new(sample_rate: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            phase_delta: 0.0,
            frequency: 440.0,
            sample_rate,
            waveform: Waveform::Sine,
        };
        osc.update_phase_delta();
        osc
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn set_frequency(&mut self, freq: f32) {
        self.frequency = freq;
        self.update_phase_delta();
    }

    fn update_phase_delta(&mut self) {
        self.phase_delta = self.frequency / self.sample_rate;
    }

    /// Generate next sample and advance phase
    pub fn next_sample(&mut self) -> f32 {
        let output = self.waveform.generate(self.phase);

        self.phase += self.phase_delta;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        output
    }

    /// Reset phase to zero so every note starts at the same point in the cycle
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
