pub mod engine;
pub mod envelope;
pub mod oscillator;
pub mod output;
pub mod synth;
pub mod voice;
pub mod voice_pool;
