use crossbeam_channel::Receiver;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use super::voice_pool::VoicePool;
use crate::types::events::ScheduledNote;

/// Playback engine driven by the output stream callback
/// Runs in real-time audio thread - must not block
pub struct ToneEngine {
    voice_pool: VoicePool,
    event_rx: Receiver<ScheduledNote>,
    /// Frames rendered so far; this is the output clock read by the session
    clock: Arc<AtomicU64>,
    volume: f32,
    mix_buffer: Vec<f32>,
}

impl ToneEngine {
    pub fn new(
        sample_rate: f32,
        volume: f32,
        event_rx: Receiver<ScheduledNote>,
        clock: Arc<AtomicU64>,
    ) -> Self {
        Self {
            voice_pool: VoicePool::new(sample_rate),
            event_rx,
            clock,
            volume: volume.clamp(0.0, 1.0),
            mix_buffer: vec![0.0; 1024],
        }
    }

    /// Fill an interleaved buffer; the mono mix is copied to every channel
    pub fn process(&mut self, output: &mut [f32], num_channels: usize) {
        // Pick up newly scheduled notes (non-blocking)
        while let Ok(note) = self.event_rx.try_recv() {
            self.voice_pool.schedule(&note);
        }

        let num_channels = num_channels.max(1);
        let frames = output.len() / num_channels;
        if self.mix_buffer.len() < frames {
            self.mix_buffer.resize(frames, 0.0);
        }

        let clock = self.clock.load(Ordering::Acquire);
        let mix = &mut self.mix_buffer[..frames];
        self.voice_pool.process(mix, clock);

        for (frame, sample) in output.chunks_mut(num_channels).zip(mix.iter()) {
            frame.fill(sample * self.volume);
        }

        self.clock.store(clock + frames as u64, Ordering::Release);
    }
}
