use super::voice::Voice;
use crate::types::events::ScheduledNote;

/// Number of simultaneous voices supported
pub const MAX_VOICES: usize = 16;

/// Individual voice in the pool with allocation age
struct PoolVoice {
    voice: Voice,
    age: u64, // For voice stealing - lower = older
}

/// Pool of pre-allocated voices with allocation/stealing logic
pub struct VoicePool {
    voices: Vec<PoolVoice>,
    global_age: u64,
}

impl VoicePool {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: (0..MAX_VOICES)
                .map(|_| PoolVoice {
                    voice: Voice::new(sample_rate),
                    age: 0,
                })
                .collect(),
            global_age: 0,
        }
    }

    /// Schedule a note on a free voice, stealing the oldest one when all are busy
    pub fn schedule(&mut self, note: &ScheduledNote) {
        let idx = self.find_free_voice();
        let pool_voice = &mut self.voices[idx];
        pool_voice.voice.schedule(note);
        pool_voice.age = self.global_age;
        self.global_age += 1;
    }

    /// Priority: idle > oldest
    fn find_free_voice(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| !v.voice.is_active()) {
            return idx;
        }

        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age)
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// Number of voices waiting or sounding
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.voice.is_active()).count()
    }

    /// Mix all voices into a mono buffer whose first sample sits at `clock`
    pub fn process(&mut self, output: &mut [f32], clock: u64) {
        output.fill(0.0);
        if self.active_count() == 0 {
            return;
        }

        for pool_voice in &mut self.voices {
            if !pool_voice.voice.is_active() {
                continue;
            }
            for (i, sample) in output.iter_mut().enumerate() {
                *sample += pool_voice.voice.next_sample(clock + i as u64);
            }
        }
    }
}
