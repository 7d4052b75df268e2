use super::estimator::PitchEstimate;
use super::notes::NoteSequence;
use crate::config::DetectionConfig;
use crate::types::pitch::semitone_distance;

/// What a single estimate did to the note sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Onset {
    /// Too unclear or below the frequency floor
    Rejected,
    /// Accepted pitch, but too close to the last note to count as a new one
    Sustained { frequency: f32 },
    /// A new note was appended at `index`
    NewNote { index: usize, frequency: f32 },
    /// Accepted pitch, but the sequence already holds both notes
    Full { frequency: f32 },
}

impl Onset {
    /// Pitch to show on the live readout, if the estimate was accepted
    pub fn pitch(&self) -> Option<f32> {
        match *self {
            Onset::Rejected => None,
            Onset::Sustained { frequency }
            | Onset::NewNote { frequency, .. }
            | Onset::Full { frequency } => Some(frequency),
        }
    }
}

/// Turns a stream of pitch estimates into discrete note onsets
#[derive(Debug, Clone)]
pub struct OnsetDetector {
    confidence: f32,
    min_frequency: f32,
    new_note_semitones: f32,
}

impl OnsetDetector {
    pub fn new(confidence: f32, min_frequency: f32, new_note_semitones: f32) -> Self {
        Self {
            confidence,
            min_frequency,
            new_note_semitones,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.confidence,
            config.min_frequency,
            config.new_note_semitones,
        )
    }

    /// Clear enough and above the floor
    pub fn accepts(&self, estimate: &PitchEstimate) -> bool {
        estimate.confidence > self.confidence && estimate.frequency > self.min_frequency
    }

    /// Feed one estimate; appends to `notes` when it starts a new note
    pub fn offer(&self, estimate: PitchEstimate, notes: &mut NoteSequence) -> Onset {
        if !self.accepts(&estimate) {
            return Onset::Rejected;
        }

        let frequency = estimate.frequency;
        if notes.is_complete() {
            return Onset::Full { frequency };
        }

        let is_new = match notes.last() {
            None => true,
            Some(last) => semitone_distance(frequency, last) > self.new_note_semitones,
        };

        if is_new && notes.push(frequency) {
            Onset::NewNote {
                index: notes.len() - 1,
                frequency,
            }
        } else {
            Onset::Sustained { frequency }
        }
    }
}

impl Default for OnsetDetector {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}
