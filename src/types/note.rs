/// Equal-temperament note naming
/// A440 tuning: MIDI note 69 = 440 Hz
use rand::Rng;

use super::pitch::{in_tune, A4_FREQUENCY};

const A4_MIDI: i32 = 69;

/// Pitch-class names used for the live readout (sharps only)
const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Spellings offered by the note drill, enharmonics included
pub const NOTE_SPELLINGS: [&str; 17] = [
    "C", "C#", "Db", "D", "D#", "Eb", "E", "F", "F#", "Gb", "G", "G#", "Ab", "A", "A#", "Bb", "B",
];

/// Convert MIDI note number to frequency in Hz
/// Uses equal temperament: f = 440 * 2^((n-69)/12)
pub fn midi_note_to_frequency(note: u8) -> f32 {
    let semitones = note as i32 - A4_MIDI;
    A4_FREQUENCY * 2.0_f32.powf(semitones as f32 / 12.0)
}

/// Nearest MIDI note to a frequency, None for non-positive input
pub fn frequency_to_midi_note(frequency: f32) -> Option<u8> {
    if frequency <= 0.0 {
        return None;
    }
    let semitones = 12.0 * (frequency / A4_FREQUENCY).log2();
    Some((A4_MIDI + semitones.round() as i32).clamp(0, 127) as u8)
}

/// Scientific pitch name, e.g. 60 -> "C4"
pub fn note_name(note: u8) -> String {
    let octave = note as i32 / 12 - 1;
    format!("{}{}", PITCH_CLASSES[note as usize % 12], octave)
}

/// Closest equal-tempered note to a detected frequency
#[derive(Debug, Clone, PartialEq)]
pub struct NearestNote {
    pub name: String,
    pub frequency: f32,
    /// Detected pitch lies within the tolerance of the reference
    pub in_tune: bool,
}

pub fn nearest_note(frequency: f32, tolerance_cents: f32) -> Option<NearestNote> {
    let midi = frequency_to_midi_note(frequency)?;
    let reference = midi_note_to_frequency(midi);
    Some(NearestNote {
        name: note_name(midi),
        frequency: reference,
        in_tune: in_tune(frequency, reference, tolerance_cents),
    })
}

/// Random spelling for the note drill
pub fn random_note_name<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    NOTE_SPELLINGS[rng.gen_range(0..NOTE_SPELLINGS.len())]
}
