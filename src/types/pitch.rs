//! Frequency math on equal temperament
//! Distances are unsigned: ascending and descending intervals compare equal.
//! Non-positive frequencies mean "no pitch" and produce 0 / false, never an error.

/// Concert A
pub const A4_FREQUENCY: f32 = 440.0;

/// Middle C, nine semitones below A4 (~261.63 Hz)
pub const C4_FREQUENCY: f32 = 261.625_57;

/// Unsigned distance in semitones: 12 * |log2(f2 / f1)|
pub fn semitone_distance(f1: f32, f2: f32) -> f32 {
    if f1 <= 0.0 || f2 <= 0.0 {
        return 0.0;
    }
    12.0 * (f2 / f1).log2().abs()
}

/// Unsigned distance in cents: 1200 * |log2(f2 / f1)|
pub fn cent_distance(f1: f32, f2: f32) -> f32 {
    if f1 <= 0.0 || f2 <= 0.0 {
        return 0.0;
    }
    1200.0 * (f2 / f1).log2().abs()
}

/// True when the two frequencies lie within `tolerance_cents` of each other
pub fn in_tune(f1: f32, f2: f32, tolerance_cents: f32) -> bool {
    if f1 <= 0.0 || f2 <= 0.0 {
        return false;
    }
    cent_distance(f1, f2) <= tolerance_cents
}

/// Frequency `semitones` above (or below, if negative) the root
pub fn transpose(root: f32, semitones: i32) -> f32 {
    root * 2.0_f32.powf(semitones as f32 / 12.0)
}
