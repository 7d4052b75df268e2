use rand::Rng;

/// Label used for semitone counts outside the 1-12 catalog
pub const UNKNOWN_INTERVAL: &str = "Unknown interval";

/// A named musical interval from the fixed catalog (minor 2nd through octave)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub semitones: u8,
    pub name: &'static str,
}

/// Ordered catalog, one entry per semitone count
const CATALOG: [Interval; 12] = [
    Interval { semitones: 1, name: "Minor 2nd" },
    Interval { semitones: 2, name: "Major 2nd" },
    Interval { semitones: 3, name: "Minor 3rd" },
    Interval { semitones: 4, name: "Major 3rd" },
    Interval { semitones: 5, name: "Perfect 4th" },
    Interval { semitones: 6, name: "Tritone" },
    Interval { semitones: 7, name: "Perfect 5th" },
    Interval { semitones: 8, name: "Minor 6th" },
    Interval { semitones: 9, name: "Major 6th" },
    Interval { semitones: 10, name: "Minor 7th" },
    Interval { semitones: 11, name: "Major 7th" },
    Interval { semitones: 12, name: "Octave" },
];

impl Interval {
    /// Look up a catalog entry by semitone count
    pub fn from_semitones(semitones: i32) -> Option<Self> {
        if (1..=12).contains(&semitones) {
            Some(CATALOG[(semitones - 1) as usize])
        } else {
            None
        }
    }
}

/// All twelve intervals in ascending order
pub fn catalog() -> &'static [Interval] {
    &CATALOG
}

/// Pick one of the twelve catalog intervals, uniformly
pub fn random_interval<R: Rng + ?Sized>(rng: &mut R) -> Interval {
    CATALOG[rng.gen_range(0..CATALOG.len())]
}

/// Name for a semitone count; rounding a detected interval can land outside
/// the catalog (0, 13+), which yields the fallback label instead of failing
pub fn name_for(semitones: i32) -> &'static str {
    Interval::from_semitones(semitones)
        .map(|interval| interval.name)
        .unwrap_or(UNKNOWN_INTERVAL)
}
