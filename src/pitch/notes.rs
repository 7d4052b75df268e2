/// Number of notes that make up one produced interval
pub const MAX_NOTES: usize = 2;

/// Frequencies captured from the user, in the order they were sung or played
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteSequence {
    notes: Vec<f32>,
}

impl NoteSequence {
    pub fn new() -> Self {
        Self {
            notes: Vec::with_capacity(MAX_NOTES),
        }
    }

    /// Append a note; refused once the sequence is full or for non-positive input
    pub fn push(&mut self, frequency: f32) -> bool {
        if self.is_complete() || frequency <= 0.0 {
            return false;
        }
        self.notes.push(frequency);
        true
    }

    pub fn last(&self) -> Option<f32> {
        self.notes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.notes.len() >= MAX_NOTES
    }

    /// Both notes, once captured
    pub fn pair(&self) -> Option<(f32, f32)> {
        match self.notes.as_slice() {
            [first, second] => Some((*first, *second)),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.notes
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_exceeds_two_notes() {
        let mut notes = NoteSequence::new();
        assert!(notes.push(261.63));
        assert!(notes.push(392.0));
        assert!(!notes.push(523.25));
        assert_eq!(notes.len(), 2);
        assert_eq!(notes.pair(), Some((261.63, 392.0)));
    }

    #[test]
    fn test_rejects_no_pitch() {
        let mut notes = NoteSequence::new();
        assert!(!notes.push(0.0));
        assert!(notes.is_empty());
        assert_eq!(notes.pair(), None);
    }

    #[test]
    fn test_clear() {
        let mut notes = NoteSequence::new();
        notes.push(440.0);
        notes.clear();
        assert!(notes.is_empty());
        assert_eq!(notes.last(), None);
    }
}
