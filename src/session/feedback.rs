use std::time::Instant;

/// Tone of a feedback message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Info,
    Correct,
    Wrong,
}

/// Message shown to the user below the challenge
#[derive(Debug, Clone, PartialEq)]
pub struct Feedback {
    pub text: String,
    pub kind: FeedbackKind,
    expires_at: Option<Instant>,
}

impl Feedback {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, FeedbackKind::Info)
    }

    pub fn correct(text: impl Into<String>) -> Self {
        Self::new(text, FeedbackKind::Correct)
    }

    pub fn wrong(text: impl Into<String>) -> Self {
        Self::new(text, FeedbackKind::Wrong)
    }

    fn new(text: impl Into<String>, kind: FeedbackKind) -> Self {
        Self {
            text: text.into(),
            kind,
            expires_at: None,
        }
    }

    /// Clear the message once `at` has passed
    pub fn until(mut self, at: Instant) -> Self {
        self.expires_at = Some(at);
        self
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_expiry() {
        let now = Instant::now();
        let feedback = Feedback::info("Playing back your interval...").until(now + Duration::from_millis(1800));

        assert!(!feedback.is_expired(now));
        assert!(feedback.is_expired(now + Duration::from_secs(2)));
        assert!(!Feedback::wrong("WRONG.").is_expired(now + Duration::from_secs(60)));
    }
}
