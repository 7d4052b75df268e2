use std::time::Instant;

use crate::session::state::{Mode, Session};
use crate::types::interval::{Interval, catalog};

/// UI application state
/// Wraps the session with the bits only the terminal needs
pub struct App {
    pub session: Session,
    /// Highlighted recognition guess (index into the interval catalog), None = no selection
    pub selected_guess: Option<usize>,
    /// Whether to quit the application
    pub should_quit: bool,
    /// Whether to show help screen
    pub show_help: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            selected_guess: None,
            should_quit: false,
            show_help: false,
        }
    }

    /// Interval behind the highlighted guess
    pub fn guess(&self) -> Option<Interval> {
        self.selected_guess.and_then(|i| catalog().get(i).copied())
    }

    /// Move the guess highlight down, wrapping
    pub fn next_guess(&mut self) {
        let len = catalog().len();
        self.selected_guess = Some(match self.selected_guess {
            None => 0,
            Some(i) => (i + 1) % len,
        });
    }

    /// Move the guess highlight up, wrapping
    pub fn prev_guess(&mut self) {
        let len = catalog().len();
        self.selected_guess = Some(match self.selected_guess {
            None | Some(0) => len - 1,
            Some(i) => i - 1,
        });
    }

    /// Jump straight to a semitone count
    pub fn select_semitones(&mut self, semitones: u8) {
        self.selected_guess = catalog().iter().position(|i| i.semitones == semitones);
    }

    /// Space/p: play a new interval, or replay the user's notes in production
    pub fn play(&mut self, now: Instant) {
        match self.session.mode() {
            Mode::Recognition => {
                if self.session.play_interval(now).is_some() {
                    self.selected_guess = None;
                }
            }
            Mode::Production => {
                if self.session.controls().replay {
                    self.session.replay(now);
                }
            }
        }
    }

    pub fn submit_guess(&mut self) {
        if self.session.mode() == Mode::Recognition {
            let guess = self.guess().map(|i| i.semitones);
            self.session.submit_guess(guess);
        }
    }

    pub fn start_listening(&mut self) {
        if self.session.mode() == Mode::Production && self.session.controls().start {
            // Failure is already reported through the session feedback
            let _ = self.session.start_listening();
        }
    }

    pub fn stop_listening(&mut self) {
        if self.session.controls().stop {
            self.session.stop_listening();
        }
    }

    /// Reset button: discard captured notes and deal a fresh challenge
    pub fn reset(&mut self) {
        if self.session.mode() == Mode::Production && self.session.controls().reset {
            self.session.start_new_challenge();
        }
    }

    pub fn new_challenge(&mut self) {
        if self.session.mode() == Mode::Production {
            self.session.start_new_challenge();
        }
    }

    pub fn toggle_mode(&mut self) {
        self.session.toggle_mode();
        self.selected_guess = None;
    }

    /// Mark app for quit
    pub fn quit(&mut self) {
        self.session.stop_listening();
        self.should_quit = true;
    }

    /// Toggle help screen visibility
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainerConfig;
    use crate::testing::{FakeInput, FakeOutput, ScriptedEstimator};
    use rand::{SeedableRng, rngs::StdRng};

    fn app() -> (App, FakeOutput) {
        let output = FakeOutput::new();
        let session = Session::new(
            Box::new(output.clone()),
            Box::new(FakeInput::new()),
            Box::new(ScriptedEstimator::new(vec![])),
            &TrainerConfig::default(),
            StdRng::seed_from_u64(1),
        );
        (App::new(session), output)
    }

    #[test]
    fn test_guess_navigation_wraps() {
        let (mut app, _) = app();
        assert_eq!(app.guess(), None);

        app.next_guess();
        assert_eq!(app.guess().map(|i| i.semitones), Some(1));

        app.prev_guess();
        assert_eq!(app.guess().map(|i| i.semitones), Some(12));

        app.next_guess();
        assert_eq!(app.guess().map(|i| i.semitones), Some(1));

        app.select_semitones(7);
        assert_eq!(app.guess().map(|i| i.name), Some("Perfect 5th"));
    }

    #[test]
    fn test_play_clears_selection() {
        let (mut app, output) = app();
        app.select_semitones(3);

        app.play(Instant::now());
        assert_eq!(app.selected_guess, None);
        assert_eq!(output.scheduled().len(), 2);
    }

    #[test]
    fn test_production_buttons_are_gated() {
        let (mut app, output) = app();
        app.toggle_mode();

        // Replay hidden until notes are captured
        app.play(Instant::now());
        assert!(output.scheduled().is_empty());

        app.start_listening();
        assert!(app.session.is_listening());

        app.quit();
        assert!(app.should_quit);
        assert!(!app.session.is_listening());
    }
}
