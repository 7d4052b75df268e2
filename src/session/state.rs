use rand::{Rng, rngs::StdRng};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::feedback::Feedback;
use crate::audio::output::{AudioError, OutputContext};
use crate::audio::synth::{PlaybackStyle, Synthesizer};
use crate::config::TrainerConfig;
use crate::pitch::estimator::PitchEstimator;
use crate::pitch::input::{InputSource, TrackerError};
use crate::pitch::notes::NoteSequence;
use crate::pitch::tracker::{PitchTracker, TrackerState};
use crate::types::interval::{Interval, name_for, random_interval};
use crate::types::note::{NearestNote, nearest_note};
use crate::types::pitch::semitone_distance;

/// Which exercise is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The trainer plays an interval, the user names it
    Recognition,
    /// The user sings or plays an interval into the microphone
    Production,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Recognition => "Recognition",
            Mode::Production => "Production",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Mode::Recognition => Mode::Production,
            Mode::Production => Mode::Recognition,
        }
    }
}

/// Outcome of grading a produced interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionVerdict {
    pub correct: bool,
    /// Rounded semitone distance between the two captured notes
    pub played_semitones: i32,
    /// Catalog name, or the fallback label when out of range
    pub played_name: &'static str,
}

/// Production buttons the UI should offer right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub stop: bool,
    pub reset: bool,
    pub replay: bool,
}

/// Trainer session: owns the synthesizer, the pitch tracker and all
/// challenge state. Driven from a single thread through `tick`.
pub struct Session {
    mode: Mode,
    synth: Synthesizer,
    tracker: PitchTracker,
    rng: StdRng,
    tolerance_cents: f32,

    // Production
    target: Option<Interval>,
    notes: NoteSequence,
    live_pitch: Option<f32>,
    verdict: Option<ProductionVerdict>,

    // Recognition
    last_played: Option<Interval>,
    busy_until: Option<Instant>,

    feedback: Option<Feedback>,
}

impl Session {
    pub fn new(
        output: Box<dyn OutputContext>,
        input: Box<dyn InputSource>,
        estimator: Box<dyn PitchEstimator>,
        config: &TrainerConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            mode: Mode::Recognition,
            synth: Synthesizer::new(output, config.playback.clone()),
            tracker: PitchTracker::new(input, estimator, &config.detection),
            rng,
            tolerance_cents: config.detection.tolerance_cents,
            target: None,
            notes: NoteSequence::new(),
            live_pitch: None,
            verdict: None,
            last_played: None,
            busy_until: None,
            feedback: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn target(&self) -> Option<Interval> {
        self.target
    }

    pub fn notes(&self) -> &NoteSequence {
        &self.notes
    }

    pub fn live_pitch(&self) -> Option<f32> {
        self.live_pitch
    }

    /// Nearest equal-tempered note to the live pitch
    pub fn live_note(&self) -> Option<NearestNote> {
        self.live_pitch
            .and_then(|pitch| nearest_note(pitch, self.tolerance_cents))
    }

    pub fn verdict(&self) -> Option<ProductionVerdict> {
        self.verdict
    }

    pub fn feedback(&self) -> Option<&Feedback> {
        self.feedback.as_ref()
    }

    pub fn tracker_state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn is_listening(&self) -> bool {
        self.tracker.is_listening()
    }

    /// A recognition playback is still sounding
    pub fn is_busy(&self, now: Instant) -> bool {
        self.busy_until.is_some_and(|until| now < until)
    }

    /// Switch between recognition and production
    /// Detection is always torn down first; entering production deals a new challenge
    pub fn toggle_mode(&mut self) {
        self.tracker.stop();
        self.reset_production();

        self.mode = self.mode.toggled();
        info!(mode = self.mode.name(), "mode switched");

        if self.mode == Mode::Production {
            self.start_new_challenge();
        }
        self.feedback = None;
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            self.toggle_mode();
        }
    }

    /// Stop detection and forget the current challenge and captured notes
    pub fn reset_production(&mut self) {
        self.tracker.stop();
        self.notes.clear();
        self.target = None;
        self.live_pitch = None;
        self.verdict = None;
        self.feedback = None;
    }

    /// Reset, then pick and announce a new target interval
    pub fn start_new_challenge(&mut self) -> Interval {
        self.reset_production();

        let target = random_interval(&mut self.rng);
        self.target = Some(target);
        self.feedback = Some(Feedback::info(format!("Play a {} (melodically).", target.name)));
        info!(interval = target.name, semitones = target.semitones, "new production challenge");
        target
    }

    /// Open the microphone and start collecting notes
    pub fn start_listening(&mut self) -> Result<(), TrackerError> {
        if self.mode != Mode::Production || self.is_listening() {
            return Ok(());
        }

        // A finished or missing challenge is replaced before listening again
        if self.target.is_none() || self.notes.is_complete() {
            self.start_new_challenge();
        }

        match self.tracker.start() {
            Ok(()) => {
                self.live_pitch = None;
                self.feedback = Some(Feedback::info("Listening for your notes..."));
                Ok(())
            }
            Err(e) => {
                self.live_pitch = None;
                self.feedback = Some(Feedback::wrong(format!(
                    "Error during microphone setup ({}). Please ensure access and try again.",
                    e
                )));
                Err(e)
            }
        }
    }

    /// Release the microphone; keeps captured notes
    pub fn stop_listening(&mut self) {
        if self.is_listening() {
            self.tracker.stop();
            self.feedback = Some(Feedback::info("Microphone stopped."));
        } else {
            self.tracker.stop();
        }
    }

    /// One iteration of the UI loop
    pub fn tick(&mut self, now: Instant) {
        if self.feedback.as_ref().is_some_and(|f| f.is_expired(now)) {
            self.feedback = None;
        }
        if self.busy_until.is_some_and(|until| now >= until) {
            self.busy_until = None;
        }

        if !self.tracker.is_listening() {
            return;
        }

        let outcome = self.tracker.poll(&mut self.notes);
        if outcome.onset.is_some() {
            self.live_pitch = outcome.pitch;
        }
        if outcome.completed {
            self.evaluate();
        }
    }

    /// Grade the two captured notes against the target
    pub fn evaluate(&mut self) -> Option<ProductionVerdict> {
        let Some((first, second)) = self.notes.pair() else {
            self.feedback = Some(Feedback::wrong(
                "Please play two distinct notes for the interval.",
            ));
            return None;
        };
        let Some(target) = self.target else {
            self.feedback = Some(Feedback::wrong("Start a new challenge first."));
            return None;
        };

        let distance = semitone_distance(first, second);
        let played_semitones = distance.round() as i32;
        let played_name = name_for(played_semitones);
        let correct = played_semitones == target.semitones as i32;

        info!(
            first,
            second,
            distance,
            played = played_semitones,
            expected = target.semitones,
            correct,
            "production evaluated"
        );

        self.feedback = Some(if correct {
            Feedback::correct(format!("CORRECT! You played a {}.", target.name))
        } else if Interval::from_semitones(played_semitones).is_some() {
            Feedback::wrong(format!(
                "WRONG. You played {}. The challenge was a {}.",
                played_name, target.name
            ))
        } else {
            Feedback::wrong(format!(
                "WRONG. You played an unknown interval ({} semitones). The challenge was a {}.",
                played_semitones, target.name
            ))
        });

        let verdict = ProductionVerdict {
            correct,
            played_semitones,
            played_name,
        };
        self.verdict = Some(verdict);
        Some(verdict)
    }

    /// Play back the user's two notes, melodically and in order
    pub fn replay(&mut self, now: Instant) {
        let Some((first, second)) = self.notes.pair() else {
            self.feedback = Some(Feedback::wrong("No interval was played by you to play back."));
            return;
        };

        match self.synth.play_melodic(first, second) {
            Ok(length) => {
                self.feedback = Some(
                    Feedback::info("Playing back your interval...")
                        .until(now + Duration::from_secs_f64(length)),
                );
            }
            Err(e) => self.report_audio_error(e),
        }
    }

    /// Play a random interval from the root, harmonic or melodic at random
    /// Ignored while the previous playback is still sounding
    pub fn play_interval(&mut self, now: Instant) -> Option<Interval> {
        if self.is_busy(now) {
            debug!("playback still sounding, ignoring play request");
            return None;
        }

        self.feedback = None;
        let interval = random_interval(&mut self.rng);
        let style = if self.rng.gen_bool(0.5) {
            PlaybackStyle::Harmonic
        } else {
            PlaybackStyle::Melodic
        };

        match self.synth.play_interval(interval.semitones as i32, style) {
            Ok(length) => {
                info!(style = style.name(), "playing interval");
                debug!(interval = interval.name, semitones = interval.semitones, "recognition answer");
                self.last_played = Some(interval);
                self.busy_until = Some(now + Duration::from_secs_f64(length));
                Some(interval)
            }
            Err(e) => {
                self.report_audio_error(e);
                None
            }
        }
    }

    /// Grade a recognition guess against the last interval played
    pub fn submit_guess(&mut self, guess: Option<u8>) -> Option<bool> {
        let Some(guess) = guess else {
            self.feedback = Some(Feedback::wrong("Please select an interval from the list."));
            return None;
        };
        let Some(played) = self.last_played else {
            self.feedback = Some(Feedback::info("Press play to hear an interval first."));
            return None;
        };

        let correct = guess == played.semitones;
        info!(guess, answer = played.semitones, correct, "recognition guess");

        self.feedback = Some(if correct {
            Feedback::correct(format!("CORRECT! That was a {}.", played.name))
        } else {
            Feedback::wrong(format!(
                "WRONG. That was a {} ({} semitones). Try again!",
                played.name, played.semitones
            ))
        });
        Some(correct)
    }

    pub fn controls(&self) -> Controls {
        let listening = self.is_listening();
        let captured = !self.notes.is_empty();
        Controls {
            start: !listening,
            stop: listening,
            reset: listening || captured,
            replay: !listening && captured,
        }
    }

    fn report_audio_error(&mut self, error: AudioError) {
        warn!("audio playback failed: {}", error);
        self.feedback = Some(Feedback::wrong(format!("Audio output error: {}", error)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::pitch::estimator::PitchEstimate;
    use crate::session::feedback::FeedbackKind;
    use crate::testing::{FakeInput, FakeOutput, ScriptedEstimator};
    use rand::SeedableRng;

    const WINDOW: usize = 256;

    struct Rig {
        session: Session,
        output: FakeOutput,
        input: FakeInput,
        estimator: ScriptedEstimator,
    }

    fn rig_with(input: FakeInput) -> Rig {
        let output = FakeOutput::new();
        let estimator = ScriptedEstimator::new(vec![]);
        let config = TrainerConfig {
            detection: DetectionConfig {
                window_size: WINDOW,
                ..DetectionConfig::default()
            },
            ..TrainerConfig::default()
        };
        let session = Session::new(
            Box::new(output.clone()),
            Box::new(input.clone()),
            Box::new(estimator.clone()),
            &config,
            StdRng::seed_from_u64(7),
        );
        Rig {
            session,
            output,
            input,
            estimator,
        }
    }

    fn rig() -> Rig {
        rig_with(FakeInput::new())
    }

    fn feedback_text(session: &Session) -> &str {
        session.feedback().map(|f| f.text.as_str()).unwrap_or("")
    }

    /// Listen and feed the estimator two notes, one per tick
    fn sing(rig: &mut Rig, target: u8, first: f32, second: f32, now: Instant) {
        rig.session.set_mode(Mode::Production);
        rig.session.start_listening().unwrap();
        rig.session.target = Interval::from_semitones(target as i32);

        rig.estimator.push(PitchEstimate::new(first, 0.99));
        rig.estimator.push(PitchEstimate::new(second, 0.99));
        rig.input.push(vec![0.1; WINDOW]);

        rig.session.tick(now);
        rig.session.tick(now);
    }

    #[test]
    fn test_starts_in_recognition() {
        let rig = rig();
        assert_eq!(rig.session.mode(), Mode::Recognition);
        assert_eq!(rig.session.target(), None);
        assert_eq!(rig.session.tracker_state(), TrackerState::Idle);
    }

    #[test]
    fn test_new_challenge_announces_target() {
        let mut rig = rig();
        let target = rig.session.start_new_challenge();

        assert_eq!(rig.session.target(), Some(target));
        assert!((1..=12).contains(&target.semitones));
        assert_eq!(
            feedback_text(&rig.session),
            format!("Play a {} (melodically).", target.name)
        );
    }

    #[test]
    fn test_perfect_fifth_is_correct() {
        let mut rig = rig();
        let now = Instant::now();
        sing(&mut rig, 7, 261.63, 392.00, now);

        let verdict = rig.session.verdict().unwrap();
        assert!(verdict.correct);
        assert_eq!(verdict.played_name, "Perfect 5th");
        assert_eq!(feedback_text(&rig.session), "CORRECT! You played a Perfect 5th.");
        assert_eq!(rig.session.feedback().unwrap().kind, FeedbackKind::Correct);

        // Tracker stopped before evaluation
        assert_eq!(rig.session.tracker_state(), TrackerState::Stopped);
        assert_eq!(rig.input.open_handles(), 0);
    }

    #[test]
    fn test_minor_seventh_against_fifth_is_wrong() {
        let mut rig = rig();
        sing(&mut rig, 7, 261.63, 466.16, Instant::now());

        let verdict = rig.session.verdict().unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.played_semitones, 10);
        assert_eq!(verdict.played_name, "Minor 7th");
        assert_eq!(
            feedback_text(&rig.session),
            "WRONG. You played Minor 7th. The challenge was a Perfect 5th."
        );
    }

    #[test]
    fn test_out_of_range_interval_is_unknown() {
        let mut rig = rig();
        // Two octaves apart
        sing(&mut rig, 12, 110.0, 440.0, Instant::now());

        let verdict = rig.session.verdict().unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.played_semitones, 24);
        assert_eq!(verdict.played_name, "Unknown interval");
    }

    #[test]
    fn test_evaluate_needs_two_notes() {
        let mut rig = rig();
        rig.session.start_new_challenge();

        assert_eq!(rig.session.evaluate(), None);
        assert_eq!(
            feedback_text(&rig.session),
            "Please play two distinct notes for the interval."
        );
    }

    #[test]
    fn test_live_pitch_and_nearest_note() {
        let mut rig = rig();
        rig.session.set_mode(Mode::Production);
        rig.session.start_listening().unwrap();

        rig.estimator.push(PitchEstimate::new(440.0, 0.99));
        rig.estimator.push(PitchEstimate::new(45.0, 0.99));
        rig.input.push(vec![0.1; WINDOW]);

        rig.session.tick(Instant::now());
        assert_eq!(rig.session.live_pitch(), Some(440.0));
        let note = rig.session.live_note().unwrap();
        assert_eq!(note.name, "A4");
        assert!(note.in_tune);

        rig.session.tick(Instant::now());
        assert_eq!(rig.session.live_pitch(), None);
        assert_eq!(rig.session.notes().len(), 1);
    }

    #[test]
    fn test_replay_plays_user_notes_melodically() {
        let mut rig = rig();
        let now = Instant::now();
        sing(&mut rig, 7, 261.63, 392.00, now);
        rig.output.set_time(10.0);

        rig.session.replay(now);
        let notes = rig.output.scheduled();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].frequency, 261.63);
        assert_eq!(notes[1].frequency, 392.00);
        assert_eq!(notes[0].start_time, 10.0);
        assert!((notes[1].start_time - 10.9).abs() < 1e-9);
        assert_eq!(feedback_text(&rig.session), "Playing back your interval...");

        rig.session.tick(now + Duration::from_secs(2));
        assert!(rig.session.feedback().is_none());
    }

    #[test]
    fn test_replay_without_notes() {
        let mut rig = rig();
        rig.session.replay(Instant::now());

        assert!(rig.output.scheduled().is_empty());
        assert_eq!(
            feedback_text(&rig.session),
            "No interval was played by you to play back."
        );
    }

    #[test]
    fn test_microphone_failure_keeps_session_usable() {
        let mut rig = rig_with(FakeInput::failing());
        rig.session.set_mode(Mode::Production);

        let result = rig.session.start_listening();
        assert!(matches!(result, Err(TrackerError::MicrophoneUnavailable(_))));
        assert_eq!(rig.session.tracker_state(), TrackerState::Stopped);
        assert_eq!(rig.input.open_handles(), 0);
        assert_eq!(rig.session.feedback().unwrap().kind, FeedbackKind::Wrong);

        rig.session.set_mode(Mode::Recognition);
        assert!(rig.session.play_interval(Instant::now()).is_some());
    }

    #[test]
    fn test_mode_switch_stops_tracker_and_clears_notes() {
        let mut rig = rig();
        rig.session.set_mode(Mode::Production);
        rig.session.start_listening().unwrap();

        rig.estimator.push(PitchEstimate::new(261.63, 0.99));
        rig.input.push(vec![0.1; WINDOW]);
        rig.session.tick(Instant::now());
        assert_eq!(rig.session.notes().len(), 1);

        rig.session.toggle_mode();
        assert_eq!(rig.session.mode(), Mode::Recognition);
        assert_eq!(rig.session.tracker_state(), TrackerState::Stopped);
        assert_eq!(rig.input.open_handles(), 0);
        assert!(rig.session.notes().is_empty());
        assert_eq!(rig.session.target(), None);
        assert!(rig.session.feedback().is_none());
    }

    #[test]
    fn test_entering_production_deals_challenge() {
        let mut rig = rig();
        rig.session.toggle_mode();

        assert_eq!(rig.session.mode(), Mode::Production);
        assert!(rig.session.target().is_some());
        assert!(rig.session.feedback().is_none());
    }

    #[test]
    fn test_double_stop() {
        let mut rig = rig();
        rig.session.set_mode(Mode::Production);
        rig.session.start_listening().unwrap();

        rig.session.stop_listening();
        assert_eq!(feedback_text(&rig.session), "Microphone stopped.");
        let state = rig.session.tracker_state();

        rig.session.stop_listening();
        assert_eq!(rig.session.tracker_state(), state);
        assert_eq!(rig.input.open_handles(), 0);
    }

    #[test]
    fn test_controls_follow_tracker_and_notes() {
        let mut rig = rig();
        rig.session.set_mode(Mode::Production);
        assert_eq!(
            rig.session.controls(),
            Controls { start: true, stop: false, reset: false, replay: false }
        );

        rig.session.start_listening().unwrap();
        assert_eq!(
            rig.session.controls(),
            Controls { start: false, stop: true, reset: true, replay: false }
        );

        rig.estimator.push(PitchEstimate::new(261.63, 0.99));
        rig.input.push(vec![0.1; WINDOW]);
        rig.session.tick(Instant::now());
        rig.session.stop_listening();
        assert_eq!(
            rig.session.controls(),
            Controls { start: true, stop: false, reset: true, replay: true }
        );
    }

    #[test]
    fn test_listening_again_after_verdict_deals_new_challenge() {
        let mut rig = rig();
        sing(&mut rig, 7, 261.63, 392.00, Instant::now());
        assert!(rig.session.notes().is_complete());

        rig.session.start_listening().unwrap();
        assert!(rig.session.notes().is_empty());
        assert!(rig.session.is_listening());
        assert_eq!(rig.input.open_count(), 2);
    }

    #[test]
    fn test_play_interval_blocks_until_finished() {
        let mut rig = rig();
        let now = Instant::now();

        let interval = rig.session.play_interval(now).unwrap();
        let notes = rig.output.scheduled();
        assert_eq!(notes.len(), 2);
        assert!((notes[0].frequency - 261.63).abs() < 0.01);
        assert!(rig.session.is_busy(now));

        assert!(rig.session.play_interval(now + Duration::from_millis(500)).is_none());
        assert_eq!(rig.output.scheduled().len(), 2);

        let later = now + Duration::from_millis(1900);
        rig.session.tick(later);
        assert!(!rig.session.is_busy(later));
        assert!(rig.session.play_interval(later).is_some());

        assert!(rig.session.submit_guess(Some(interval.semitones)).is_some());
    }

    #[test]
    fn test_play_interval_mixes_harmonic_and_melodic() {
        let mut rig = rig();
        let start = Instant::now();
        let (mut harmonic, mut melodic) = (0, 0);

        for i in 0..40 {
            let now = start + Duration::from_secs(3 * i);
            let before = rig.output.scheduled().len();
            assert!(rig.session.play_interval(now).is_some());

            let notes = rig.output.scheduled();
            assert_eq!(notes.len(), before + 2);
            let (first, second) = (&notes[before], &notes[before + 1]);
            if first.start_time == second.start_time {
                assert!((first.duration - 1.6).abs() < 1e-9);
                harmonic += 1;
            } else {
                assert!((second.start_time - first.start_time - 0.9).abs() < 1e-9);
                melodic += 1;
            }
        }

        assert!(harmonic > 0, "never played harmonically");
        assert!(melodic > 0, "never played melodically");
    }

    #[test]
    fn test_submit_guess() {
        let mut rig = rig();
        let interval = rig.session.play_interval(Instant::now()).unwrap();

        assert_eq!(rig.session.submit_guess(Some(interval.semitones)), Some(true));
        assert_eq!(
            feedback_text(&rig.session),
            format!("CORRECT! That was a {}.", interval.name)
        );

        let wrong = interval.semitones % 12 + 1;
        assert_eq!(rig.session.submit_guess(Some(wrong)), Some(false));
        assert_eq!(
            feedback_text(&rig.session),
            format!(
                "WRONG. That was a {} ({} semitones). Try again!",
                interval.name, interval.semitones
            )
        );
    }

    #[test]
    fn test_submit_without_selection_or_playback() {
        let mut rig = rig();

        assert_eq!(rig.session.submit_guess(Some(7)), None);
        assert_eq!(feedback_text(&rig.session), "Press play to hear an interval first.");

        rig.session.play_interval(Instant::now());
        assert_eq!(rig.session.submit_guess(None), None);
        assert_eq!(
            feedback_text(&rig.session),
            "Please select an interval from the list."
        );
    }

    #[test]
    fn test_audio_failure_is_reported() {
        let mut rig = rig();
        rig.output.fail_resume();

        assert!(rig.session.play_interval(Instant::now()).is_none());
        assert_eq!(rig.session.feedback().unwrap().kind, FeedbackKind::Wrong);
        assert!(!rig.session.is_busy(Instant::now()));
    }
}
