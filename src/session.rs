//! Puzzle session state machine.
//!
//! One session walks a single visitor through a strictly linear phase
//! chain, gating each transition on wall-clock time or a validated
//! answer:
//!
//! ```text
//! Intro --(riddle answer matches)--> Countdown
//! Countdown --(clock reaches target)--> WordPuzzle
//! Countdown --(user backs out)--> Intro
//! WordPuzzle --(all four targets solved)--> ThemeQuestion
//! WordPuzzle --(attempts exhausted)--> Failed      [terminal]
//! ThemeQuestion --(answer accepted)--> Reveal      [terminal]
//! ```
//!
//! Nothing is persisted; dropping the session discards all state.

use std::mem;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::answers::{self, GuessError};
use crate::config::{AppConfig, ConfigError};
use crate::countdown::{self, TimeLeft};
use crate::feedback::{CellVerdict, FeedbackRow, TARGET_COUNT};
use crate::wordbank::WordBank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Countdown,
    WordPuzzle,
    ThemeQuestion,
    Reveal,
    Failed,
}

/// One accepted guess and its scoring, immutable once appended.
#[derive(Debug, Clone)]
pub struct GuessHistoryEntry {
    pub guess: String,
    pub feedback: FeedbackRow,
}

pub struct PuzzleSession {
    config: Arc<AppConfig>,
    wordbank: Arc<WordBank>,
    phase: Phase,
    history: Vec<GuessHistoryEntry>,
    attempts_remaining: u32,
    notification_pending: bool,
}

impl PuzzleSession {
    /// Start a fresh session in `Intro`. Fails only when the target word
    /// set is unusable, so a broken configuration surfaces before the
    /// visitor reaches the word puzzle.
    pub fn new(config: Arc<AppConfig>, wordbank: Arc<WordBank>) -> Result<Self, ConfigError> {
        config.require_target_words()?;
        let attempts_remaining = config.max_attempts;
        Ok(Self {
            config,
            wordbank,
            phase: Phase::Intro,
            history: Vec::new(),
            attempts_remaining,
            notification_pending: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &[GuessHistoryEntry] {
        &self.history
    }

    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// Submit the intro riddle answer. A match advances to `Countdown`.
    pub fn submit_riddle(&mut self, answer: &str) -> Result<bool, ConfigError> {
        if self.phase != Phase::Intro {
            return Ok(false);
        }
        let correct = answers::check_riddle(&self.config, answer)?;
        if correct {
            self.phase = Phase::Countdown;
        }
        Ok(correct)
    }

    /// The explicit back edge: leave the countdown for the intro screen.
    pub fn back_to_intro(&mut self) -> bool {
        if self.phase == Phase::Countdown {
            self.phase = Phase::Intro;
            true
        } else {
            false
        }
    }

    /// Recompute the countdown at `now`. While in `Countdown`, an open
    /// gate advances the session to `WordPuzzle`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TimeLeft {
        let remaining = countdown::time_left(now, self.config.target_date);
        if self.phase == Phase::Countdown && remaining.is_open() {
            self.phase = Phase::WordPuzzle;
        }
        remaining
    }

    /// Submit a word-puzzle guess.
    ///
    /// Rejections leave the session untouched; only an accepted guess is
    /// recorded and charged against the attempt budget. Solving all four
    /// boards advances to `ThemeQuestion`; exhausting the budget first is
    /// terminal failure.
    pub fn submit_guess(&mut self, guess: &str) -> Result<FeedbackRow, GuessError> {
        if self.phase != Phase::WordPuzzle {
            return Err(GuessError::WrongPhase);
        }
        if self.attempts_remaining == 0 {
            return Err(GuessError::OutOfAttempts);
        }
        let previous: Vec<String> = self.history.iter().map(|e| e.guess.clone()).collect();
        let feedback = answers::check_guess(&self.config, &self.wordbank, guess, &previous)?;
        self.history.push(GuessHistoryEntry {
            guess: guess.trim().to_lowercase(),
            feedback,
        });
        self.attempts_remaining -= 1;
        if self.all_solved() {
            self.phase = Phase::ThemeQuestion;
        } else if self.attempts_remaining == 0 {
            self.phase = Phase::Failed;
        }
        Ok(feedback)
    }

    /// Per-board solved flags. A board counts as solved when any history
    /// row scored all five positions `Correct` for it; the four boards
    /// may be solved across different rows.
    pub fn solved(&self) -> [bool; TARGET_COUNT] {
        let mut solved = [false; TARGET_COUNT];
        for entry in &self.history {
            for (board, verdicts) in entry.feedback.iter().enumerate() {
                if verdicts.iter().all(|v| *v == CellVerdict::Correct) {
                    solved[board] = true;
                }
            }
        }
        solved
    }

    pub fn all_solved(&self) -> bool {
        self.solved().into_iter().all(|s| s)
    }

    /// Submit the theme answer. A match is the final transition, to
    /// `Reveal`, and queues the one-shot solved notification; a mismatch
    /// changes nothing and the visitor may retry.
    pub fn submit_theme(&mut self, answer: &str) -> bool {
        if self.phase != Phase::ThemeQuestion {
            return false;
        }
        let correct = answers::check_theme(&self.config, answer);
        if correct {
            self.phase = Phase::Reveal;
            self.notification_pending = true;
        }
        correct
    }

    /// One-shot: true exactly once after the session reaches `Reveal`.
    /// The caller dispatches the notification fire-and-forget; its
    /// outcome never feeds back into the session.
    pub fn take_notification(&mut self) -> bool {
        mem::take(&mut self.notification_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FROM_ADDRESS;
    use chrono::TimeZone;

    fn config_with_targets(targets: [&str; 4]) -> AppConfig {
        AppConfig {
            riddle_answer: Some("the moon".to_string()),
            target_words: Some(targets.map(String::from)),
            theme_accepted: vec!["bee".to_string(), "bees".to_string()],
            target_date: Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap(),
            max_attempts: 9,
            resend_api_key: None,
            resend_from: DEFAULT_FROM_ADDRESS.to_string(),
            success_recipients: vec![],
            daily_recipients: vec![],
            cron_secret: None,
        }
    }

    fn session_with(config: AppConfig, dictionary: &str) -> PuzzleSession {
        PuzzleSession::new(
            Arc::new(config),
            Arc::new(WordBank::from_str_data(dictionary)),
        )
        .unwrap()
    }

    fn standard_session() -> PuzzleSession {
        session_with(
            config_with_targets(["apple", "grape", "mango", "peach"]),
            "apple\ngrape\nmango\npeach\ncrane\nslate\nstare\nraise\nbrain\ntrain\ngrain\nstain\nplace",
        )
    }

    fn advance_to_word_puzzle(session: &mut PuzzleSession) {
        session.submit_riddle("the moon").unwrap();
        let after_target = Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 1).unwrap();
        session.tick(after_target);
        assert_eq!(session.phase(), Phase::WordPuzzle);
    }

    #[test]
    fn test_initial_phase_is_intro() {
        let session = standard_session();
        assert_eq!(session.phase(), Phase::Intro);
        assert!(session.history().is_empty());
        assert_eq!(session.attempts_remaining(), 9);
    }

    #[test]
    fn test_new_fails_without_targets() {
        let mut config = config_with_targets(["apple", "grape", "mango", "peach"]);
        config.target_words = None;
        let result = PuzzleSession::new(
            Arc::new(config),
            Arc::new(WordBank::from_str_data("apple")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_riddle_stays_in_intro() {
        let mut session = standard_session();
        assert_eq!(session.submit_riddle("the sun"), Ok(false));
        assert_eq!(session.phase(), Phase::Intro);
    }

    #[test]
    fn test_correct_riddle_advances_to_countdown() {
        let mut session = standard_session();
        assert_eq!(session.submit_riddle(" The  Moon "), Ok(true));
        assert_eq!(session.phase(), Phase::Countdown);
    }

    #[test]
    fn test_back_edge_from_countdown() {
        let mut session = standard_session();
        session.submit_riddle("the moon").unwrap();
        assert!(session.back_to_intro());
        assert_eq!(session.phase(), Phase::Intro);
        // back edge only exists on the countdown screen
        assert!(!session.back_to_intro());
    }

    #[test]
    fn test_tick_holds_countdown_before_target() {
        let mut session = standard_session();
        session.submit_riddle("the moon").unwrap();
        let before = Utc.with_ymd_and_hms(2026, 2, 13, 23, 59, 59).unwrap();
        let left = session.tick(before);
        assert_eq!(session.phase(), Phase::Countdown);
        assert_eq!(left.seconds, 1);
    }

    #[test]
    fn test_tick_opens_gate_at_target() {
        let mut session = standard_session();
        session.submit_riddle("the moon").unwrap();
        let at_target = Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap();
        let left = session.tick(at_target);
        assert!(left.is_open());
        assert_eq!(session.phase(), Phase::WordPuzzle);
    }

    #[test]
    fn test_tick_outside_countdown_does_not_transition() {
        let mut session = standard_session();
        let after = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        session.tick(after);
        assert_eq!(session.phase(), Phase::Intro);
    }

    #[test]
    fn test_guess_rejected_outside_word_puzzle() {
        let mut session = standard_session();
        assert_eq!(session.submit_guess("crane"), Err(GuessError::WrongPhase));
    }

    #[test]
    fn test_accepted_guess_recorded_and_charged() {
        let mut session = standard_session();
        advance_to_word_puzzle(&mut session);
        session.submit_guess("crane").unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].guess, "crane");
        assert_eq!(session.attempts_remaining(), 8);
    }

    #[test]
    fn test_rejected_guess_consumes_nothing() {
        let mut session = standard_session();
        advance_to_word_puzzle(&mut session);
        assert_eq!(session.submit_guess("zzzzz"), Err(GuessError::NotAWord));
        assert_eq!(session.submit_guess("app"), Err(GuessError::WrongLength));
        assert!(session.history().is_empty());
        assert_eq!(session.attempts_remaining(), 9);
    }

    #[test]
    fn test_duplicate_guess_rejected_case_insensitive() {
        let mut session = standard_session();
        advance_to_word_puzzle(&mut session);
        session.submit_guess("crane").unwrap();
        assert_eq!(
            session.submit_guess("CRANE"),
            Err(GuessError::AlreadyGuessed)
        );
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_solving_all_four_advances_to_theme() {
        let mut session = standard_session();
        advance_to_word_puzzle(&mut session);
        for word in ["apple", "grape", "mango", "peach"] {
            session.submit_guess(word).unwrap();
        }
        // each board was solved in a different row
        assert_eq!(session.solved(), [true; 4]);
        assert_eq!(session.phase(), Phase::ThemeQuestion);
        assert_eq!(session.attempts_remaining(), 5);
    }

    #[test]
    fn test_single_target_test_mode_solves_in_one_guess() {
        let mut session = session_with(
            config_with_targets(["apple", "apple", "apple", "apple"]),
            "apple\ncrane",
        );
        advance_to_word_puzzle(&mut session);
        session.submit_guess("apple").unwrap();
        assert_eq!(session.phase(), Phase::ThemeQuestion);
    }

    #[test]
    fn test_attempt_budget_exhaustion_fails_session() {
        let mut config = config_with_targets(["apple", "grape", "mango", "peach"]);
        config.max_attempts = 3;
        let mut session = session_with(
            config,
            "apple\ngrape\nmango\npeach\ncrane\nslate\nstare\nraise",
        );
        advance_to_word_puzzle(&mut session);
        for word in ["crane", "slate", "stare"] {
            session.submit_guess(word).unwrap();
        }
        assert_eq!(session.phase(), Phase::Failed);
        assert_eq!(session.attempts_remaining(), 0);
        // a further submission is rejected, not scored
        assert_eq!(session.submit_guess("raise"), Err(GuessError::WrongPhase));
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn test_solving_on_final_attempt_wins() {
        let mut config = config_with_targets(["apple", "apple", "apple", "apple"]);
        config.max_attempts = 2;
        let mut session = session_with(config, "apple\ncrane");
        advance_to_word_puzzle(&mut session);
        session.submit_guess("crane").unwrap();
        session.submit_guess("apple").unwrap();
        assert_eq!(session.phase(), Phase::ThemeQuestion);
    }

    #[test]
    fn test_theme_retry_then_reveal() {
        let mut session = session_with(
            config_with_targets(["apple", "apple", "apple", "apple"]),
            "apple",
        );
        advance_to_word_puzzle(&mut session);
        session.submit_guess("apple").unwrap();
        assert!(!session.submit_theme("wasp"));
        assert_eq!(session.phase(), Phase::ThemeQuestion);
        assert!(!session.submit_theme("Bees!"));
        assert_eq!(session.phase(), Phase::ThemeQuestion);
        assert!(session.submit_theme(" Bee "));
        assert_eq!(session.phase(), Phase::Reveal);
    }

    #[test]
    fn test_notification_fires_exactly_once() {
        let mut session = session_with(
            config_with_targets(["apple", "apple", "apple", "apple"]),
            "apple",
        );
        assert!(!session.take_notification());
        advance_to_word_puzzle(&mut session);
        session.submit_guess("apple").unwrap();
        session.submit_theme("bee");
        assert!(session.take_notification());
        assert!(!session.take_notification());
    }

    #[test]
    fn test_theme_ignored_outside_theme_phase() {
        let mut session = standard_session();
        assert!(!session.submit_theme("bee"));
        assert_eq!(session.phase(), Phase::Intro);
    }
}
