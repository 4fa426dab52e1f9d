use thiserror::Error;

use crate::config::{AppConfig, ConfigError};
use crate::feedback::{self, FeedbackRow, WORD_LENGTH};
use crate::wordbank::WordBank;

/// Why a submitted guess was rejected. Rejections never consume an
/// attempt and never change session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Guess must be 5 letters")]
    WrongLength,
    #[error("You already guessed that word")]
    AlreadyGuessed,
    #[error("Not a valid word")]
    NotAWord,
    #[error("No attempts remaining")]
    OutOfAttempts,
    #[error("Guessing is not open right now")]
    WrongPhase,
}

/// Riddle answers ignore case and all whitespace, internal included.
pub fn normalize_riddle(answer: &str) -> String {
    answer.to_lowercase().split_whitespace().collect()
}

/// Theme answers are trimmed and lowercased only; punctuation is kept,
/// so "Bees!" does not match "bees".
pub fn normalize_theme(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Compare a riddle answer against the configured expected value.
/// Equality after normalization is the sole success criterion.
pub fn check_riddle(config: &AppConfig, answer: &str) -> Result<bool, ConfigError> {
    let expected = config
        .riddle_answer
        .as_deref()
        .map(normalize_riddle)
        .filter(|e| !e.is_empty())
        .ok_or(ConfigError::RiddleAnswerUnset)?;
    Ok(normalize_riddle(answer) == expected)
}

/// Membership test against the accepted theme-answer set.
pub fn check_theme(config: &AppConfig, answer: &str) -> bool {
    let normalized = normalize_theme(answer);
    config.theme_accepted.iter().any(|a| *a == normalized)
}

/// Validate a guess against the target set and score it.
///
/// `previous` is the caller's guess history; duplicate detection is
/// case-insensitive. Stateless: the caller owns attempt accounting.
pub fn check_guess(
    config: &AppConfig,
    wordbank: &WordBank,
    guess: &str,
    previous: &[String],
) -> Result<FeedbackRow, GuessError> {
    let targets = config.require_target_words()?;
    let normalized = guess.trim().to_lowercase();
    if normalized.chars().count() != WORD_LENGTH {
        return Err(GuessError::WrongLength);
    }
    if previous
        .iter()
        .any(|p| p.trim().to_lowercase() == normalized)
    {
        return Err(GuessError::AlreadyGuessed);
    }
    if !wordbank.contains(&normalized) && !targets.contains(&normalized) {
        return Err(GuessError::NotAWord);
    }
    Ok(feedback::score_all(&normalized, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FROM_ADDRESS;
    use chrono::Utc;

    fn config() -> AppConfig {
        AppConfig {
            riddle_answer: Some("The Man in the Moon".to_string()),
            target_words: Some([
                "apple".to_string(),
                "grape".to_string(),
                "mango".to_string(),
                "peach".to_string(),
            ]),
            theme_accepted: vec!["bee".to_string(), "bees".to_string()],
            target_date: Utc::now(),
            max_attempts: 9,
            resend_api_key: None,
            resend_from: DEFAULT_FROM_ADDRESS.to_string(),
            success_recipients: vec![],
            daily_recipients: vec![],
            cron_secret: None,
        }
    }

    #[test]
    fn test_normalize_riddle_collapses_whitespace() {
        assert_eq!(normalize_riddle("  The Man  in\tthe Moon "), "themaninthemoon");
    }

    #[test]
    fn test_normalize_theme_keeps_punctuation() {
        assert_eq!(normalize_theme(" Bee "), "bee");
        assert_eq!(normalize_theme("Bees!"), "bees!");
    }

    #[test]
    fn test_check_riddle_matches_ignoring_spacing_and_case() {
        let config = config();
        assert_eq!(check_riddle(&config, "themaninthemoon"), Ok(true));
        assert_eq!(check_riddle(&config, " the man in the moon "), Ok(true));
        assert_eq!(check_riddle(&config, "the moon"), Ok(false));
    }

    #[test]
    fn test_check_riddle_unset_is_config_error() {
        let mut config = config();
        config.riddle_answer = None;
        assert_eq!(
            check_riddle(&config, "anything"),
            Err(ConfigError::RiddleAnswerUnset)
        );
        config.riddle_answer = Some("   ".to_string());
        assert_eq!(
            check_riddle(&config, "anything"),
            Err(ConfigError::RiddleAnswerUnset)
        );
    }

    #[test]
    fn test_check_theme_accepted_set() {
        let config = config();
        assert!(check_theme(&config, " Bee "));
        assert!(check_theme(&config, "BEES"));
        assert!(!check_theme(&config, "Bees!"));
        assert!(!check_theme(&config, "wasp"));
    }

    #[test]
    fn test_check_guess_scores_against_all_targets() {
        let config = config();
        let bank = WordBank::from_str_data("apple\ngrape\ncrane");
        let row = check_guess(&config, &bank, "apple", &[]).unwrap();
        assert!(row[0].iter().all(|v| *v == crate::feedback::CellVerdict::Correct));
    }

    #[test]
    fn test_check_guess_rejects_wrong_length() {
        let config = config();
        let bank = WordBank::from_str_data("apple");
        assert_eq!(
            check_guess(&config, &bank, "app", &[]),
            Err(GuessError::WrongLength)
        );
        assert_eq!(
            check_guess(&config, &bank, "apples", &[]),
            Err(GuessError::WrongLength)
        );
    }

    #[test]
    fn test_check_guess_rejects_duplicates_case_insensitive() {
        let config = config();
        let bank = WordBank::from_str_data("apple\ngrape");
        let previous = vec!["APPLE".to_string()];
        assert_eq!(
            check_guess(&config, &bank, "apple", &previous),
            Err(GuessError::AlreadyGuessed)
        );
    }

    #[test]
    fn test_check_guess_rejects_unknown_words() {
        let config = config();
        let bank = WordBank::from_str_data("crane");
        assert_eq!(
            check_guess(&config, &bank, "zzzzz", &[]),
            Err(GuessError::NotAWord)
        );
    }

    #[test]
    fn test_check_guess_accepts_target_outside_dictionary() {
        let config = config();
        // "mango" is a target but absent from this dictionary
        let bank = WordBank::from_str_data("crane");
        assert!(check_guess(&config, &bank, "mango", &[]).is_ok());
    }

    #[test]
    fn test_check_guess_misconfigured_targets() {
        let mut config = config();
        config.target_words = None;
        let bank = WordBank::from_str_data("crane");
        assert_eq!(
            check_guess(&config, &bank, "crane", &[]),
            Err(GuessError::Config(ConfigError::TargetWordsInvalid))
        );
    }
}
