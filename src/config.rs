use std::env;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::feedback::{TARGET_COUNT, WORD_LENGTH};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 9;
pub const DEFAULT_FROM_ADDRESS: &str = "Puzzle Notifier <noreply@iloveneil.gay>";
const DEFAULT_THEME_ANSWERS: [&str; 2] = ["bee", "bees"];

/// A configuration value needed by an operation is unset or malformed.
///
/// These are fatal to the request that needs the value, never to the
/// process: every validator reports them per call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Puzzle not configured. Set RIDDLE_ANSWER")]
    RiddleAnswerUnset,
    #[error(
        "Server config: set PUZZLE_WORDS to either four 5-letter words (a,b,c,d) or one 5-letter word for testing."
    )]
    TargetWordsInvalid,
    #[error("{0} is empty or not set")]
    EmailSettingMissing(&'static str),
    #[error("CRON_SECRET not configured")]
    CronSecretUnset,
}

/// All configuration the puzzle consumes, resolved once at startup.
///
/// Validators and handlers receive this by reference; nothing reads the
/// environment after construction.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Expected riddle answer, compared after normalization. `None` when
    /// unset, which surfaces as a per-request configuration error.
    pub riddle_answer: Option<String>,
    /// The four hidden target words, already lowercased. `None` when the
    /// configured value could not be parsed.
    pub target_words: Option<[String; TARGET_COUNT]>,
    /// Accepted theme answers, lowercased.
    pub theme_accepted: Vec<String>,
    /// Wall-clock timestamp at which the countdown gate opens.
    pub target_date: DateTime<Utc>,
    /// Maximum number of accepted guesses before the puzzle is failed.
    pub max_attempts: u32,
    pub resend_api_key: Option<String>,
    pub resend_from: String,
    pub success_recipients: Vec<String>,
    pub daily_recipients: Vec<String>,
    pub cron_secret: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    ///
    /// Malformed optional values (bad timestamp, bad attempt count) fall
    /// back to defaults with a warning rather than aborting startup.
    pub fn from_env() -> Self {
        let target_date = match env_var("TARGET_DATE") {
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(parsed) => parsed.with_timezone(&Utc),
                Err(e) => {
                    log::warn!("Ignoring invalid TARGET_DATE {raw:?}: {e}");
                    default_target_date()
                }
            },
            None => default_target_date(),
        };

        let max_attempts = match env_var("MAX_ATTEMPTS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    log::warn!("Ignoring invalid MAX_ATTEMPTS {raw:?}");
                    DEFAULT_MAX_ATTEMPTS
                }
            },
            None => DEFAULT_MAX_ATTEMPTS,
        };

        let theme_accepted = match env_var("THEME_ANSWERS") {
            Some(raw) => parse_list(&raw)
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect(),
            None => DEFAULT_THEME_ANSWERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        };

        Self {
            riddle_answer: env_var("RIDDLE_ANSWER"),
            target_words: env_var("PUZZLE_WORDS")
                .as_deref()
                .and_then(parse_target_words),
            theme_accepted,
            target_date,
            max_attempts,
            resend_api_key: env_var("RESEND_API_KEY"),
            resend_from: env_var("RESEND_FROM")
                .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
            success_recipients: env_var("SUCCESS_EMAIL_RECIPIENTS")
                .map(|raw| {
                    parse_list(&raw)
                        .into_iter()
                        .map(|s| s.to_lowercase())
                        .collect()
                })
                .unwrap_or_default(),
            daily_recipients: env_var("DAILY_EMAIL_RECIPIENTS")
                .map(|raw| parse_list(&raw))
                .unwrap_or_default(),
            cron_secret: env_var("CRON_SECRET"),
        }
    }

    /// The resolved target word set, or the configuration error every
    /// word-puzzle operation reports when it is unusable.
    pub fn require_target_words(&self) -> Result<&[String; TARGET_COUNT], ConfigError> {
        self.target_words
            .as_ref()
            .ok_or(ConfigError::TargetWordsInvalid)
    }
}

fn default_target_date() -> DateTime<Utc> {
    // Midnight, Valentine's Day 2026
    Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap()
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Split a comma-separated list, trimming entries and dropping empties.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the configured puzzle words: either four 5-letter words, or one
/// 5-letter word repeated for all four boards (test-mode shorthand).
pub fn parse_target_words(raw: &str) -> Option<[String; TARGET_COUNT]> {
    let parts: Vec<String> = raw
        .split(',')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| w.len() == WORD_LENGTH && w.chars().all(|c| c.is_ascii_alphabetic()))
        .collect();
    match parts.as_slice() {
        [a, b, c, d] => Some([a.clone(), b.clone(), c.clone(), d.clone()]),
        [only] => Some([only.clone(), only.clone(), only.clone(), only.clone()]),
        _ => None,
    }
}
