// Library interface for valentine-puzzle
// This allows integration tests to access internal modules

pub mod answers;
pub mod cli;
pub mod config;
pub mod countdown;
pub mod email;
pub mod feedback;
pub mod logging;
pub mod server;
pub mod session;
pub mod tui;
pub mod wordbank;

// Re-export the core types for easier testing
pub use answers::{GuessError, check_guess, check_riddle, check_theme};
pub use config::{AppConfig, ConfigError};
pub use countdown::{TimeLeft, time_left};
pub use feedback::{CellVerdict, FeedbackRow, score, score_all};
pub use session::{Phase, PuzzleSession};
pub use wordbank::WordBank;
