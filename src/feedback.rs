use serde::{Deserialize, Serialize};

pub const WORD_LENGTH: usize = 5;
pub const TARGET_COUNT: usize = 4;

/// Per-position verdict for one guess letter against one target word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellVerdict {
    Correct,
    Present,
    Absent,
}

/// Verdicts for one guess against one target word.
pub type Verdicts = [CellVerdict; WORD_LENGTH];

/// Verdicts for one guess against all four target words, in target order.
pub type FeedbackRow = [Verdicts; TARGET_COUNT];

/// Score a guess against a single target word.
///
/// Two-pass scoring: exact matches first, then displaced letters scanning
/// target positions left to right. A target position consumed by either
/// pass is never matched again, so a letter repeated in the guess cannot
/// earn more `Present` marks than the target has unconsumed occurrences.
///
/// Comparison is case-insensitive; the guess is truncated to 5 characters.
pub fn score(guess: &str, target: &str) -> Verdicts {
    let guess_chars: Vec<char> = guess
        .to_lowercase()
        .chars()
        .take(WORD_LENGTH)
        .collect();
    let mut target_chars: Vec<char> = target.to_lowercase().chars().collect();
    let mut verdicts = [CellVerdict::Absent; WORD_LENGTH];

    // First pass: exact matches
    for i in 0..WORD_LENGTH {
        if guess_chars.get(i) == target_chars.get(i) && guess_chars.get(i).is_some() {
            verdicts[i] = CellVerdict::Correct;
            target_chars[i] = '_'; // Mark as consumed
        }
    }
    // Second pass: displaced letters, leftmost unconsumed occurrence wins
    for i in 0..WORD_LENGTH {
        if verdicts[i] == CellVerdict::Correct {
            continue;
        }
        let Some(&g) = guess_chars.get(i) else {
            continue;
        };
        if let Some(pos) = target_chars.iter().position(|&c| c == g) {
            verdicts[i] = CellVerdict::Present;
            target_chars[pos] = '_'; // Mark as consumed
        }
    }
    verdicts
}

/// Score a guess against all four targets, one verdict row per target.
pub fn score_all(guess: &str, targets: &[String; TARGET_COUNT]) -> FeedbackRow {
    [
        score(guess, &targets[0]),
        score(guess, &targets[1]),
        score(guess, &targets[2]),
        score(guess, &targets[3]),
    ]
}
