use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::feedback::WORD_LENGTH;

pub const EMBEDDED_WORDBANK: &str = include_str!("resources/wordbank.txt");

/// Accepted-guess dictionary. A guess is playable when it appears here or
/// matches one of the session's target words.
#[derive(Debug, Clone)]
pub struct WordBank {
    words: HashSet<String>,
}

impl WordBank {
    pub fn embedded() -> Self {
        Self::from_str_data(EMBEDDED_WORDBANK)
    }

    pub fn from_str_data(data: &str) -> Self {
        let words = data
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|word| is_playable_word(word))
            .collect();
        Self { words }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut words = HashSet::new();
        for line in reader.lines() {
            let word = line?.trim().to_lowercase();
            if is_playable_word(&word) {
                words.insert(word);
            }
        }
        Ok(Self { words })
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn is_playable_word(word: &str) -> bool {
    word.len() == WORD_LENGTH && word.chars().all(|c| c.is_ascii_alphabetic())
}
