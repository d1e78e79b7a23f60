//! Display name sanitizing.
//!
//! The join handler treats the filter as an external collaborator: any error
//! is swallowed and replaced with the configured fallback name.

use thiserror::Error;

/// Errors a name filter may report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Name is empty")]
    Empty,

    #[error("Name contains control characters")]
    ControlCharacters,
}

/// Cleans a requested display name.
pub trait NameFilter: Send + Sync {
    fn clean(&self, name: &str) -> Result<String, FilterError>;
}

/// Words masked out of display names.
const DEFAULT_BLOCKLIST: &[&str] = &[
    "ass", "bastard", "bitch", "crap", "damn", "dick", "fuck", "piss", "shit", "slut", "whore",
];

/// Masks blocklisted words with asterisks and caps the name length.
#[derive(Debug, Clone)]
pub struct WordListFilter {
    words: Vec<String>,
    max_len: usize,
}

impl WordListFilter {
    pub fn new(max_len: usize) -> Self {
        Self {
            words: DEFAULT_BLOCKLIST.iter().map(|w| w.to_string()).collect(),
            max_len,
        }
    }

    /// Replace the blocklist.
    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words = words.into_iter().map(|w| w.into().to_lowercase()).collect();
        self
    }

    fn mask_word(&self, word: &str) -> String {
        let bare: String = word
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if self.words.iter().any(|w| *w == bare) {
            "*".repeat(word.chars().count())
        } else {
            word.to_string()
        }
    }
}

impl NameFilter for WordListFilter {
    fn clean(&self, name: &str) -> Result<String, FilterError> {
        if name.chars().any(char::is_control) {
            return Err(FilterError::ControlCharacters);
        }
        let truncated: String = name.trim().chars().take(self.max_len).collect();
        let cleaned = truncated
            .split(' ')
            .map(|word| self.mask_word(word))
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned = cleaned.trim().to_string();
        if cleaned.is_empty() {
            return Err(FilterError::Empty);
        }
        Ok(cleaned)
    }
}
