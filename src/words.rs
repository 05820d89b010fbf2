use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest custom list that can drive a session or a baseline probe
pub const MIN_TARGET_WORDS: usize = 10;

/// Level 0 means "use the participant's own target words"
pub const CUSTOM_LEVEL: u8 = 0;

pub const QUICK_ADD_SUGGESTIONS: [&str; 15] = [
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "her", "was", "one", "our",
    "out", "day",
];

const LEVEL_1: [&str; 20] = [
    "the", "and", "a", "to", "of", "in", "is", "you", "that", "it", "he", "was", "for", "on",
    "are", "with", "as", "I", "his", "they",
];

const LEVEL_2: [&str; 20] = [
    "be", "at", "this", "have", "from", "or", "had", "by", "hot", "has", "her", "would", "there",
    "their", "what", "so", "up", "out", "if", "about",
];

const LEVEL_3: [&str; 20] = [
    "who", "oil", "use", "two", "how", "its", "said", "each", "which", "she", "do", "an", "all",
    "into", "could", "year", "your", "work", "first", "made",
];

/// Built-in levels that ship with the app
pub const BUILTIN_LEVELS: [u8; 3] = [1, 2, 3];

/// Word list for a built-in level; anything unknown falls back to level 1
pub fn sight_words(level: u8) -> &'static [&'static str] {
    match level {
        2 => &LEVEL_2,
        3 => &LEVEL_3,
        _ => &LEVEL_1,
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum WordListError {
    #[error("word is empty")]
    Empty,
    #[error("'{0}' is already on the list")]
    Duplicate(String),
    #[error("need at least {min} words, have {0}", min = MIN_TARGET_WORDS)]
    TooFew(usize),
}

/// Participant-specific intervention words: lowercase, trimmed, unique
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetWordList {
    words: Vec<String>,
}

impl TargetWordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary input, normalizing and silently dropping blanks and repeats
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        for w in words {
            let _ = list.add(w.as_ref());
        }
        list
    }

    pub fn add(&mut self, word: &str) -> Result<(), WordListError> {
        let normalized = word.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(WordListError::Empty);
        }
        if self.contains(&normalized) {
            return Err(WordListError::Duplicate(normalized));
        }
        self.words.push(normalized);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.words.len() {
            Some(self.words.remove(index))
        } else {
            None
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// How many more words are needed before the list is usable
    pub fn missing(&self) -> usize {
        MIN_TARGET_WORDS.saturating_sub(self.words.len())
    }

    pub fn is_ready(&self) -> bool {
        self.missing() == 0
    }

    /// Gate used before saving, before custom sessions and before baseline probes
    pub fn ensure_ready(&self) -> Result<(), WordListError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(WordListError::TooFew(self.words.len()))
        }
    }
}
