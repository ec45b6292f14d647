use serde::{Deserialize, Serialize};

/// An English term and its Hausa translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedWord {
    pub source_term: String,
    pub target_translation: String,
}

impl LearnedWord {
    pub fn new(source_term: impl Into<String>, target_translation: impl Into<String>) -> Self {
        Self {
            source_term: source_term.into(),
            target_translation: target_translation.into(),
        }
    }
}

/// Append-only word list, unique on the source term ignoring case
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnedWords {
    words: Vec<LearnedWord>,
}

impl LearnedWords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted data, dropping case-insensitive duplicates
    pub fn from_words(words: impl IntoIterator<Item = LearnedWord>) -> Self {
        let mut set = Self::new();
        for word in words {
            set.insert(word);
        }
        set
    }

    pub fn contains(&self, source_term: &str) -> bool {
        let needle = source_term.trim().to_lowercase();
        self.words
            .iter()
            .any(|w| w.source_term.to_lowercase() == needle)
    }

    /// Returns false when the term is blank or already known
    pub fn insert(&mut self, word: LearnedWord) -> bool {
        let source_term = word.source_term.trim();
        if source_term.is_empty() || self.contains(source_term) {
            return false;
        }
        self.words.push(LearnedWord::new(
            source_term,
            word.target_translation.trim(),
        ));
        true
    }

    pub fn source_terms(&self) -> Vec<String> {
        self.words.iter().map(|w| w.source_term.clone()).collect()
    }

    pub fn get(&self, index: usize) -> Option<&LearnedWord> {
        self.words.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LearnedWord> {
        self.words.iter()
    }

    pub fn clear(&mut self) {
        self.words.clear();
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
