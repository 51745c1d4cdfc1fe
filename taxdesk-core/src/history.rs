//! Recently asked questions.
//!
//! The history is most-recent-first and bounded. It is persisted as a JSON
//! array of strings so it survives restarts.

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Default number of questions kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded, deduplicated list of recent questions, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionHistory {
    entries: Vec<String>,
    #[serde(skip, default = "default_capacity")]
    capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for QuestionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionHistory {
    /// Create an empty history with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history keeping at most `capacity` questions.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Load from a JSON file.
    ///
    /// A missing or unreadable file yields an empty history rather than an
    /// error, so a corrupt file never blocks the chat.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let entries = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding corrupt question history");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        let mut history = Self::new();
        history.entries = entries;
        history.entries.truncate(history.capacity);
        history
    }

    /// Write to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string(&self.entries)?;
        fs::write(path, raw)?;
        Ok(())
    }

    /// Record a question: moved to the front, never duplicated.
    pub fn record(&mut self, question: &str) {
        let question = question.trim();
        if question.is_empty() {
            return;
        }
        self.entries.retain(|q| q != question);
        self.entries.insert(0, question.to_string());
        self.entries.truncate(self.capacity);
    }

    /// Remove the given questions. Returns how many were removed.
    pub fn remove_selected(&mut self, selected: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|q| !selected.contains(q));
        before - self.entries.len()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Questions, newest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of stored questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of stored questions.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_moves_to_front_without_duplicates() {
        let mut history = QuestionHistory::new();
        history.record("a");
        history.record("b");
        history.record(" a ");
        history.record("");

        assert_eq!(history.entries(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = QuestionHistory::with_capacity(3);
        for q in ["1", "2", "3", "4"] {
            history.record(q);
        }
        assert_eq!(history.entries(), &["4", "3", "2"]);
    }

    #[test]
    fn test_default_capacity_is_fifty() {
        let mut history = QuestionHistory::new();
        for i in 0..60 {
            history.record(&format!("q{}", i));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.entries()[0], "q59");
        assert_eq!(history.entries()[49], "q10");
    }

    #[test]
    fn test_remove_selected_and_clear() {
        let mut history = QuestionHistory::new();
        for q in ["a", "b", "c"] {
            history.record(q);
        }
        let selected = HashSet::from(["a".to_string(), "x".to_string()]);
        assert_eq!(history.remove_selected(&selected), 1);
        assert_eq!(history.entries(), &["c", "b"]);

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat_history.json");

        let mut history = QuestionHistory::new();
        history.record("增值税");
        history.record("印花税");
        history.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"["印花税","增值税"]"#);
        assert_eq!(QuestionHistory::load(&path), history);
    }

    #[test]
    fn test_load_missing_or_corrupt_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(QuestionHistory::load(dir.path().join("missing.json")).is_empty());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{not json").unwrap();
        assert!(QuestionHistory::load(&corrupt).is_empty());
    }
}
