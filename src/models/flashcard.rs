//! Flashcard content: a <term, definition> pair of plain text.
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

impl Flashcard {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }

    /// Cards with a blank side are rejected on import.
    pub fn is_blank(&self) -> bool {
        self.term.trim().is_empty() || self.definition.trim().is_empty()
    }
}
