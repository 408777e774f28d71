//! Deck is a named set of flashcards a learner studies together
use super::Flashcard;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

impl Deck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flashcards: Vec::new(),
        }
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new("My Deck")
    }
}

/// Review counts of one deck for one learner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeckStats {
    pub total_cards: usize,
    pub new_cards: usize,
    pub due_cards: usize,
}
