pub mod deck;
pub mod flashcard;
pub mod quality;
pub mod review_state;
pub mod sm2;
pub mod study_session;

pub use deck::{Deck, DeckStats};
pub use flashcard::Flashcard;
pub use quality::{AnswerButton, Quality};
pub use review_state::CardReviewState;
pub use sm2::{DueCards, Sm2Params};
pub use study_session::StudySession;

/// Row id of a flashcard.
pub type CardId = i64;
pub type LearnerId = i64;
