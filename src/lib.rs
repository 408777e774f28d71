pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use config::Config;
pub use database::{FlashcardStore, SqliteStore};
pub use error::{ConfigError, ImportError, InvalidQuality, ReviewError, StoreError};
pub use models::{CardReviewState, Deck, Flashcard, Quality, Sm2Params, StudySession};
