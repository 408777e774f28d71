//! Error types shared by the scheduler, the store and the command line.

use crate::models::{CardId, LearnerId};
use std::path::PathBuf;
use thiserror::Error;

/// A quality rating outside the closed range 0..=5.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("quality must be between 0 and 5, got {0}")]
pub struct InvalidQuality(pub i64);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("a later review is already stored for learner {learner_id}, card {card_id}")]
    StaleWrite {
        learner_id: LearnerId,
        card_id: CardId,
    },

    #[error("deck not found: {0}")]
    DeckNotFound(String),

    #[error("invalid timestamp in review state: {0}")]
    CorruptTimestamp(i64),

    #[error("store connection lock poisoned")]
    LockPoisoned,
}

/// Failure of a single review submission. Nothing is written when this is returned.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error(transparent)]
    InvalidQuality(#[from] InvalidQuality),

    #[error("review not recorded: {0}")]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
