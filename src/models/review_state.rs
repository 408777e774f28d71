//! Per-learner scheduling state of one flashcard.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Starting easiness factor of a card that was never reviewed.
pub const INITIAL_EASINESS: f64 = 2.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardReviewState {
    pub easiness_factor: f64,
    /// Consecutive successful reviews since the last lapse.
    pub repetition_count: u32,
    pub interval_days: u32,
    pub due_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl CardReviewState {
    /// State of a card the learner has never reviewed; due immediately.
    pub fn new_card(now: DateTime<Utc>) -> Self {
        Self::with_easiness(INITIAL_EASINESS, now)
    }

    pub fn with_easiness(easiness_factor: f64, now: DateTime<Utc>) -> Self {
        Self {
            easiness_factor,
            repetition_count: 0,
            interval_days: 0,
            due_at: now,
            last_reviewed_at: None,
        }
    }

    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.due_at <= as_of
    }

    pub fn is_new(&self) -> bool {
        self.last_reviewed_at.is_none()
    }
}
