//! Study session boundary between the scheduler and the flashcard store.
//!
//! A session fetches the due cards once at start; every answer is one
//! `submit_review` call, and the updated state is returned only after it is stored.

use super::sm2::{self, DueCards};
use super::{CardId, CardReviewState, LearnerId, Quality, Sm2Params};
use crate::database::FlashcardStore;
use crate::error::{ReviewError, StoreError};
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Cards per session when no limit is configured.
pub const DEFAULT_SESSION_LIMIT: usize = 20;

pub struct StudySession<S> {
    store: S,
    params: Sm2Params,
    session_limit: usize,
}

impl<S: FlashcardStore> StudySession<S> {
    pub fn new(store: S, params: Sm2Params, session_limit: usize) -> Self {
        Self {
            store,
            params,
            session_limit,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn params(&self) -> &Sm2Params {
        &self.params
    }

    /// Due cards among `candidates` for `learner_id` as of `as_of`.
    pub fn due_cards(
        &self,
        learner_id: LearnerId,
        candidates: &[CardId],
        as_of: DateTime<Utc>,
    ) -> Result<DueCards, StoreError> {
        let states = candidates
            .iter()
            .map(|&card_id| Ok((card_id, self.store.load_state(learner_id, card_id)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(sm2::due_cards(states, as_of))
    }

    /// Every due card of a deck, without the session limit.
    pub fn deck_due_cards(
        &self,
        learner_id: LearnerId,
        deck_name: &str,
        as_of: DateTime<Utc>,
    ) -> Result<DueCards, StoreError> {
        let candidates = self.store.load_candidate_card_ids(learner_id, deck_name)?;
        self.due_cards(learner_id, &candidates, as_of)
    }

    pub fn start_session(
        &self,
        learner_id: LearnerId,
        deck_name: &str,
    ) -> Result<Vec<CardId>, StoreError> {
        self.start_session_at(learner_id, deck_name, Utc::now())
    }

    /// Ordered card ids for one session, at most `session_limit` of them.
    pub fn start_session_at(
        &self,
        learner_id: LearnerId,
        deck_name: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<CardId>, StoreError> {
        let due = self.deck_due_cards(learner_id, deck_name, as_of)?;
        let cards: Vec<CardId> = due.iter().take(self.session_limit).collect();

        info!(
            "Learner {} starts '{}': {} of {} due cards this session",
            learner_id,
            deck_name,
            cards.len(),
            due.len()
        );
        Ok(cards)
    }

    pub fn submit_review(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
        quality: i64,
    ) -> Result<CardReviewState, ReviewError> {
        self.submit_review_at(learner_id, card_id, quality, Utc::now())
    }

    /// Validates `quality`, applies it to the stored state and persists the result.
    ///
    /// On any error nothing is written and the card keeps its previous due date.
    pub fn submit_review_at(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
        quality: i64,
        now: DateTime<Utc>,
    ) -> Result<CardReviewState, ReviewError> {
        let quality = Quality::try_from(quality)?;

        let review = |current: Option<CardReviewState>| {
            let current = current.unwrap_or_else(|| self.params.new_card_state(now));
            self.params.record_review(&current, quality, now)
        };
        let next = self.store.update_state(learner_id, card_id, &review)?;

        debug!(
            "Learner {} card {} quality {}: reps {}, interval {}d, EF {:.2}",
            learner_id,
            card_id,
            quality,
            next.repetition_count,
            next.interval_days,
            next.easiness_factor
        );
        Ok(next)
    }
}
