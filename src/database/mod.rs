pub mod db;

use crate::error::StoreError;
use crate::models::{CardId, CardReviewState, LearnerId};

pub use db::SqliteStore;

/// Persistence boundary of the scheduler.
///
/// A missing state is the "new card" case and is returned as `Ok(None)`.
/// Implementations must never let an older review overwrite a newer one for the
/// same (learner, card) pair.
pub trait FlashcardStore {
    fn load_state(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
    ) -> Result<Option<CardReviewState>, StoreError>;

    fn save_state(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
        state: &CardReviewState,
    ) -> Result<(), StoreError>;

    /// Loads the state, applies `update` and saves the result as one unit.
    ///
    /// The default runs `load_state` then `save_state`; stores that can hold a
    /// row lock across both should override it so concurrent reviews of the same
    /// card are applied one after the other.
    fn update_state(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
        update: &dyn Fn(Option<CardReviewState>) -> CardReviewState,
    ) -> Result<CardReviewState, StoreError> {
        let next = update(self.load_state(learner_id, card_id)?);
        self.save_state(learner_id, card_id, &next)?;
        Ok(next)
    }

    /// Ids of the cards in the deck the learner is studying, ascending.
    fn load_candidate_card_ids(
        &self,
        learner_id: LearnerId,
        deck_name: &str,
    ) -> Result<Vec<CardId>, StoreError>;
}
