//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates optimal review intervals based on recall quality:
//! - Each card has an easiness factor (EF) that adjusts based on performance
//! - Quality grades 0-2: a lapse, repetitions reset and the card comes back tomorrow
//! - Quality grades 3-5: Increase interval progressively (1 day → 6 days → EF multiplier)
//! - EF is adjusted after each review and has a minimum value of 1.3
//!
//! Everything here is pure: the caller supplies "now" and persists the result.

use super::{CardId, CardReviewState, Quality};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Largest interval any configuration may schedule (100 years).
pub const INTERVAL_LIMIT_DAYS: u32 = 36_500;
use std::collections::BinaryHeap;

/// Tuning constants of the update rule. `Default` is the classic SM-2 tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sm2Params {
    pub initial_easiness: f64,
    pub min_easiness: f64,
    /// EF' = EF + (bonus - (5-q) * (linear_penalty + (5-q) * quadratic_penalty))
    pub easiness_bonus: f64,
    pub linear_penalty: f64,
    pub quadratic_penalty: f64,
    /// Lowest quality that counts as a successful recall.
    pub pass_threshold: u8,
    pub first_interval_days: u32,
    pub second_interval_days: u32,
    pub lapse_interval_days: u32,
    pub max_interval_days: u32,
}

impl Default for Sm2Params {
    fn default() -> Self {
        Self {
            initial_easiness: super::review_state::INITIAL_EASINESS,
            min_easiness: 1.3,
            easiness_bonus: 0.1,
            linear_penalty: 0.08,
            quadratic_penalty: 0.02,
            pass_threshold: 3,
            first_interval_days: 1,
            second_interval_days: 6,
            lapse_interval_days: 1,
            max_interval_days: INTERVAL_LIMIT_DAYS,
        }
    }
}

impl Sm2Params {
    pub fn new_card_state(&self, now: DateTime<Utc>) -> CardReviewState {
        CardReviewState::with_easiness(self.initial_easiness, now)
    }

    pub fn is_success(&self, quality: Quality) -> bool {
        quality.value() >= self.pass_threshold
    }

    /// New easiness factor after a review, floored at `min_easiness`.
    pub fn next_easiness(&self, easiness_factor: f64, quality: Quality) -> f64 {
        let miss = (Quality::MAX - quality.value()) as f64;
        let ef = easiness_factor
            + (self.easiness_bonus - miss * (self.linear_penalty + miss * self.quadratic_penalty));
        ef.max(self.min_easiness)
    }

    /// Computes the state that follows `state` after a review of `quality` at `now`.
    pub fn record_review(
        &self,
        state: &CardReviewState,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> CardReviewState {
        let easiness_factor = self.next_easiness(state.easiness_factor, quality);

        let (interval_days, repetition_count) = if self.is_success(quality) {
            let reps = state.repetition_count.saturating_add(1);
            let interval = match reps {
                1 => self.first_interval_days,
                2 => self.second_interval_days,
                _ => (state.interval_days as f64 * easiness_factor).round() as u32,
            };
            (interval.min(self.max_interval_days), reps)
        } else {
            (self.lapse_interval_days, 0)
        };

        CardReviewState {
            easiness_factor,
            repetition_count,
            interval_days,
            due_at: now
                .checked_add_signed(Duration::days(interval_days as i64))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            last_reviewed_at: Some(now),
        }
    }
}

/// Calculates the next review state with the default SM-2 tuning.
pub fn record_review(
    state: &CardReviewState,
    quality: Quality,
    now: DateTime<Utc>,
) -> CardReviewState {
    Sm2Params::default().record_review(state, quality, now)
}

/// Selects the due cards among `candidates` as of `as_of`.
///
/// A candidate without state is a new card and is due, ordered as if due at `as_of`.
pub fn due_cards<I>(candidates: I, as_of: DateTime<Utc>) -> DueCards
where
    I: IntoIterator<Item = (CardId, Option<CardReviewState>)>,
{
    let heap = candidates
        .into_iter()
        .filter_map(|(card_id, state)| match state {
            None => Some((as_of, card_id)),
            Some(state) if state.is_due(as_of) => Some((state.due_at, card_id)),
            Some(_) => None,
        })
        .map(Reverse)
        .collect();

    DueCards { heap }
}

/// Due cards, oldest due first, ties by card id.
///
/// Each call to [`DueCards::iter`] starts over; cards are popped one at a time so a
/// caller taking a prefix never sorts the whole set.
#[derive(Clone, Debug, Default)]
pub struct DueCards {
    heap: BinaryHeap<Reverse<(DateTime<Utc>, CardId)>>,
}

impl DueCards {
    pub fn iter(&self) -> DueCardsIter {
        DueCardsIter {
            heap: self.heap.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl IntoIterator for DueCards {
    type Item = CardId;
    type IntoIter = DueCardsIter;

    fn into_iter(self) -> Self::IntoIter {
        DueCardsIter { heap: self.heap }
    }
}

impl<'a> IntoIterator for &'a DueCards {
    type Item = CardId;
    type IntoIter = DueCardsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Debug)]
pub struct DueCardsIter {
    heap: BinaryHeap<Reverse<(DateTime<Utc>, CardId)>>,
}

impl Iterator for DueCardsIter {
    type Item = CardId;

    fn next(&mut self) -> Option<CardId> {
        self.heap.pop().map(|Reverse((_, card_id))| card_id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}

impl ExactSizeIterator for DueCardsIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 30, 0).unwrap()
    }

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    fn state(easiness_factor: f64, repetition_count: u32, interval_days: u32) -> CardReviewState {
        CardReviewState {
            easiness_factor,
            repetition_count,
            interval_days,
            due_at: now(),
            last_reviewed_at: Some(now() - Duration::days(interval_days as i64)),
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_first_review() {
        let next = record_review(&CardReviewState::new_card(now()), q(5), now());

        assert_eq!(next.repetition_count, 1);
        assert_eq!(next.interval_days, 1);
        assert_close(next.easiness_factor, 2.6);
        assert_eq!(next.last_reviewed_at, Some(now()));
        assert_eq!(next.due_at, now() + Duration::days(1));
    }

    #[test]
    fn test_second_review() {
        let next = record_review(&state(2.6, 1, 1), q(4), now());

        assert_eq!(next.repetition_count, 2);
        assert_eq!(next.interval_days, 6);
        assert_close(next.easiness_factor, 2.6);
    }

    #[test]
    fn test_third_review_uses_new_easiness() {
        let next = record_review(&state(2.5, 2, 6), q(5), now());

        assert_eq!(next.repetition_count, 3);
        assert_close(next.easiness_factor, 2.6);
        assert_eq!(next.interval_days, (6.0 * next.easiness_factor).round() as u32);
        assert_eq!(next.interval_days, 16);
    }

    #[test]
    fn test_quality_below_3_resets() {
        let next = record_review(&state(2.5, 3, 15), q(1), now());

        assert_eq!(next.repetition_count, 0);
        assert_eq!(next.interval_days, 1);
        assert_eq!(next.due_at, now() + Duration::days(1));
        // EF should still be updated
        assert_close(next.easiness_factor, 2.5 - 0.54);
    }

    #[test]
    fn test_quality_3_is_a_success() {
        let next = record_review(&state(2.5, 4, 10), q(3), now());

        assert_eq!(next.repetition_count, 5);
        assert_close(next.easiness_factor, 2.36);
        assert_eq!(next.interval_days, 24);
    }

    #[test]
    fn test_repeated_lapses_stay_daily() {
        let mut current = state(2.5, 6, 40);
        for day in 0..5 {
            let at = now() + Duration::days(day);
            current = record_review(&current, q(0), at);
            assert_eq!(current.repetition_count, 0);
            assert_eq!(current.interval_days, 1);
            assert_eq!(current.due_at, at + Duration::days(1));
        }
    }

    #[test]
    fn test_ef_floor() {
        let next = record_review(&state(1.3, 1, 1), q(0), now());
        assert_eq!(next.easiness_factor, 1.3);
    }

    #[test]
    fn test_custom_params() {
        let params = Sm2Params {
            first_interval_days: 2,
            second_interval_days: 5,
            ..Sm2Params::default()
        };
        let first = params.record_review(&params.new_card_state(now()), q(4), now());
        let second = params.record_review(&first, q(4), now());

        assert_eq!(first.interval_days, 2);
        assert_eq!(second.interval_days, 5);
    }

    #[test]
    fn test_interval_is_capped() {
        let next = record_review(&state(2.5, 20, 30_000), q(5), now());
        assert_eq!(next.interval_days, 36_500);
        assert_eq!(next.due_at, now() + Duration::days(36_500));
    }

    #[test]
    fn test_unbounded_params_saturate_due_date() {
        let params = Sm2Params {
            max_interval_days: u32::MAX,
            ..Sm2Params::default()
        };
        let mut current = params.new_card_state(now());
        for _ in 0..40 {
            current = params.record_review(&current, q(5), now());
        }

        assert_eq!(current.interval_days, u32::MAX);
        assert_eq!(current.due_at, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_due_cards_scenario() {
        let t = now();
        let overdue = CardReviewState {
            due_at: t - Duration::days(1),
            ..state(2.5, 1, 1)
        };
        let upcoming = CardReviewState {
            due_at: t + Duration::days(1),
            ..state(2.5, 1, 1)
        };

        let due = due_cards(vec![(1, Some(overdue)), (2, Some(upcoming)), (3, None)], t);

        assert_eq!(due.len(), 2);
        assert_eq!(due.iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_due_cards_ordering_and_ties() {
        let t = now();
        let at = |hours: i64| CardReviewState {
            due_at: t - Duration::hours(hours),
            ..state(2.5, 2, 6)
        };

        let due = due_cards(
            vec![
                (9, Some(at(1))),
                (4, None),
                (7, Some(at(5))),
                (2, Some(at(1))),
                (1, None),
                (5, Some(at(0))),
            ],
            t,
        );

        assert_eq!(due.iter().collect::<Vec<_>>(), vec![7, 2, 9, 1, 4, 5]);
    }

    #[test]
    fn test_due_cards_restartable_prefix() {
        let due = due_cards((1..=50).map(|id| (id, None)), now());

        let first: Vec<_> = due.iter().take(3).collect();
        let again: Vec<_> = due.iter().take(3).collect();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(first, again);
        assert_eq!(due.iter().len(), 50);
        assert_eq!(due.into_iter().count(), 50);
    }

    #[test]
    fn test_due_cards_empty() {
        let due = due_cards(Vec::new(), now());
        assert!(due.is_empty());
        assert_eq!(due.iter().next(), None);
    }

    proptest! {
        #[test]
        fn prop_easiness_never_below_floor(
            start in 1.3f64..4.0,
            qualities in prop::collection::vec(0i64..=5, 1..60),
        ) {
            let mut current = state(start, 0, 0);
            for value in qualities {
                current = record_review(&current, q(value), now());
                prop_assert!(current.easiness_factor >= 1.3);
            }
        }

        #[test]
        fn prop_lapse_resets_repetition(
            ef in 1.3f64..4.0,
            reps in 1u32..30,
            interval in 1u32..400,
            value in 0i64..3,
        ) {
            let next = record_review(&state(ef, reps, interval), q(value), now());
            prop_assert_eq!(next.repetition_count, 0);
            prop_assert_eq!(next.interval_days, 1);
        }

        #[test]
        fn prop_success_intervals_non_decreasing(
            ef in 1.3f64..4.0,
            value in 3i64..=5,
            steps in 2usize..25,
        ) {
            let mut current = state(ef, 0, 0);
            let mut intervals = Vec::new();
            for _ in 0..steps {
                current = record_review(&current, q(value), now());
                intervals.push(current.interval_days);
            }
            prop_assert_eq!(intervals[0], 1);
            prop_assert_eq!(intervals[1], 6);
            prop_assert!(intervals.windows(2).all(|w| w[0] <= w[1]));
        }

        #[test]
        fn prop_record_review_is_deterministic(
            ef in 1.3f64..4.0,
            reps in 0u32..30,
            interval in 0u32..400,
            value in 0i64..=5,
        ) {
            let before = state(ef, reps, interval);
            let a = record_review(&before, q(value), now());
            let b = record_review(&before, q(value), now());
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_due_set_is_exact(
            offsets in prop::collection::vec(prop::option::of(-1000i64..1000), 0..40),
        ) {
            let t = now();
            let candidates: Vec<_> = offsets
                .iter()
                .enumerate()
                .map(|(i, offset)| {
                    let review = offset.map(|minutes| CardReviewState {
                        due_at: t + Duration::minutes(minutes),
                        ..state(2.5, 1, 1)
                    });
                    (i as CardId, review)
                })
                .collect();

            let mut expected: Vec<(DateTime<Utc>, CardId)> = candidates
                .iter()
                .filter_map(|(id, review)| match review {
                    None => Some((t, *id)),
                    Some(s) if s.due_at <= t => Some((s.due_at, *id)),
                    Some(_) => None,
                })
                .collect();
            expected.sort();
            let expected: Vec<CardId> = expected.into_iter().map(|(_, id)| id).collect();

            let due = due_cards(candidates, t);
            prop_assert_eq!(due.iter().collect::<Vec<_>>(), expected);
        }
    }
}
