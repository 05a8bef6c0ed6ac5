//! Applies one review outcome to a stored card.

use super::{Result, ReviewError};
use crate::clock::{Clock, SystemClock};
use crate::database::{CardStore, Result as StoreResult, RewardLedger};
use crate::models::{
    Achievement, ImmediateGraduation, LifecyclePolicy, Quality, SchedulingState, apply_review,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Points for a successful review (quality ≥ 3).
pub const SUCCESS_POINTS: i64 = 10;
/// Points for a failed review.
pub const FAILURE_POINTS: i64 = 1;

pub fn points_for(quality: Quality) -> i64 {
    if quality.is_success() {
        SUCCESS_POINTS
    } else {
        FAILURE_POINTS
    }
}

/// What a single review changed.
#[derive(Clone, Debug, PartialEq)]
pub struct ReviewReport {
    pub card_id: i64,
    pub quality: Quality,
    pub previous: SchedulingState,
    pub updated: SchedulingState,
    pub points_awarded: i64,
    pub achievements: Vec<Achievement>,
}

pub struct ReviewService<S, C = SystemClock, P = ImmediateGraduation> {
    store: S,
    clock: C,
    policy: P,
}

impl<S: CardStore + RewardLedger> ReviewService<S> {
    pub fn new(store: S) -> Self {
        Self::with_parts(store, SystemClock, ImmediateGraduation)
    }
}

impl<S, C, P> ReviewService<S, C, P>
where
    S: CardStore + RewardLedger,
    C: Clock,
    P: LifecyclePolicy,
{
    pub fn with_parts(store: S, clock: C, policy: P) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Validates a raw rating from the UI, then reviews the card.
    pub fn process_rating(&self, card_id: i64, rating: i64) -> Result<ReviewReport> {
        let quality = Quality::try_from(rating).inspect_err(|e| {
            warn!(card_id, rating, "Rejected review: {}", e);
        })?;
        self.process_review(card_id, quality)
    }

    /// Reschedules the card and stores the whole new state in one update,
    /// then credits the card owner.
    ///
    /// Nothing is written if the stored state is corrupt. A failure after the
    /// save is reported as `ReviewError::Reward` and must not be retried.
    pub fn process_review(&self, card_id: i64, quality: Quality) -> Result<ReviewReport> {
        let now = self.clock.now();
        let card = self.store.load_card(card_id)?;

        let updated = apply_review(quality, &card.scheduling, now, &self.policy).inspect_err(
            |e| warn!(card_id, "Cannot schedule card: {}", e),
        )?;
        self.store.save_review(card_id, &updated)?;

        info!(
            card_id,
            quality = quality.value(),
            interval_days = updated.interval_days,
            state = %updated.lifecycle,
            "Card reviewed"
        );

        let points_awarded = points_for(quality);
        let achievements = self
            .credit_owner(&card.owner_id, points_awarded, now)
            .map_err(|source| {
                warn!(card_id, "Review saved but rewards failed: {}", source);
                ReviewError::Reward {
                    card_id,
                    updated: updated.clone(),
                    source,
                }
            })?;

        Ok(ReviewReport {
            card_id,
            quality,
            previous: card.scheduling,
            updated,
            points_awarded,
            achievements,
        })
    }

    fn credit_owner(
        &self,
        owner_id: &str,
        points: i64,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Achievement>> {
        self.store.award_points(owner_id, points)?;
        self.store.check_achievements(owner_id, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::{Database, StoreError};
    use crate::models::{Flashcard, LifecycleState, NewDeck, ScheduleError};
    use crate::review::test_support::RewardsUnavailable;
    use chrono::{Duration, TimeZone};
    use rusqlite::params;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 7, 45, 0).unwrap()
    }

    fn setup() -> (ReviewService<Database, FixedClock>, i64) {
        let db = Database::open_in_memory().unwrap();
        let deck_id = db.create_deck("alice", &NewDeck::new("Polish"), start()).unwrap();
        let card_id = db
            .create_card("alice", deck_id, &Flashcard::new("cześć", "hello"), start())
            .unwrap();
        let service = ReviewService::with_parts(db, FixedClock::new(start()), ImmediateGraduation);
        (service, card_id)
    }

    fn q(value: u8) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn test_full_review_ladder() {
        let (service, card_id) = setup();

        let first = service.process_review(card_id, q(4)).unwrap();
        assert_eq!(first.updated.interval_days, 1);
        assert_eq!(first.updated.repetitions, 1);
        assert_eq!(first.updated.due_at, start() + Duration::days(1));
        assert_eq!(first.updated.lifecycle, LifecycleState::Review);

        service.clock().advance_days(1);
        let second = service.process_review(card_id, q(5)).unwrap();
        assert_eq!(second.updated.interval_days, 6);
        assert!((second.updated.ease_factor - 2.6).abs() < 1e-9);

        service.clock().advance_days(6);
        let third = service.process_review(card_id, q(4)).unwrap();
        assert_eq!(third.updated.interval_days, 16);
        assert_eq!(third.updated.repetitions, 3);

        let stored = service.store().load_card(card_id).unwrap();
        assert_eq!(stored.scheduling, third.updated);
    }

    #[test]
    fn test_failed_review_relearns_and_awards_one_point() {
        let (service, card_id) = setup();
        service.process_review(card_id, q(5)).unwrap();

        let report = service.process_review(card_id, q(1)).unwrap();
        assert_eq!(report.updated.lifecycle, LifecycleState::Relearning);
        assert_eq!(report.updated.repetitions, 0);
        assert_eq!(report.points_awarded, FAILURE_POINTS);

        let board = service.store().leaderboard(10).unwrap();
        assert_eq!(board[0].points, SUCCESS_POINTS + FAILURE_POINTS);
        assert_eq!(board[0].total_reviews, 2);
    }

    #[test]
    fn test_invalid_rating_mutates_nothing() {
        let (service, card_id) = setup();
        let before = service.store().load_card(card_id).unwrap();

        let result = service.process_rating(card_id, 7);
        assert!(matches!(
            result,
            Err(ReviewError::Schedule(ScheduleError::InvalidQuality(_)))
        ));
        assert_eq!(service.store().load_card(card_id).unwrap(), before);
        assert!(service.store().leaderboard(10).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_state_is_surfaced() {
        let (service, card_id) = setup();
        service
            .store()
            .raw_connection()
            .execute(
                "UPDATE cards SET repetitions = -2 WHERE id = ?1",
                params![card_id],
            )
            .unwrap();

        let result = service.process_review(card_id, q(4));
        assert!(matches!(
            result,
            Err(ReviewError::Store(StoreError::Schedule(
                ScheduleError::CorruptState(_)
            )))
        ));
        assert!(service.store().leaderboard(10).unwrap().is_empty());
    }

    #[test]
    fn test_missing_card() {
        let (service, _) = setup();
        assert!(service.process_review(99, q(4)).is_err());
    }

    #[test]
    fn test_tenth_review_unlocks_achievement() {
        let (service, card_id) = setup();
        for _ in 0..9 {
            assert!(service.process_review(card_id, q(4)).unwrap().achievements.is_empty());
        }
        let tenth = service.process_review(card_id, q(4)).unwrap();
        assert_eq!(tenth.achievements.len(), 1);
        assert_eq!(tenth.achievements[0].title, "Rookie Reviewer");
    }

    #[test]
    fn test_reward_failure_reports_saved_review() {
        let (service, card_id) = setup();
        let service = ReviewService::with_parts(
            RewardsUnavailable(service.store),
            FixedClock::new(start()),
            ImmediateGraduation,
        );

        let err = service.process_review(card_id, q(4)).unwrap_err();
        assert!(err.review_saved());
        let ReviewError::Reward { updated, .. } = err else {
            panic!("expected a reward error");
        };
        assert_eq!(updated.repetitions, 1);
        assert_eq!(service.store().load_card(card_id).unwrap().scheduling, updated);
    }

    #[test]
    fn test_points_for() {
        assert_eq!(points_for(q(0)), 1);
        assert_eq!(points_for(q(2)), 1);
        assert_eq!(points_for(q(3)), 10);
        assert_eq!(points_for(q(5)), 10);
    }
}
