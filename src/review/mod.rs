//! Review workflow: rate a card, reschedule it, persist it, reward the user.

pub mod service;
pub mod session;

use crate::database::StoreError;
use crate::models::{ScheduleError, SchedulingState};

pub use service::{FAILURE_POINTS, ReviewReport, ReviewService, SUCCESS_POINTS, points_for};
pub use session::StudySession;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Bad rating or corrupt prior state; nothing was written
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    /// Loading or saving the card failed; the review did not happen
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The card was rescheduled and saved, but points or achievements were
    /// not recorded. Rating the card again would review it twice.
    #[error("Review of card {card_id} was saved, but rewards could not be recorded: {source}")]
    Reward {
        card_id: i64,
        updated: SchedulingState,
        source: StoreError,
    },
}

impl ReviewError {
    /// True when the card's new state is already stored.
    pub fn review_saved(&self) -> bool {
        matches!(self, ReviewError::Reward { .. })
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::database::{self, CardStore, Database, RewardLedger, StoreError};
    use crate::models::{Achievement, Card, SchedulingState};
    use chrono::{DateTime, Utc};

    /// Real card storage with a reward ledger that always fails.
    pub(crate) struct RewardsUnavailable(pub Database);

    impl CardStore for RewardsUnavailable {
        fn load_card(&self, card_id: i64) -> database::Result<Card> {
            self.0.load_card(card_id)
        }

        fn due_cards(&self, deck_id: i64, now: DateTime<Utc>) -> database::Result<Vec<Card>> {
            self.0.due_cards(deck_id, now)
        }

        fn save_review(&self, card_id: i64, state: &SchedulingState) -> database::Result<()> {
            self.0.save_review(card_id, state)
        }
    }

    impl RewardLedger for RewardsUnavailable {
        fn award_points(&self, _user_id: &str, _points: i64) -> database::Result<()> {
            Err(StoreError::Database(rusqlite::Error::InvalidQuery))
        }

        fn check_achievements(
            &self,
            _user_id: &str,
            _now: DateTime<Utc>,
        ) -> database::Result<Vec<Achievement>> {
            Ok(Vec::new())
        }
    }
}
