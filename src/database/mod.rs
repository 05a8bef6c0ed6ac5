//! Persistence for decks, cards and per-user rewards.
//!
//! The review workflow only depends on the two traits below; `Database` is
//! the SQLite implementation used by the application.

pub mod db;

use crate::models::{Achievement, Card, ScheduleError, SchedulingState};
use chrono::{DateTime, Utc};

pub use db::Database;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Card not found: {0}")]
    CardNotFound(i64),
    #[error("Deck not found: {0}")]
    DeckNotFound(i64),
    /// Stored scheduling fields fail validation
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StoreError>;

/// Card access needed by the review workflow.
pub trait CardStore {
    fn load_card(&self, card_id: i64) -> Result<Card>;

    /// Every card of the deck with `due_at <= now`. No limit and no
    /// ordering guarantee.
    fn due_cards(&self, deck_id: i64, now: DateTime<Utc>) -> Result<Vec<Card>>;

    /// Replaces all scheduling fields of a card in a single update.
    fn save_review(&self, card_id: i64, state: &SchedulingState) -> Result<()>;
}

/// Point and achievement bookkeeping for reviewers.
pub trait RewardLedger {
    /// Adds points and counts one more review for the user.
    fn award_points(&self, user_id: &str, points: i64) -> Result<()>;

    /// Unlocks any review-count milestones the user has reached, returning
    /// only the ones unlocked by this call.
    fn check_achievements(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Achievement>>;
}
