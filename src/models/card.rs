//! Stored card: content plus its embedded scheduling state.
use super::{Flashcard, SchedulingState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub deck_id: i64,
    pub owner_id: String,
    pub content: Flashcard,
    pub scheduling: SchedulingState,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduling.is_due(now)
    }
}
