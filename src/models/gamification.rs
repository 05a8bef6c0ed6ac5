//! Point and achievement records kept per user.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub unlocked_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub points: i64,
    pub total_reviews: i64,
}

/// Review-count milestones: (review count, achievement id, title).
pub const MILESTONES: &[(i64, &str, &str)] = &[
    (10, "first_10_reviews", "Rookie Reviewer"),
    (100, "100_reviews", "Centurion"),
];
