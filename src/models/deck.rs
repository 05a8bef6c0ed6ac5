//! Deck is a named set of cards owned by one user
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub owner_id: String,
    pub title: String,
    pub category: String,
    pub is_public: bool,
    pub card_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a deck.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewDeck {
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_public: bool,
}

impl NewDeck {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: String::new(),
            is_public: false,
        }
    }
}
