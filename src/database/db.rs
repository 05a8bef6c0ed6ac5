//! Database operations for flashcard application
//!
//! Handles SQLite schema initialization, CRUD operations for decks and cards,
//! scheduling-state updates and the point/achievement ledger.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC text, so string order in
//! SQL matches time order and the due-card query is a plain range filter.
//! Writes of instants outside years 0000-9999 are refused.

use super::{CardStore, Result, RewardLedger, StoreError};
use crate::models::gamification::MILESTONES;
use crate::models::sm2::MAX_DUE_YEAR;
use crate::models::{
    Achievement, Card, Deck, Flashcard, LeaderboardEntry, LifecycleState, NewDeck,
    SchedulingState,
};
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use tracing::{debug, info};

pub const DEFAULT_LEADERBOARD_SIZE: usize = 50;

const CARD_COLUMNS: &str = "id, deck_id, owner_id, front, back, interval_days, ease_factor, \
                            repetitions, due_at, status, created_at";

const DECK_COLUMNS: &str = "id, owner_id, title, category, is_public, card_count, created_at";

/// SQLite-backed store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (creating if needed) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened flashcard database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    #[cfg(test)]
    pub(crate) fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates tables for decks, cards, users and achievements
    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                is_public INTEGER NOT NULL DEFAULT 0,
                card_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                deck_id INTEGER NOT NULL,
                owner_id TEXT NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                interval_days INTEGER NOT NULL DEFAULT 0,
                ease_factor REAL NOT NULL DEFAULT 2.5,
                repetitions INTEGER NOT NULL DEFAULT 0,
                due_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                created_at TEXT NOT NULL,
                FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_cards_deck_due ON cards(deck_id, due_at);

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                points INTEGER NOT NULL DEFAULT 0,
                total_reviews INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS achievements (
                user_id TEXT NOT NULL,
                achievement_id TEXT NOT NULL,
                title TEXT NOT NULL,
                unlocked_at TEXT NOT NULL,
                PRIMARY KEY (user_id, achievement_id)
            );",
        )?;

        Ok(Self { conn })
    }

    // ------------------------------------------------------------------
    // Decks
    // ------------------------------------------------------------------

    /// Creates a new deck and returns its ID
    pub fn create_deck(&self, owner_id: &str, deck: &NewDeck, now: DateTime<Utc>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO decks (owner_id, title, category, is_public, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                owner_id,
                deck.title,
                deck.category,
                deck.is_public,
                encode_time(now)?
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(deck_id = id, title = %deck.title, "Deck created");
        Ok(id)
    }

    pub fn get_deck(&self, deck_id: i64) -> Result<Option<Deck>> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = ?1"),
                params![deck_id],
                DeckRow::from_row,
            )
            .optional()?;
        raw.map(DeckRow::into_deck).transpose()
    }

    /// Decks owned by a user, newest first
    pub fn user_decks(&self, owner_id: &str) -> Result<Vec<Deck>> {
        self.query_decks(
            &format!(
                "SELECT {DECK_COLUMNS} FROM decks WHERE owner_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ),
            params![owner_id],
        )
    }

    /// Decks shared publicly by any user, newest first
    pub fn public_decks(&self) -> Result<Vec<Deck>> {
        self.query_decks(
            &format!(
                "SELECT {DECK_COLUMNS} FROM decks WHERE is_public = 1
                 ORDER BY created_at DESC, id DESC"
            ),
            [],
        )
    }

    /// Deletes a deck together with all of its cards
    pub fn delete_deck(&self, deck_id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM decks WHERE id = ?1", params![deck_id])?;
        if deleted == 0 {
            return Err(StoreError::DeckNotFound(deck_id));
        }
        info!(deck_id, "Deck deleted");
        Ok(())
    }

    fn query_decks(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, DeckRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(DeckRow::into_deck).collect()
    }

    // ------------------------------------------------------------------
    // Cards
    // ------------------------------------------------------------------

    /// Adds a card to a deck with fresh scheduling state and bumps the
    /// deck's card count in the same transaction. Returns the card ID.
    pub fn create_card(
        &self,
        owner_id: &str,
        deck_id: i64,
        content: &Flashcard,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let state = SchedulingState::new_card(now);
        let tx = self.conn.unchecked_transaction()?;

        let updated = tx.execute(
            "UPDATE decks SET card_count = card_count + 1 WHERE id = ?1",
            params![deck_id],
        )?;
        if updated == 0 {
            return Err(StoreError::DeckNotFound(deck_id));
        }

        tx.execute(
            "INSERT INTO cards (deck_id, owner_id, front, back, interval_days, ease_factor,
                                repetitions, due_at, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                deck_id,
                owner_id,
                content.front,
                content.back,
                state.interval_days,
                state.ease_factor,
                state.repetitions,
                encode_time(state.due_at)?,
                state.lifecycle.as_str(),
                encode_time(now)?
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(card_id = id, deck_id, "Card created");
        Ok(id)
    }

    /// Retrieves all cards of a deck in creation order
    pub fn deck_cards(&self, deck_id: i64) -> Result<Vec<Card>> {
        self.query_cards(
            &format!("SELECT {CARD_COLUMNS} FROM cards WHERE deck_id = ?1 ORDER BY id"),
            params![deck_id],
        )
    }

    /// Edits front/back text without touching the scheduling state
    pub fn update_card_content(&self, card_id: i64, content: &Flashcard) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE cards SET front = ?1, back = ?2 WHERE id = ?3",
            params![content.front, content.back, card_id],
        )?;
        if updated == 0 {
            return Err(StoreError::CardNotFound(card_id));
        }
        Ok(())
    }

    /// Removes a card and decrements its deck's card count
    pub fn delete_card(&self, card_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let deck_id: i64 = tx
            .query_row(
                "SELECT deck_id FROM cards WHERE id = ?1",
                params![card_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::CardNotFound(card_id))?;

        tx.execute("DELETE FROM cards WHERE id = ?1", params![card_id])?;
        tx.execute(
            "UPDATE decks SET card_count = MAX(card_count - 1, 0) WHERE id = ?1",
            params![deck_id],
        )?;
        tx.commit()?;

        debug!(card_id, deck_id, "Card deleted");
        Ok(())
    }

    fn query_cards(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, CardRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(CardRow::into_card).collect()
    }

    // ------------------------------------------------------------------
    // Rewards
    // ------------------------------------------------------------------

    pub fn achievements(&self, user_id: &str) -> Result<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT achievement_id, title, unlocked_at FROM achievements
             WHERE user_id = ?1 ORDER BY unlocked_at, achievement_id",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, title, unlocked_at)| {
                Ok(Achievement {
                    id,
                    title,
                    unlocked_at: decode_time(&unlocked_at)?,
                })
            })
            .collect()
    }

    /// Users ordered by points, highest first
    pub fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, points, total_reviews FROM users
             ORDER BY points DESC, id ASC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(LeaderboardEntry {
                    user_id: row.get(0)?,
                    points: row.get(1)?,
                    total_reviews: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn total_reviews(&self, user_id: &str) -> Result<i64> {
        let total = self
            .conn
            .query_row(
                "SELECT total_reviews FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(total.unwrap_or(0))
    }
}

impl CardStore for Database {
    fn load_card(&self, card_id: i64) -> Result<Card> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?1"),
                params![card_id],
                CardRow::from_row,
            )
            .optional()?
            .ok_or(StoreError::CardNotFound(card_id))?;
        raw.into_card()
    }

    fn due_cards(&self, deck_id: i64, now: DateTime<Utc>) -> Result<Vec<Card>> {
        self.query_cards(
            &format!(
                "SELECT {CARD_COLUMNS} FROM cards
                 WHERE deck_id = ?1 AND due_at <= ?2
                 ORDER BY due_at ASC, id ASC"
            ),
            params![deck_id, encode_time(now)?],
        )
    }

    fn save_review(&self, card_id: i64, state: &SchedulingState) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE cards
             SET interval_days = ?1, ease_factor = ?2, repetitions = ?3, due_at = ?4, status = ?5
             WHERE id = ?6",
            params![
                state.interval_days,
                state.ease_factor,
                state.repetitions,
                encode_time(state.due_at)?,
                state.lifecycle.as_str(),
                card_id
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::CardNotFound(card_id));
        }
        Ok(())
    }
}

impl RewardLedger for Database {
    fn award_points(&self, user_id: &str, points: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (id, points, total_reviews) VALUES (?1, ?2, 1)
             ON CONFLICT(id) DO UPDATE SET
                points = points + excluded.points,
                total_reviews = total_reviews + 1",
            params![user_id, points],
        )?;
        Ok(())
    }

    fn check_achievements(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Achievement>> {
        let reviews = self.total_reviews(user_id)?;
        let mut unlocked = Vec::new();

        for &(threshold, id, title) in MILESTONES {
            if reviews < threshold {
                continue;
            }
            let inserted = self.conn.execute(
                "INSERT OR IGNORE INTO achievements (user_id, achievement_id, title, unlocked_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![user_id, id, title, encode_time(now)?],
            )?;
            if inserted == 1 {
                info!(user_id, achievement = id, "Achievement unlocked: {}", title);
                unlocked.push(Achievement {
                    id: id.to_string(),
                    title: title.to_string(),
                    unlocked_at: now,
                });
            }
        }

        Ok(unlocked)
    }
}

/// Only four-digit years keep the text fixed width and ordered.
fn encode_time(time: DateTime<Utc>) -> Result<String> {
    if !(0..=MAX_DUE_YEAR).contains(&time.year()) {
        return Err(StoreError::InvalidTimestamp(time.to_rfc3339()));
    }
    Ok(time.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn decode_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp(text.to_string()))
}

/// Column values of one `cards` row before validation
struct CardRow {
    id: i64,
    deck_id: i64,
    owner_id: String,
    front: String,
    back: String,
    interval_days: i64,
    ease_factor: f64,
    repetitions: i64,
    due_at: String,
    status: String,
    created_at: String,
}

impl CardRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            deck_id: row.get(1)?,
            owner_id: row.get(2)?,
            front: row.get(3)?,
            back: row.get(4)?,
            interval_days: row.get(5)?,
            ease_factor: row.get(6)?,
            repetitions: row.get(7)?,
            due_at: row.get(8)?,
            status: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_card(self) -> Result<Card> {
        let lifecycle: LifecycleState = self.status.parse()?;
        let scheduling = SchedulingState::from_raw(
            self.interval_days,
            self.ease_factor,
            self.repetitions,
            decode_time(&self.due_at)?,
            lifecycle,
        )?;

        Ok(Card {
            id: self.id,
            deck_id: self.deck_id,
            owner_id: self.owner_id,
            content: Flashcard {
                front: self.front,
                back: self.back,
            },
            scheduling,
            created_at: decode_time(&self.created_at)?,
        })
    }
}

struct DeckRow {
    id: i64,
    owner_id: String,
    title: String,
    category: String,
    is_public: bool,
    card_count: u32,
    created_at: String,
}

impl DeckRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            title: row.get(2)?,
            category: row.get(3)?,
            is_public: row.get(4)?,
            card_count: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_deck(self) -> Result<Deck> {
        Ok(Deck {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            category: self.category,
            is_public: self.is_public,
            card_count: self.card_count,
            created_at: decode_time(&self.created_at)?,
        })
    }
}
