//! JSON import/export module for flashcard decks.
//! Only deck metadata and card content travel; scheduling state starts fresh on import.

use crate::database::{Database, StoreError};
use crate::models::{Flashcard, NewDeck};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Portable form of a deck
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeckFile {
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub cards: Vec<Flashcard>,
}

/// Writes a deck file as pretty-printed JSON.
pub fn write_deck_file(deck: &DeckFile, path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, deck)?;
    writer.flush()?;
    Ok(())
}

/// Reads a deck file. Fails if the file doesn't exist or contains invalid JSON.
pub fn read_deck_file(path: impl AsRef<Path>) -> Result<DeckFile> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Exports a stored deck and its cards to `path`.
pub fn export_deck(db: &Database, deck_id: i64, path: impl AsRef<Path>) -> Result<()> {
    let deck = db
        .get_deck(deck_id)?
        .ok_or(StoreError::DeckNotFound(deck_id))?;
    let cards = db.deck_cards(deck_id)?;

    let file = DeckFile {
        title: deck.title,
        category: deck.category,
        cards: cards.into_iter().map(|card| card.content).collect(),
    };
    write_deck_file(&file, path.as_ref())?;

    info!(deck_id, path = %path.as_ref().display(), cards = file.cards.len(), "Deck exported");
    Ok(())
}

/// Imports a deck file as a new private deck owned by `owner_id`.
/// Returns the new deck ID.
pub fn import_deck(
    db: &Database,
    owner_id: &str,
    path: impl AsRef<Path>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let file = read_deck_file(path.as_ref())?;

    let deck_id = db.create_deck(
        owner_id,
        &NewDeck {
            title: file.title.clone(),
            category: file.category.clone(),
            is_public: false,
        },
        now,
    )?;
    for card in &file.cards {
        db.create_card(owner_id, deck_id, card, now)?;
    }

    info!(deck_id, title = %file.title, path = %path.as_ref().display(), "Deck imported");
    Ok(deck_id)
}
