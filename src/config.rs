//! Runtime configuration shared by every CLI command.
//!
//! Each setting comes from a flag, falling back to an environment variable and
//! then to a default.

use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "flashcards.sqlite3";
pub const DEFAULT_USER: &str = "local";

#[derive(Args, Clone, Debug)]
pub struct Config {
    /// SQLite database file
    #[arg(long, global = true, env = "FLASHCARDS_DB", default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// User that owns created decks and earns review points
    #[arg(long, global = true, env = "FLASHCARDS_USER", default_value = DEFAULT_USER)]
    pub user: String,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long, global = true, value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,

    /// Log filter, e.g. `info` or `flashcards_app=debug`
    #[arg(long, global = true, env = "RUST_LOG", default_value = "warn")]
    pub log: String,
}

impl Config {
    /// The `--now` override, or the wall clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp such as 2024-05-01T09:00:00Z: {e}"))
}
