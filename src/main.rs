use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use flashcards_app::config::Config;
use flashcards_app::database::db::DEFAULT_LEADERBOARD_SIZE;
use flashcards_app::export::json::{export_deck, import_deck};
use flashcards_app::models::{Card, Flashcard, Grade, NewDeck, Quality};
use flashcards_app::review::ReviewReport;
use flashcards_app::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flashcards", version, about = "Spaced-repetition flashcards")]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommand),
    /// Manage cards
    #[command(subcommand)]
    Card(CardCommand),
    /// List the cards of a deck that are due now
    Due { deck: i64 },
    /// Rate one card (0 = blackout … 5 = perfect)
    Review {
        card: i64,
        #[arg(allow_negative_numbers = true)]
        quality: i64,
    },
    /// Review every due card of a deck interactively
    Study { deck: i64 },
    /// Write a deck to a JSON file
    Export { deck: i64, path: PathBuf },
    /// Create a deck from a JSON file
    Import { path: PathBuf },
    /// Show the users with the most points
    Leaderboard {
        #[arg(long, default_value_t = DEFAULT_LEADERBOARD_SIZE)]
        limit: usize,
    },
    /// Show the current user's achievements
    Achievements,
}

#[derive(Subcommand)]
enum DeckCommand {
    Create {
        title: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        public: bool,
    },
    List {
        /// Show public decks of every user instead of your own
        #[arg(long)]
        public: bool,
    },
    Delete {
        id: i64,
    },
}

#[derive(Subcommand)]
enum CardCommand {
    Add { deck: i64, front: String, back: String },
    List { deck: i64 },
    Edit { id: i64, front: String, back: String },
    Delete { id: i64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.config.log).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = cli.config;
    let db = Database::open(&config.db)
        .with_context(|| format!("Failed to open database {}", config.db.display()))?;
    let now = config.now();

    match cli.command {
        Command::Deck(DeckCommand::Create {
            title,
            category,
            public,
        }) => {
            let id = db.create_deck(
                &config.user,
                &NewDeck {
                    title: title.clone(),
                    category,
                    is_public: public,
                },
                now,
            )?;
            println!("Deck '{}' created with id {}.", title, id);
        }
        Command::Deck(DeckCommand::List { public }) => {
            let decks = if public {
                db.public_decks()?
            } else {
                db.user_decks(&config.user)?
            };
            for deck in decks {
                println!(
                    "{:>4}  {} ({} cards){}",
                    deck.id,
                    deck.title,
                    deck.card_count,
                    if deck.is_public { " [public]" } else { "" }
                );
            }
        }
        Command::Deck(DeckCommand::Delete { id }) => {
            db.delete_deck(id)?;
            println!("Deck {} deleted.", id);
        }
        Command::Card(CardCommand::Add { deck, front, back }) => {
            let id = db.create_card(&config.user, deck, &Flashcard::new(front, back), now)?;
            println!("Card {} added.", id);
        }
        Command::Card(CardCommand::List { deck }) => {
            for card in db.deck_cards(deck)? {
                print_card(&card);
            }
        }
        Command::Card(CardCommand::Edit { id, front, back }) => {
            db.update_card_content(id, &Flashcard::new(front, back))?;
            println!("Card {} updated.", id);
        }
        Command::Card(CardCommand::Delete { id }) => {
            db.delete_card(id)?;
            println!("Card {} deleted.", id);
        }
        Command::Due { deck } => {
            let cards = db.due_cards(deck, now)?;
            println!("{} cards due", cards.len());
            for card in &cards {
                print_card(card);
            }
        }
        Command::Review { card, quality } => {
            let service = review_service(db, now);
            let report = service.process_rating(card, quality)?;
            print_report(&report);
        }
        Command::Study { deck } => {
            let service = review_service(db, now);
            study(&service, deck)?;
        }
        Command::Export { deck, path } => {
            export_deck(&db, deck, &path)?;
            println!("Deck {} exported to '{}'.", deck, path.display());
        }
        Command::Import { path } => {
            let id = import_deck(&db, &config.user, &path, now)?;
            println!("Deck imported from '{}' with id {}.", path.display(), id);
        }
        Command::Leaderboard { limit } => {
            for (rank, entry) in db.leaderboard(limit)?.iter().enumerate() {
                println!(
                    "{:>3}. {:<20} {:>6} points  {:>5} reviews",
                    rank + 1,
                    entry.user_id,
                    entry.points,
                    entry.total_reviews
                );
            }
        }
        Command::Achievements => {
            for achievement in db.achievements(&config.user)? {
                println!(
                    "{}  {}",
                    achievement.unlocked_at.format("%Y-%m-%d"),
                    achievement.title
                );
            }
        }
    }

    Ok(())
}

fn review_service(db: Database, now: DateTime<Utc>) -> ReviewService<Database, FixedClock> {
    ReviewService::with_parts(db, FixedClock::new(now), models::ImmediateGraduation)
}

fn study(service: &ReviewService<Database, FixedClock>, deck_id: i64) -> Result<()> {
    let mut session = StudySession::start(service, deck_id)?;
    if session.is_completed() {
        println!("No cards due. Come back later!");
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(card) = session.current_card() {
        let front = card.content.front.clone();
        let back = card.content.back.clone();

        println!();
        println!("[{}] {}", session.progress_message(), front);
        prompt("Press Enter to show the answer")?;
        if lines.next().transpose()?.is_none() {
            return Ok(());
        }
        session.toggle_back();
        println!("    {}", back);

        loop {
            prompt("Rate: again / hard / good / easy (or 0-5)")?;
            let Some(line) = lines.next().transpose()? else {
                return Ok(());
            };
            let quality = match parse_rating(&line) {
                Ok(quality) => quality,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };
            match session.grade_current_card(quality) {
                Ok(Some(report)) => {
                    print_report(&report);
                    break;
                }
                Ok(None) => break,
                Err(e) if e.review_saved() => {
                    println!("{}", e);
                    break;
                }
                Err(e) => println!("The review was not saved ({}). Try rating again.", e),
            }
        }
    }

    println!();
    println!("{}", session.progress_message());
    Ok(())
}

fn parse_rating(input: &str) -> Result<Quality> {
    let grade = match input.trim().to_lowercase().as_str() {
        "again" | "a" => Grade::Again,
        "hard" | "h" => Grade::Hard,
        "good" | "g" => Grade::Good,
        "easy" | "e" => Grade::Easy,
        "" => bail!("Please enter a rating."),
        other => return Ok(other.parse::<Quality>()?),
    };
    Ok(grade.quality())
}

fn prompt(message: &str) -> io::Result<()> {
    print!("{}: ", message);
    io::stdout().flush()
}

fn print_card(card: &Card) {
    println!(
        "{:>5}  {:<30} {:<30} {:<10} due {}",
        card.id,
        card.content.front,
        card.content.back,
        card.scheduling.lifecycle.as_str(),
        card.scheduling.due_at.format("%Y-%m-%d %H:%M")
    );
}

fn print_report(report: &ReviewReport) {
    println!(
        "Card {} → {} (next in {} day{}, due {}, ease {:.2}) +{} points",
        report.card_id,
        report.updated.lifecycle,
        report.updated.interval_days,
        if report.updated.interval_days == 1 { "" } else { "s" },
        report.updated.due_at.format("%Y-%m-%d"),
        report.updated.ease_factor,
        report.points_awarded
    );
    for achievement in &report.achievements {
        println!("Achievement unlocked: {}", achievement.title);
    }
}
