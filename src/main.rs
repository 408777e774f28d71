mod app;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use flashcards_app::database::db::{deck_stats, get_all_decks, get_flashcards_for_deck};
use flashcards_app::export::json::{export_deck_file, import_deck_file};
use flashcards_app::models::{CardId, LearnerId};
use flashcards_app::{Config, SqliteStore, StudySession};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flashcards", about = "Spaced-repetition flashcards", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Import a deck from a JSON file
    Import { file: PathBuf },

    /// Export a deck to a JSON file
    Export { deck: String, file: PathBuf },

    /// List decks with their card counts
    Decks,

    /// List every card due for a learner, oldest first (ignores the session limit)
    Due {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long)]
        deck: String,
        /// Point in time to evaluate (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_timestamp)]
        as_of: Option<DateTime<Utc>>,
    },

    /// Record one review of a card
    Review {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long)]
        card: CardId,
        /// Recall quality, 0 (blackout) to 5 (perfect)
        #[arg(long, allow_negative_numbers = true)]
        quality: i64,
    },

    /// Study the due cards of a deck interactively
    Study {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long)]
        deck: String,
    },

    /// Show review counts of a deck for a learner
    Stats {
        #[arg(long)]
        learner: LearnerId,
        #[arg(long)]
        deck: String,
    },
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|time| time.with_timezone(&Utc))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })?;
    let session = StudySession::new(store, config.sm2.clone(), config.session_limit);
    let json = matches!(cli.format, OutputFormat::Json);

    match cli.command {
        Command::Import { file } => {
            let (deck, inserted) = import_deck_file(&file, session.store())
                .with_context(|| format!("Failed to import {}", file.display()))?;
            if json {
                let output = serde_json::json!({ "deck": deck.name, "inserted": inserted });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!(
                    "Imported '{}': {} new of {} cards",
                    deck.name,
                    inserted,
                    deck.flashcards.len()
                );
            }
        }
        Command::Export { deck, file } => {
            let deck = export_deck_file(&deck, &file, session.store())
                .with_context(|| format!("Failed to export to {}", file.display()))?;
            if json {
                let output = serde_json::json!({
                    "deck": deck.name,
                    "cards": deck.flashcards.len(),
                    "file": file.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Exported '{}' to {}", deck.name, file.display());
            }
        }
        Command::Decks => {
            let decks = session.store().with_conn(|conn| {
                get_all_decks(conn)?
                    .into_iter()
                    .map(|name| {
                        let count = get_flashcards_for_deck(&name, conn)?.len();
                        Ok((name, count))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })?;
            if json {
                let output: Vec<_> = decks
                    .iter()
                    .map(|(name, count)| serde_json::json!({ "name": name, "cards": count }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for (name, count) in &decks {
                    println!("  - {} ({} cards)", name, count);
                }
            }
        }
        Command::Due { learner, deck, as_of } => {
            let as_of = as_of.unwrap_or_else(Utc::now);
            let cards: Vec<CardId> =
                session.deck_due_cards(learner, &deck, as_of)?.into_iter().collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&cards)?);
            } else if cards.is_empty() {
                println!("No cards due in '{}'", deck);
            } else {
                for card_id in cards {
                    println!("{}", card_id);
                }
            }
        }
        Command::Review { learner, card, quality } => {
            let state = session.submit_review(learner, card, quality)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                println!(
                    "Card {}: next review in {} day(s) on {} (EF {:.2})",
                    card,
                    state.interval_days,
                    state.due_at.format("%Y-%m-%d"),
                    state.easiness_factor
                );
            }
        }
        Command::Study { learner, deck } => {
            let stdin = std::io::stdin();
            app::run_study(&session, learner, &deck, stdin.lock(), std::io::stdout())?;
        }
        Command::Stats { learner, deck } => {
            let stats = session
                .store()
                .with_conn(|conn| deck_stats(learner, &deck, Utc::now(), conn))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Deck '{}' for learner {}", deck, learner);
                println!("  Total: {}", stats.total_cards);
                println!("  New:   {}", stats.new_cards);
                println!("  Due:   {}", stats.due_cards);
            }
        }
    }

    Ok(())
}
