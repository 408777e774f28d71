//! SQLite-backed flashcard store
//!
//! Handles database initialization, deck and flashcard content, and the
//! per-learner SM-2 review state of every card.

use super::FlashcardStore;
use crate::error::StoreError;
use crate::models::{CardId, CardReviewState, Deck, DeckStats, Flashcard, LearnerId};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::path::Path;
use std::sync::Mutex;

type Result<T> = std::result::Result<T, StoreError>;

/// Opens (or creates) the database file and makes sure all tables exist.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    info!("Opened flashcard database at {}", path.display());
    Ok(conn)
}

/// Creates tables for decks, flashcards and review state.
///
/// Foreign keys are per-connection in SQLite, so this must run on every open.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            name TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_name TEXT NOT NULL,
            term TEXT NOT NULL,
            definition TEXT NOT NULL,
            FOREIGN KEY (deck_name) REFERENCES decks(name) ON DELETE CASCADE,
            UNIQUE(deck_name, term)
        );

        CREATE TABLE IF NOT EXISTS card_review_state (
            learner_id INTEGER NOT NULL,
            flashcard_id INTEGER NOT NULL,
            easiness_factor REAL NOT NULL,
            repetition_count INTEGER NOT NULL,
            interval_days INTEGER NOT NULL,
            due_at INTEGER NOT NULL,
            last_reviewed_at INTEGER,
            PRIMARY KEY (learner_id, flashcard_id),
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_review_state_due
            ON card_review_state (learner_id, due_at);",
    )?;
    Ok(())
}

fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or(StoreError::CorruptTimestamp(millis))
}

pub fn deck_exists(name: &str, conn: &Connection) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM decks WHERE name = ?1", params![name], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Creates a deck. Returns false if it already existed.
pub fn new_deck(name: &str, conn: &Connection) -> Result<bool> {
    let created =
        conn.execute("INSERT OR IGNORE INTO decks (name) VALUES (?1)", params![name])? > 0;
    if created {
        info!("Deck '{}' created", name);
    }
    Ok(created)
}

/// Adds a flashcard to a deck and returns its id.
///
/// If a flashcard with the same term already exists in the deck, the existing id
/// is returned and the definition is left untouched.
pub fn add_flashcard(
    deck_name: &str,
    term: &str,
    definition: &str,
    conn: &Connection,
) -> Result<CardId> {
    if !deck_exists(deck_name, conn)? {
        return Err(StoreError::DeckNotFound(deck_name.to_string()));
    }

    conn.execute(
        "INSERT OR IGNORE INTO flashcards (deck_name, term, definition) VALUES (?1, ?2, ?3)",
        params![deck_name, term, definition],
    )?;

    let flashcard_id: CardId = conn.query_row(
        "SELECT id FROM flashcards WHERE deck_name = ?1 AND term = ?2",
        params![deck_name, term],
        |row| row.get(0),
    )?;

    Ok(flashcard_id)
}

pub fn get_flashcard(card_id: CardId, conn: &Connection) -> Result<Option<Flashcard>> {
    let card = conn
        .query_row(
            "SELECT term, definition FROM flashcards WHERE id = ?1",
            params![card_id],
            |row| {
                Ok(Flashcard {
                    term: row.get(0)?,
                    definition: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(card)
}

/// Deletes a flashcard; its review state for every learner goes with it.
pub fn delete_flashcard(card_id: CardId, conn: &Connection) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM flashcards WHERE id = ?1", params![card_id])? > 0;
    Ok(deleted)
}

/// Retrieves all flashcards of a deck as (id, flashcard) pairs, ascending by id.
pub fn get_flashcards_for_deck(
    deck_name: &str,
    conn: &Connection,
) -> Result<Vec<(CardId, Flashcard)>> {
    let mut stmt = conn.prepare(
        "SELECT id, term, definition FROM flashcards WHERE deck_name = ?1 ORDER BY id",
    )?;

    let flashcards = stmt
        .query_map(params![deck_name], |row| {
            Ok((
                row.get(0)?,
                Flashcard {
                    term: row.get(1)?,
                    definition: row.get(2)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<(CardId, Flashcard)>>>()?;

    Ok(flashcards)
}

pub fn get_all_decks(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM decks ORDER BY name")?;
    let decks = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(decks)
}

/// Loads a deck with its flashcards, without any review state.
pub fn load_deck(name: &str, conn: &Connection) -> Result<Deck> {
    if !deck_exists(name, conn)? {
        return Err(StoreError::DeckNotFound(name.to_string()));
    }

    let flashcards = get_flashcards_for_deck(name, conn)?
        .into_iter()
        .map(|(_, card)| card)
        .collect();

    Ok(Deck {
        name: name.to_string(),
        flashcards,
    })
}

/// Writes a deck and its cards in one transaction. Returns how many cards were new.
pub fn store_deck(deck: &Deck, conn: &Connection) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    new_deck(&deck.name, &tx)?;

    let mut inserted = 0;
    for card in &deck.flashcards {
        if card.is_blank() {
            warn!("Skipping flashcard with a blank side in deck '{}'", deck.name);
            continue;
        }
        inserted += tx.execute(
            "INSERT OR IGNORE INTO flashcards (deck_name, term, definition) VALUES (?1, ?2, ?3)",
            params![deck.name, card.term, card.definition],
        )?;
    }

    tx.commit()?;
    Ok(inserted)
}

pub fn load_state(
    learner_id: LearnerId,
    card_id: CardId,
    conn: &Connection,
) -> Result<Option<CardReviewState>> {
    let row = conn
        .query_row(
            "SELECT easiness_factor, repetition_count, interval_days, due_at, last_reviewed_at
             FROM card_review_state
             WHERE learner_id = ?1 AND flashcard_id = ?2",
            params![learner_id, card_id],
            |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((easiness_factor, repetition_count, interval_days, due_at, last_reviewed_at)) = row
    else {
        return Ok(None);
    };

    Ok(Some(CardReviewState {
        easiness_factor,
        repetition_count,
        interval_days,
        due_at: from_millis(due_at)?,
        last_reviewed_at: last_reviewed_at.map(from_millis).transpose()?,
    }))
}

/// Upserts review state, refusing to replace a row reviewed later than `state`.
pub fn save_state(
    learner_id: LearnerId,
    card_id: CardId,
    state: &CardReviewState,
    conn: &Connection,
) -> Result<()> {
    let changed = conn.execute(
        "INSERT INTO card_review_state
            (learner_id, flashcard_id, easiness_factor, repetition_count,
             interval_days, due_at, last_reviewed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (learner_id, flashcard_id) DO UPDATE SET
            easiness_factor = excluded.easiness_factor,
            repetition_count = excluded.repetition_count,
            interval_days = excluded.interval_days,
            due_at = excluded.due_at,
            last_reviewed_at = excluded.last_reviewed_at
         WHERE card_review_state.last_reviewed_at IS NULL
            OR excluded.last_reviewed_at >= card_review_state.last_reviewed_at",
        params![
            learner_id,
            card_id,
            state.easiness_factor,
            state.repetition_count,
            state.interval_days,
            to_millis(state.due_at),
            state.last_reviewed_at.map(to_millis),
        ],
    )?;

    if changed == 0 {
        warn!("Rejected out-of-order review for learner {} card {}", learner_id, card_id);
        return Err(StoreError::StaleWrite { learner_id, card_id });
    }

    debug!(
        "Saved review state for learner {} card {}: interval {}d, due {}",
        learner_id, card_id, state.interval_days, state.due_at
    );
    Ok(())
}

/// Card counts of a deck for one learner as of `as_of`.
pub fn deck_stats(
    learner_id: LearnerId,
    deck_name: &str,
    as_of: DateTime<Utc>,
    conn: &Connection,
) -> Result<DeckStats> {
    if !deck_exists(deck_name, conn)? {
        return Err(StoreError::DeckNotFound(deck_name.to_string()));
    }

    let (total, new, due): (i64, i64, i64) = conn.query_row(
        "SELECT COUNT(*),
                COALESCE(SUM(CASE WHEN r.flashcard_id IS NULL THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN r.flashcard_id IS NULL OR r.due_at <= ?3
                                  THEN 1 ELSE 0 END), 0)
         FROM flashcards f
         LEFT JOIN card_review_state r ON r.flashcard_id = f.id AND r.learner_id = ?2
         WHERE f.deck_name = ?1",
        params![deck_name, learner_id, to_millis(as_of)],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(DeckStats {
        total_cards: total as usize,
        new_cards: new as usize,
        due_cards: due as usize,
    })
}

/// [`FlashcardStore`] over a single SQLite connection.
///
/// Access is serialized through a mutex, so one store can be shared between threads.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::from_connection(init_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }
}

impl FlashcardStore for SqliteStore {
    fn load_state(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
    ) -> Result<Option<CardReviewState>> {
        self.with_conn(|conn| load_state(learner_id, card_id, conn))
    }

    fn save_state(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
        state: &CardReviewState,
    ) -> Result<()> {
        self.with_conn(|conn| save_state(learner_id, card_id, state, conn))
    }

    /// Read, update and write inside one `BEGIN IMMEDIATE` transaction.
    fn update_state(
        &self,
        learner_id: LearnerId,
        card_id: CardId,
        update: &dyn Fn(Option<CardReviewState>) -> CardReviewState,
    ) -> Result<CardReviewState> {
        self.with_conn(|conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
            let next = update(load_state(learner_id, card_id, &tx)?);
            save_state(learner_id, card_id, &next, &tx)?;
            tx.commit()?;
            Ok(next)
        })
    }

    fn load_candidate_card_ids(
        &self,
        learner_id: LearnerId,
        deck_name: &str,
    ) -> Result<Vec<CardId>> {
        let ids: Vec<CardId> = self.with_conn(|conn| {
            if !deck_exists(deck_name, conn)? {
                return Err(StoreError::DeckNotFound(deck_name.to_string()));
            }
            let mut stmt =
                conn.prepare("SELECT id FROM flashcards WHERE deck_name = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map(params![deck_name], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<CardId>>>()?;
            Ok(ids)
        })?;

        debug!(
            "Learner {} has {} candidate cards in deck '{}'",
            learner_id,
            ids.len(),
            deck_name
        );
        Ok(ids)
    }
}
