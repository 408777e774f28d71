//! JSON import/export of flashcard decks.
//! Decks travel as `{ "name": ..., "flashcards": [{ "term": ..., "definition": ... }] }`.

use crate::database::SqliteStore;
use crate::database::db::{load_deck, store_deck};
use crate::error::ImportError;
use crate::models::Deck;
use log::info;
use std::fs;
use std::path::Path;

/// Writes a deck to a pretty-printed JSON file.
pub fn export_json_to_path(deck: &Deck, path: &Path) -> Result<(), ImportError> {
    let json_string = serde_json::to_string_pretty(deck)?;
    fs::write(path, json_string)?;
    Ok(())
}

/// Reads a deck from a JSON file.
pub fn import_json(path: &Path) -> Result<Deck, ImportError> {
    let contents = fs::read_to_string(path)?;
    let deck: Deck = serde_json::from_str(&contents)?;
    Ok(deck)
}

/// Imports a deck file into the store. Returns the deck and how many cards were new.
pub fn import_deck_file(path: &Path, store: &SqliteStore) -> Result<(Deck, usize), ImportError> {
    let deck = import_json(path)?;
    let inserted = store.with_conn(|conn| store_deck(&deck, conn))?;
    info!(
        "Deck '{}' imported from '{}': {} new of {} cards",
        deck.name,
        path.display(),
        inserted,
        deck.flashcards.len()
    );
    Ok((deck, inserted))
}

/// Exports a stored deck to a JSON file.
pub fn export_deck_file(
    deck_name: &str,
    path: &Path,
    store: &SqliteStore,
) -> Result<Deck, ImportError> {
    let deck = store.with_conn(|conn| load_deck(deck_name, conn))?;
    export_json_to_path(&deck, path)?;
    info!("Deck '{}' exported to '{}'", deck.name, path.display());
    Ok(deck)
}
