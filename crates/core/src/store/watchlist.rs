//! Per-profile watchlists.
//!
//! A watchlist is an ordered set of stored games. Entries reference the
//! internal id, so deleting a game drops it from every watchlist.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::sqlite::{now_timestamp, SqliteGameStore};
use super::StoreError;
use crate::game::Game;

/// Longest accepted profile id.
pub const MAX_PROFILE_ID_LEN: usize = 64;

/// Result of [`WatchlistStore::add_to_watchlist`].
#[derive(Debug, Clone)]
pub struct WatchlistAdd {
    /// The game the reference resolved to.
    pub game: Game,
    /// `false` if the game was already on the watchlist.
    pub added: bool,
}

/// Trait for profile watchlist storage.
pub trait WatchlistStore: Send + Sync {
    /// Append a game to a profile's watchlist. Adding a game twice is a no-op.
    ///
    /// `game_ref` is an internal id or a numeric external id.
    fn add_to_watchlist(&self, profile_id: &str, game_ref: &str)
        -> Result<WatchlistAdd, StoreError>;

    /// Remove a game from a profile's watchlist. Returns `false` if it was not listed.
    fn remove_from_watchlist(&self, profile_id: &str, game_ref: &str)
        -> Result<bool, StoreError>;

    /// The games on a profile's watchlist, in the order they were added.
    fn watchlist(&self, profile_id: &str) -> Result<Vec<Game>, StoreError>;
}

pub(super) fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS watchlist_entries (
            profile_id TEXT NOT NULL,
            game_id TEXT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            added_at TEXT NOT NULL,
            PRIMARY KEY (profile_id, game_id)
        );

        CREATE INDEX IF NOT EXISTS idx_watchlist_profile ON watchlist_entries(profile_id, position);
        "#,
    )?;
    Ok(())
}

fn validate_profile_id(profile_id: &str) -> Result<&str, StoreError> {
    let trimmed = profile_id.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("profile id is required".to_string()));
    }
    if trimmed.chars().count() > MAX_PROFILE_ID_LEN {
        return Err(StoreError::Validation(format!(
            "profile id must be at most {} characters",
            MAX_PROFILE_ID_LEN
        )));
    }
    Ok(trimmed)
}

/// Resolve an internal id, falling back to a numeric external id.
fn resolve_game(conn: &Connection, game_ref: &str) -> Result<Game, StoreError> {
    let game_ref = game_ref.trim();
    if let Some(game) = SqliteGameStore::get_by_id(conn, game_ref)? {
        return Ok(game);
    }

    if let Ok(external_id) = game_ref.parse::<i64>() {
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM games WHERE external_id = ?1",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = id {
            if let Some(game) = SqliteGameStore::get_by_id(conn, &id)? {
                return Ok(game);
            }
        }
    }

    Err(StoreError::NotFound(game_ref.to_string()))
}

impl WatchlistStore for SqliteGameStore {
    fn add_to_watchlist(
        &self,
        profile_id: &str,
        game_ref: &str,
    ) -> Result<WatchlistAdd, StoreError> {
        let profile_id = validate_profile_id(profile_id)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let game = resolve_game(&tx, game_ref)?;

        let rows = tx.execute(
            "INSERT INTO watchlist_entries (profile_id, game_id, position, added_at)
             VALUES (?1, ?2,
                     (SELECT COALESCE(MAX(position), -1) + 1
                      FROM watchlist_entries WHERE profile_id = ?1),
                     ?3)
             ON CONFLICT(profile_id, game_id) DO NOTHING",
            params![profile_id, &game.id, now_timestamp()],
        )?;
        tx.commit()?;

        let added = rows == 1;
        debug!(profile_id, game_id = %game.id, added, "Watchlist add");
        Ok(WatchlistAdd { game, added })
    }

    fn remove_from_watchlist(&self, profile_id: &str, game_ref: &str) -> Result<bool, StoreError> {
        let profile_id = validate_profile_id(profile_id)?;

        let conn = self.lock()?;
        let game = resolve_game(&conn, game_ref)?;
        let rows = conn.execute(
            "DELETE FROM watchlist_entries WHERE profile_id = ?1 AND game_id = ?2",
            params![profile_id, &game.id],
        )?;

        debug!(profile_id, game_id = %game.id, removed = rows > 0, "Watchlist remove");
        Ok(rows > 0)
    }

    fn watchlist(&self, profile_id: &str) -> Result<Vec<Game>, StoreError> {
        let profile_id = validate_profile_id(profile_id)?;

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT game_id FROM watchlist_entries WHERE profile_id = ?1 ORDER BY position",
        )?;
        let ids = stmt
            .query_map(params![profile_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut games = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(game) = SqliteGameStore::get_by_id(&conn, &id)? {
                games.push(game);
            }
        }
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::GameStore;
    use crate::sync::merge::normalize_record;
    use crate::testing::fixtures;

    fn create_test_store() -> SqliteGameStore {
        SqliteGameStore::in_memory().unwrap()
    }

    fn seed(store: &SqliteGameStore, external_id: i64, name: &str) -> Game {
        let record = fixtures::raw_record(external_id, name);
        store.upsert_from_remote(&normalize_record(&record)).unwrap().game
    }

    fn names(games: &[Game]) -> Vec<&str> {
        games.iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = create_test_store();
        let game = seed(&store, 1, "Hades");

        let first = store.add_to_watchlist("alice", &game.id).unwrap();
        assert!(first.added);
        assert_eq!(first.game.id, game.id);

        let second = store.add_to_watchlist("alice", &game.id).unwrap();
        assert!(!second.added);

        assert_eq!(store.watchlist("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_add_by_external_id_resolves_same_game() {
        let store = create_test_store();
        let game = seed(&store, 3498, "Grand Theft Auto V");

        store.add_to_watchlist("alice", "3498").unwrap();
        let again = store.add_to_watchlist("alice", &game.id).unwrap();
        assert!(!again.added);

        let list = store.watchlist("alice").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, game.id);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let store = create_test_store();
        let a = seed(&store, 1, "Alpha");
        let b = seed(&store, 2, "Beta");
        let c = seed(&store, 3, "Gamma");

        store.add_to_watchlist("p", &c.id).unwrap();
        store.add_to_watchlist("p", &a.id).unwrap();
        store.add_to_watchlist("p", &b.id).unwrap();
        assert_eq!(names(&store.watchlist("p").unwrap()), ["Gamma", "Alpha", "Beta"]);

        // Re-adding keeps the original slot
        store.add_to_watchlist("p", &c.id).unwrap();
        assert_eq!(names(&store.watchlist("p").unwrap()), ["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn test_profiles_are_independent() {
        let store = create_test_store();
        let game = seed(&store, 1, "Celeste");

        store.add_to_watchlist("alice", &game.id).unwrap();
        assert_eq!(store.watchlist("alice").unwrap().len(), 1);
        assert!(store.watchlist("bob").unwrap().is_empty());
    }

    #[test]
    fn test_remove() {
        let store = create_test_store();
        let a = seed(&store, 1, "Alpha");
        let b = seed(&store, 2, "Beta");
        store.add_to_watchlist("p", &a.id).unwrap();
        store.add_to_watchlist("p", &b.id).unwrap();

        assert!(store.remove_from_watchlist("p", "1").unwrap());
        assert!(!store.remove_from_watchlist("p", &a.id).unwrap());
        assert_eq!(names(&store.watchlist("p").unwrap()), ["Beta"]);
    }

    #[test]
    fn test_deleting_game_drops_entry() {
        let store = create_test_store();
        let game = seed(&store, 1, "Doomed");
        store.add_to_watchlist("p", &game.id).unwrap();

        store.delete(&game.id).unwrap();
        assert!(store.watchlist("p").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_game_not_found() {
        let store = create_test_store();

        let result = store.add_to_watchlist("p", "no-such-game");
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let result = store.add_to_watchlist("p", "999");
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let result = store.remove_from_watchlist("p", "999");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_profile_id_validation() {
        let store = create_test_store();
        let game = seed(&store, 1, "Alpha");

        let result = store.add_to_watchlist("   ", &game.id);
        assert!(matches!(result, Err(StoreError::Validation(_))));

        let long = "x".repeat(MAX_PROFILE_ID_LEN + 1);
        assert!(matches!(store.watchlist(&long), Err(StoreError::Validation(_))));

        // Surrounding whitespace is ignored
        store.add_to_watchlist(" alice ", &game.id).unwrap();
        assert_eq!(store.watchlist("alice").unwrap().len(), 1);
    }
}
