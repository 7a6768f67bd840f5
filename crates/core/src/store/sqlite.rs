//! SQLite-backed game store implementation.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, OptionalExtension, TransactionBehavior,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{watchlist, GameStore, StoreError, UpsertOutcome};
use crate::game::{
    validate_new_game, validate_update, AgeRating, CatalogStats, Game, GameFilter, GameOrdering,
    GameUpdate, NewGame, NormalizedGame, PageRequest, Paged, PLACEHOLDER_DESCRIPTION,
    PLACEHOLDER_IMAGE, UNKNOWN_LABEL,
};
use crate::metrics;

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const GAME_COLUMNS: &str = "g.id, g.external_id, g.name, g.slug, g.description, g.background_image,
     g.release_date, g.rating, g.metacritic, g.age_rating, g.esrb_label, g.website,
     g.created_at, g.last_synced";

/// Label tables holding the ordered platform and genre lists.
#[derive(Clone, Copy)]
enum LabelTable {
    Platforms,
    Genres,
}

impl LabelTable {
    fn name(&self) -> &'static str {
        match self {
            LabelTable::Platforms => "game_platforms",
            LabelTable::Genres => "game_genres",
        }
    }
}

/// SQLite-backed game store.
pub struct SqliteGameStore {
    conn: Mutex<Connection>,
}

impl SqliteGameStore {
    /// Create a new SQLite store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Self::initialize_schema(&conn)?;
        watchlist::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            -- One row per game; external_id is the remote catalog identity
            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                external_id INTEGER UNIQUE,
                name TEXT NOT NULL,
                -- Lowercased name; LIKE only folds ASCII
                name_folded TEXT NOT NULL,
                slug TEXT,
                description TEXT NOT NULL,
                background_image TEXT NOT NULL,
                release_date TEXT,
                rating REAL,
                metacritic INTEGER,
                age_rating TEXT NOT NULL,
                esrb_label TEXT,
                website TEXT,
                created_at TEXT NOT NULL,
                last_synced TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_games_name ON games(name);
            CREATE INDEX IF NOT EXISTS idx_games_name_folded ON games(name_folded);
            CREATE INDEX IF NOT EXISTS idx_games_rating ON games(rating);
            CREATE INDEX IF NOT EXISTS idx_games_release_date ON games(release_date);
            CREATE INDEX IF NOT EXISTS idx_games_age_rating ON games(age_rating);

            -- Ordered platform names per game
            CREATE TABLE IF NOT EXISTS game_platforms (
                game_id TEXT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (game_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_game_platforms_name ON game_platforms(name COLLATE NOCASE);

            -- Ordered genre names per game
            CREATE TABLE IF NOT EXISTS game_genres (
                game_id TEXT NOT NULL REFERENCES games(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                PRIMARY KEY (game_id, position)
            );

            CREATE INDEX IF NOT EXISTS idx_game_genres_name ON game_genres(name COLLATE NOCASE);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Internal("store connection lock poisoned".to_string()))
    }

    /// Load the ordered labels of one game.
    fn load_labels(
        conn: &Connection,
        table: LabelTable,
        game_id: &str,
    ) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT name FROM {} WHERE game_id = ? ORDER BY position",
            table.name()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![game_id], |row| row.get::<_, String>(0))?;

        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    /// Replace the labels of one game.
    fn replace_labels(
        conn: &Connection,
        table: LabelTable,
        game_id: &str,
        labels: &[String],
    ) -> Result<(), StoreError> {
        conn.execute(
            &format!("DELETE FROM {} WHERE game_id = ?", table.name()),
            params![game_id],
        )?;

        let sql = format!(
            "INSERT INTO {} (game_id, position, name) VALUES (?, ?, ?)",
            table.name()
        );
        for (position, label) in labels.iter().enumerate() {
            conn.execute(&sql, params![game_id, position as i64, label])?;
        }
        Ok(())
    }

    /// Fill in platforms and genres for rows loaded without them.
    fn attach_labels(conn: &Connection, game: &mut Game) -> Result<(), StoreError> {
        game.platforms = Self::load_labels(conn, LabelTable::Platforms, &game.id)?;
        game.genres = Self::load_labels(conn, LabelTable::Genres, &game.id)?;
        Ok(())
    }

    pub(super) fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Game>, StoreError> {
        let sql = format!("SELECT {} FROM games g WHERE g.id = ?", GAME_COLUMNS);
        let game = conn
            .query_row(&sql, params![id], Self::row_to_game)
            .optional()?;

        match game {
            Some(mut game) => {
                Self::attach_labels(conn, &mut game)?;
                Ok(Some(game))
            }
            None => Ok(None),
        }
    }

    /// Convert a row to Game (without platforms/genres).
    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
        let release_date: Option<String> = row.get(6)?;
        let age_rating: String = row.get(9)?;
        let created_at: String = row.get(12)?;
        let last_synced: String = row.get(13)?;

        Ok(Game {
            id: row.get(0)?,
            external_id: row.get(1)?,
            name: row.get(2)?,
            slug: row.get(3)?,
            description: row.get(4)?,
            background_image: row.get(5)?,
            release_date: release_date.and_then(|d| parse_date(&d)),
            rating: row.get(7)?,
            metacritic: row.get(8)?,
            age_rating: age_rating.parse().unwrap_or_default(),
            esrb_label: row.get(10)?,
            website: row.get(11)?,
            created_at: parse_timestamp(&created_at),
            last_synced: parse_timestamp(&last_synced),
            platforms: Vec::new(), // Loaded separately
            genres: Vec::new(),    // Loaded separately
        })
    }

    fn query_games(
        conn: &Connection,
        criteria: &GameFilter,
        page: PageRequest,
    ) -> Result<Paged<Game>, StoreError> {
        let (where_sql, mut args) = where_clause(criteria);
        let count = Self::count_where(conn, &where_sql, &args)?;

        let sql = format!(
            "SELECT {} FROM games g {} ORDER BY {} LIMIT ? OFFSET ?",
            GAME_COLUMNS,
            where_sql,
            order_clause(criteria.ordering)
        );
        args.push(Value::Integer(page.limit() as i64));
        args.push(Value::Integer(page.offset() as i64));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), Self::row_to_game)?;

        let mut results = Vec::new();
        for row in rows {
            let mut game = row?;
            Self::attach_labels(conn, &mut game)?;
            results.push(game);
        }

        Ok(Paged::new(count, results))
    }

    fn count_where(conn: &Connection, where_sql: &str, args: &[Value]) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM games g {}", where_sql);
        let count: i64 = conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl GameStore for SqliteGameStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Game>, StoreError> {
        let conn = self.lock()?;
        Self::get_by_id(&conn, id)
    }

    fn find_by_external_id(&self, external_id: i64) -> Result<Option<Game>, StoreError> {
        let conn = self.lock()?;
        let id: Option<String> = conn
            .query_row(
                "SELECT id FROM games WHERE external_id = ?",
                params![external_id],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => Self::get_by_id(&conn, &id),
            None => Ok(None),
        }
    }

    fn search(&self, text: &str, page: PageRequest) -> Result<Paged<Game>, StoreError> {
        let conn = self.lock()?;
        let criteria = GameFilter::new().with_search(text);
        Self::query_games(&conn, &criteria, page)
    }

    fn filter(&self, criteria: &GameFilter, page: PageRequest) -> Result<Paged<Game>, StoreError> {
        let conn = self.lock()?;
        Self::query_games(&conn, criteria, page)
    }

    fn count_matching(&self, criteria: &GameFilter) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let (where_sql, args) = where_clause(criteria);
        Self::count_where(&conn, &where_sql, &args)
    }

    fn upsert_from_remote(&self, game: &NormalizedGame) -> Result<UpsertOutcome, StoreError> {
        let mut conn = self.lock()?;
        let now_str = now_timestamp();

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let new_id = Uuid::new_v4().to_string();
        let inserted = tx.execute(
            "INSERT INTO games (id, external_id, name, name_folded, slug, description,
                                background_image, release_date, rating, metacritic, age_rating,
                                esrb_label, website, created_at, last_synced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
             ON CONFLICT(external_id) DO NOTHING",
            params![
                &new_id,
                game.external_id,
                &game.name,
                fold(&game.name),
                &game.slug,
                &game.description,
                &game.background_image,
                game.release_date.map(format_date),
                game.rating,
                game.metacritic,
                game.age_rating.as_str(),
                &game.esrb_label,
                &game.website,
                &now_str,
            ],
        )?;

        // Zero rows means the external id is already stored: update it instead.
        let created = inserted == 1;
        if !created {
            debug!(external_id = game.external_id, "Game already stored, updating");
        }

        let id = if created {
            new_id
        } else {
            tx.execute(
                "UPDATE games SET name = ?1, name_folded = ?2, slug = ?3, description = ?4,
                                  background_image = ?5, release_date = ?6, rating = ?7,
                                  metacritic = ?8, age_rating = ?9, esrb_label = ?10,
                                  website = ?11, last_synced = ?12
                 WHERE external_id = ?13",
                params![
                    &game.name,
                    fold(&game.name),
                    &game.slug,
                    &game.description,
                    &game.background_image,
                    game.release_date.map(format_date),
                    game.rating,
                    game.metacritic,
                    game.age_rating.as_str(),
                    &game.esrb_label,
                    &game.website,
                    &now_str,
                    game.external_id,
                ],
            )?;
            tx.query_row(
                "SELECT id FROM games WHERE external_id = ?",
                params![game.external_id],
                |row| row.get::<_, String>(0),
            )?
        };

        Self::replace_labels(&tx, LabelTable::Platforms, &id, &game.platforms)?;
        Self::replace_labels(&tx, LabelTable::Genres, &id, &game.genres)?;
        tx.commit()?;

        metrics::UPSERTS
            .with_label_values(&[if created { "created" } else { "updated" }])
            .inc();

        let stored = Self::get_by_id(&conn, &id)?.ok_or_else(|| {
            StoreError::Internal(format!("game {} vanished after upsert", id))
        })?;

        Ok(UpsertOutcome {
            game: stored,
            created,
        })
    }

    fn external_ids(&self) -> Result<HashSet<i64>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT external_id FROM games WHERE external_id IS NOT NULL")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut ids = HashSet::new();
        for row in rows {
            ids.insert(row?);
        }
        Ok(ids)
    }

    fn create(&self, game: NewGame) -> Result<Game, StoreError> {
        validate_new_game(&game).map_err(StoreError::Validation)?;

        let mut conn = self.lock()?;
        let now_str = now_timestamp();
        let id = Uuid::new_v4().to_string();

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO games (id, external_id, name, name_folded, slug, description,
                                background_image, release_date, rating, metacritic, age_rating,
                                esrb_label, website, created_at, last_synced)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL, ?12, ?13, ?13)",
            params![
                &id,
                game.external_id,
                game.name.trim(),
                fold(game.name.trim()),
                &game.slug,
                or_placeholder(game.description, PLACEHOLDER_DESCRIPTION),
                or_placeholder(game.background_image, PLACEHOLDER_IMAGE),
                game.release_date.map(format_date),
                game.rating,
                game.metacritic,
                game.age_rating.unwrap_or_default().as_str(),
                &game.website,
                &now_str,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                let external_id = game.external_id.unwrap_or_default();
                return Err(StoreError::DuplicateIdentity(external_id));
            }
            Err(e) => return Err(StoreError::Database(e.to_string())),
        }

        Self::replace_labels(&tx, LabelTable::Platforms, &id, &or_unknown(game.platforms))?;
        Self::replace_labels(&tx, LabelTable::Genres, &id, &or_unknown(game.genres))?;
        tx.commit()?;

        Self::get_by_id(&conn, &id)?
            .ok_or_else(|| StoreError::Internal(format!("game {} vanished after insert", id)))
    }

    fn update(&self, id: &str, update: GameUpdate) -> Result<Game, StoreError> {
        validate_update(&update).map_err(StoreError::Validation)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut game = Self::get_by_id(&tx, id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(name) = update.name {
            game.name = name.trim().to_string();
        }
        if update.slug.is_some() {
            game.slug = update.slug;
        }
        if let Some(description) = update.description {
            game.description = or_placeholder(Some(description), PLACEHOLDER_DESCRIPTION);
        }
        if let Some(image) = update.background_image {
            game.background_image = or_placeholder(Some(image), PLACEHOLDER_IMAGE);
        }
        if update.release_date.is_some() {
            game.release_date = update.release_date;
        }
        if update.rating.is_some() {
            game.rating = update.rating;
        }
        if update.metacritic.is_some() {
            game.metacritic = update.metacritic;
        }
        if let Some(age_rating) = update.age_rating {
            game.age_rating = age_rating;
        }
        if update.website.is_some() {
            game.website = update.website;
        }

        tx.execute(
            "UPDATE games SET name = ?1, name_folded = ?2, slug = ?3, description = ?4,
                              background_image = ?5, release_date = ?6, rating = ?7,
                              metacritic = ?8, age_rating = ?9, website = ?10, last_synced = ?11
             WHERE id = ?12",
            params![
                &game.name,
                fold(&game.name),
                &game.slug,
                &game.description,
                &game.background_image,
                game.release_date.map(format_date),
                game.rating,
                game.metacritic,
                game.age_rating.as_str(),
                &game.website,
                now_timestamp(),
                id,
            ],
        )?;

        if let Some(platforms) = update.platforms {
            Self::replace_labels(&tx, LabelTable::Platforms, id, &or_unknown(platforms))?;
        }
        if let Some(genres) = update.genres {
            Self::replace_labels(&tx, LabelTable::Genres, id, &or_unknown(genres))?;
        }
        tx.commit()?;

        Self::get_by_id(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;

        // Cascades to platforms, genres and watchlist entries
        let rows_affected = conn.execute("DELETE FROM games WHERE id = ?", params![id])?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(())
    }

    fn stats(&self) -> Result<CatalogStats, StoreError> {
        let conn = self.lock()?;

        let total_games: i64 = conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;

        let synced_games: i64 = conn.query_row(
            "SELECT COUNT(*) FROM games WHERE external_id IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let oldest_sync: Option<DateTime<Utc>> = conn
            .query_row("SELECT MIN(last_synced) FROM games", [], |row| {
                row.get::<_, Option<String>>(0)
            })?
            .map(|s| parse_timestamp(&s));

        let newest_sync: Option<DateTime<Utc>> = conn
            .query_row("SELECT MAX(last_synced) FROM games", [], |row| {
                row.get::<_, Option<String>>(0)
            })?
            .map(|s| parse_timestamp(&s));

        Ok(CatalogStats {
            total_games: total_games as u64,
            synced_games: synced_games as u64,
            manual_games: (total_games - synced_games) as u64,
            oldest_sync,
            newest_sync,
        })
    }
}

/// Build the WHERE clause and its arguments for a filter.
fn where_clause(criteria: &GameFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(search) = criteria.search.as_deref().filter(|s| !s.is_empty()) {
        clauses.push("g.name_folded LIKE ? ESCAPE '\\'");
        args.push(Value::Text(format!("%{}%", escape_like(&fold(search)))));
    }
    if let Some(genre) = criteria.genre.as_deref().filter(|s| !s.is_empty()) {
        clauses.push(
            "EXISTS (SELECT 1 FROM game_genres gg WHERE gg.game_id = g.id AND gg.name = ? COLLATE NOCASE)",
        );
        args.push(Value::Text(genre.to_string()));
    }
    if let Some(platform) = criteria.platform.as_deref().filter(|s| !s.is_empty()) {
        clauses.push(
            "EXISTS (SELECT 1 FROM game_platforms gp WHERE gp.game_id = g.id AND gp.name = ? COLLATE NOCASE)",
        );
        args.push(Value::Text(platform.to_string()));
    }
    if let Some(age_rating) = criteria.age_rating {
        clauses.push("g.age_rating = ?");
        args.push(Value::Text(age_rating.as_str().to_string()));
    }

    if clauses.is_empty() {
        (String::new(), args)
    } else {
        (format!("WHERE {}", clauses.join(" AND ")), args)
    }
}

fn order_clause(ordering: Option<GameOrdering>) -> &'static str {
    match ordering {
        Some(GameOrdering::RatingDesc) => "g.rating IS NULL, g.rating DESC, g.name COLLATE NOCASE",
        Some(GameOrdering::ReleasedDesc) => {
            "g.release_date IS NULL, g.release_date DESC, g.name COLLATE NOCASE"
        }
        Some(GameOrdering::CreatedDesc) => "g.created_at DESC, g.id",
        Some(GameOrdering::Name) | None => "g.name COLLATE NOCASE, g.id",
    }
}

/// Unicode-aware case folding for name search.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

fn or_unknown(labels: Vec<String>) -> Vec<String> {
    let labels: Vec<String> = labels
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if labels.is_empty() {
        vec![UNKNOWN_LABEL.to_string()]
    } else {
        labels
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Fixed-width timestamps so text ordering matches time ordering.
pub(super) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| {
            warn!("Unparseable timestamp in store: {}", s);
            Utc::now()
        })
}
