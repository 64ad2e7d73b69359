//! Persistence layer: diesel-async repositories over SQLite.

mod diesel_highscore;
mod diesel_models;
mod diesel_player;
mod diesel_pool;

pub use diesel_highscore::DieselHighscoreRepository;
pub use diesel_player::DieselPlayerRepository;
pub use diesel_pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};

use chrono::{DateTime, Utc};
use diesel_async::SimpleAsyncConnection;

/// Parse a datetime string from the database, defaulting to the epoch.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Create the database schema if it does not exist.
///
/// Player names collate case-insensitively so lookups match upstream's
/// matching behaviour. The highscores primary key makes snapshot inserts
/// duplicate-safe on (player, capture time).
pub async fn init_schema(pool: &AsyncSqlitePool) -> Result<(), DieselError> {
    let mut conn = pool.get().await?;

    conn.batch_execute(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            possible_ban INTEGER NOT NULL DEFAULT 0,
            confirmed_ban INTEGER NOT NULL DEFAULT 0,
            confirmed_player INTEGER NOT NULL DEFAULT 0,
            label_id INTEGER,
            updated_at TEXT
        );
        CREATE TABLE IF NOT EXISTS highscores (
            player_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            skills TEXT NOT NULL,
            minigames TEXT NOT NULL,
            PRIMARY KEY (player_id, created_at)
        );
        "#,
    )
    .await?;

    Ok(())
}
