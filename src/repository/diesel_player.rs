//! Diesel-based player repository for SQLite.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewPlayer, PlayerRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::parse_datetime_opt;
use crate::models::Player;
use crate::schema::players;

impl From<PlayerRecord> for Player {
    fn from(record: PlayerRecord) -> Self {
        Player {
            id: record.id,
            name: record.name,
            possible_ban: record.possible_ban != 0,
            confirmed_ban: record.confirmed_ban != 0,
            confirmed_player: record.confirmed_player != 0,
            label_id: record.label_id,
            updated_at: parse_datetime_opt(record.updated_at),
        }
    }
}

/// Diesel-based player repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselPlayerRepository {
    pool: AsyncSqlitePool,
}

impl DieselPlayerRepository {
    /// Create a new player repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Get a player by name (case-insensitive, per the column collation).
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Player>, DieselError> {
        let mut conn = self.pool.get().await?;

        players::table
            .filter(players::name.eq(name))
            .first::<PlayerRecord>(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Player::from))
    }

    /// Get a player by name, inserting a default record if unknown.
    ///
    /// Every scraped name must have a Player row before the first scrape.
    pub async fn ensure(&self, name: &str) -> Result<Player, DieselError> {
        if let Some(player) = self.get_by_name(name).await? {
            return Ok(player);
        }

        let mut conn = self.pool.get().await?;
        let new_player = NewPlayer {
            name,
            possible_ban: 0,
            confirmed_ban: 0,
            confirmed_player: 0,
            label_id: None,
            updated_at: None,
        };

        // A concurrent insert of the same name loses the unique-constraint
        // race; fall through to the read in that case.
        let _ = diesel::insert_into(players::table)
            .values(&new_player)
            .execute(&mut conn)
            .await;

        self.get_by_name(name)
            .await?
            .ok_or(DieselError::NotFound)
    }

    /// Get all known players.
    pub async fn get_all(&self) -> Result<Vec<Player>, DieselError> {
        let mut conn = self.pool.get().await?;

        players::table
            .order(players::id.asc())
            .load::<PlayerRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(Player::from).collect())
    }

    /// Record the outcome of a scrape attempt.
    ///
    /// Sets `possible_ban` and advances `updated_at`. The confirmed
    /// classification fields are left untouched.
    pub async fn record_scrape(
        &self,
        player_id: i32,
        possible_ban: bool,
        at: DateTime<Utc>,
    ) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        let ts = at.to_rfc3339();

        diesel::update(players::table.find(player_id))
            .set((
                players::possible_ban.eq(possible_ban as i32),
                players::updated_at.eq(Some(&ts)),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Total player count.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        players::table.count().first(&mut conn).await
    }

    /// Count of players flagged with a possible ban.
    pub async fn count_possible_ban(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        players::table
            .filter(players::possible_ban.eq(1))
            .count()
            .first(&mut conn)
            .await
    }

    /// Count of players with a confirmed ban.
    pub async fn count_confirmed_ban(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        players::table
            .filter(players::confirmed_ban.eq(1))
            .count()
            .first(&mut conn)
            .await
    }

    /// Count of players scraped at or after the given instant.
    ///
    /// RFC 3339 timestamps in UTC compare correctly as text.
    pub async fn count_updated_since(
        &self,
        boundary: DateTime<Utc>,
    ) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;
        let ts = boundary.to_rfc3339();

        players::table
            .filter(players::updated_at.ge(ts))
            .count()
            .first(&mut conn)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::init_schema;
    use tempfile::tempdir;

    async fn setup_test_db() -> (AsyncSqlitePool, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let pool = AsyncSqlitePool::from_path(&db_path);
        init_schema(&pool).await.unwrap();
        (pool, dir)
    }

    #[tokio::test]
    async fn test_ensure_creates_default_player() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselPlayerRepository::new(pool);

        let player = repo.ensure("Zezima").await.unwrap();
        assert_eq!(player.name, "Zezima");
        assert!(!player.possible_ban);
        assert!(!player.confirmed_ban);
        assert!(player.updated_at.is_none());

        // Second ensure returns the same row, case-insensitively.
        let again = repo.ensure("zezima").await.unwrap();
        assert_eq!(again.id, player.id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_scrape_sets_flag_and_timestamp() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselPlayerRepository::new(pool);

        let player = repo.ensure("alice").await.unwrap();
        let now = Utc::now();
        repo.record_scrape(player.id, true, now).await.unwrap();

        let updated = repo.get_by_name("alice").await.unwrap().unwrap();
        assert!(updated.possible_ban);
        assert!(updated.updated_at.is_some());
        assert_eq!(repo.count_possible_ban().await.unwrap(), 1);

        // Clearing the flag on a later successful scrape.
        repo.record_scrape(player.id, false, Utc::now()).await.unwrap();
        let cleared = repo.get_by_name("alice").await.unwrap().unwrap();
        assert!(!cleared.possible_ban);
    }

    #[tokio::test]
    async fn test_count_updated_since() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselPlayerRepository::new(pool);

        let a = repo.ensure("a").await.unwrap();
        let _b = repo.ensure("b").await.unwrap();
        repo.record_scrape(a.id, false, Utc::now()).await.unwrap();

        let boundary = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(repo.count_updated_since(boundary).await.unwrap(), 1);
    }
}
