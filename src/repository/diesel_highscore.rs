//! Diesel-based highscore snapshot repository for SQLite.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{HighscoreRow, NewHighscore};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::parse_datetime;
use crate::models::{HighscoreRecord, MinigameSnapshot, SkillSnapshot};
use crate::schema::highscores;

impl From<HighscoreRow> for HighscoreRecord {
    fn from(row: HighscoreRow) -> Self {
        let skills = serde_json::from_str(&row.skills)
            .map(|v| SkillSnapshot::from_json(&v))
            .unwrap_or_default();
        let minigames = serde_json::from_str(&row.minigames)
            .map(|v| MinigameSnapshot::from_json(&v))
            .unwrap_or_default();

        HighscoreRecord {
            player_id: row.player_id,
            created_at: parse_datetime(&row.created_at),
            skills,
            minigames,
        }
    }
}

/// Diesel-based highscore repository.
///
/// Writes are keyed (player_id, created_at); `replace_into` makes a
/// duplicate insert of the same capture a no-op overwrite, which is what
/// lets the scheduler and the streaming consumer overlap safely.
#[derive(Clone)]
pub struct DieselHighscoreRepository {
    pool: AsyncSqlitePool,
}

impl DieselHighscoreRepository {
    /// Create a new highscore repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one snapshot record.
    pub async fn insert(&self, record: &HighscoreRecord) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        let created_at = record.created_at.to_rfc3339();
        let skills = record.skills.to_json().to_string();
        let minigames = record.minigames.to_json().to_string();

        let row = NewHighscore {
            player_id: record.player_id,
            created_at: &created_at,
            skills: &skills,
            minigames: &minigames,
        };

        diesel::replace_into(highscores::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// All snapshots for a player, oldest first.
    pub async fn get_for_player(
        &self,
        player_id: i32,
    ) -> Result<Vec<HighscoreRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        highscores::table
            .filter(highscores::player_id.eq(player_id))
            .order(highscores::created_at.asc())
            .load::<HighscoreRow>(&mut conn)
            .await
            .map(|rows| rows.into_iter().map(HighscoreRecord::from).collect())
    }

    /// Total snapshot count.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        highscores::table.count().first(&mut conn).await
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
    async fn test_insert_and_read_back() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselHighscoreRepository::new(pool);

        let mut skills = SkillSnapshot::new();
        skills.set(0, Some(13_034_431));
        let mut minigames = MinigameSnapshot::new();
        minigames.set(0, Some(42));

        let record = HighscoreRecord::new(7, skills, minigames);
        repo.insert(&record).await.unwrap();

        let stored = repo.get_for_player(7).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].skills.experience("total"), Some(13_034_431));
        assert_eq!(stored[0].minigames.score("league"), Some(42));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_idempotent() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselHighscoreRepository::new(pool);

        let record = HighscoreRecord::new(7, SkillSnapshot::new(), MinigameSnapshot::new());
        repo.insert(&record).await.unwrap();
        repo.insert(&record).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
