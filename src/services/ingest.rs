//! Per-player ingest pipeline and concurrent batch execution.
//!
//! fetch -> parse -> persist for one player, and a worker pool that runs
//! that pipeline for a whole batch with per-player failure isolation: one
//! player blowing up must never take the batch down with it.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::HighscoreRecord;
use crate::repository::{DieselError, DieselHighscoreRepository, DieselPlayerRepository};
use crate::scrapers::{parse_hiscore, FetchError, FetchOutcome, Fetcher};

/// Failure of one player's pipeline. Never aborts the batch.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("database error: {0}")]
    Database(#[from] DieselError),
}

/// Terminal state of one player's pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerOutcome {
    /// Snapshot persisted, possible-ban flag cleared.
    Scraped,
    /// Upstream said "not found"; possible-ban flag set, no snapshot.
    Flagged,
}

/// Tally for one batch (or one whole cycle).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub scraped: usize,
    pub flagged: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.scraped + self.flagged + self.failed
    }

    pub fn merge(&mut self, other: &BatchReport) {
        self.scraped += other.scraped;
        self.flagged += other.flagged;
        self.failed += other.failed;
    }
}

/// Runs the fetch -> parse -> persist pipeline.
#[derive(Clone)]
pub struct IngestService {
    fetcher: Arc<dyn Fetcher>,
    players: DieselPlayerRepository,
    highscores: DieselHighscoreRepository,
}

impl IngestService {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        players: DieselPlayerRepository,
        highscores: DieselHighscoreRepository,
    ) -> Self {
        Self {
            fetcher,
            players,
            highscores,
        }
    }

    /// Run the full pipeline for one player.
    ///
    /// Safe to run twice for the same player concurrently (scheduler and
    /// streaming consumer can overlap): the snapshot write is keyed by
    /// capture time and `updated_at` is last-write-wins.
    pub async fn process_player(&self, name: &str) -> Result<PlayerOutcome, IngestError> {
        // Every scraped name has a Player row before the first fetch.
        let player = self.players.ensure(name).await?;

        match self.fetcher.fetch(name).await? {
            FetchOutcome::Banned => {
                self.players
                    .record_scrape(player.id, true, Utc::now())
                    .await?;
                info!(player = name, "possible ban flagged");
                Ok(PlayerOutcome::Flagged)
            }
            FetchOutcome::Hiscore(lines) => {
                let (skills, minigames) = parse_hiscore(&lines);
                let record = HighscoreRecord::new(player.id, skills, minigames);

                // Snapshot first. If this write fails, updated_at stays
                // stale and the player is picked up again next cycle.
                self.highscores.insert(&record).await?;
                self.players
                    .record_scrape(player.id, false, record.created_at)
                    .await?;
                Ok(PlayerOutcome::Scraped)
            }
        }
    }

    /// Process a batch of players concurrently, one task per player.
    ///
    /// Failures are logged and tallied; the rest of the batch keeps going.
    pub async fn run_batch(&self, batch: &[String]) -> BatchReport {
        let mut handles = Vec::with_capacity(batch.len());

        for name in batch {
            let service = self.clone();
            let name = name.clone();
            handles.push(tokio::spawn(async move {
                let outcome = service.process_player(&name).await;
                (name, outcome)
            }));
        }

        let mut report = BatchReport::default();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(PlayerOutcome::Scraped))) => report.scraped += 1,
                Ok((_, Ok(PlayerOutcome::Flagged))) => report.flagged += 1,
                Ok((name, Err(e))) => {
                    warn!(player = %name, error = %e, "player pipeline failed");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "player task panicked");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
