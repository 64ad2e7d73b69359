//! Ingestion cycle scheduler.
//!
//! Outer loop over the whole player population: refresh the candidate list
//! from the store, carve it into batches, and hand each batch to the worker
//! pool. Processed players are removed from the in-memory list, so one
//! cycle covers everyone eligible exactly once. The list is re-read from
//! the store every `refresh_every_batches` batches to pick up new players.
//!
//! The candidate list is owned by this task alone (single writer); the
//! streaming consumer runs its own independent pipeline and never touches
//! it.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use super::ingest::{BatchReport, IngestError, IngestService};
use crate::config::Settings;
use crate::repository::DieselPlayerRepository;
use crate::scrapers::{eligible_players, select_batch};

/// Scheduler states. `Done` is reached only when a fresh refresh finds no
/// eligible players at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Init,
    Select,
    Process,
    Done,
}

/// Tunables for the cycle loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub batch_size: usize,
    pub refresh_every_batches: usize,
    /// Sleep between sweeps once everyone is up to date.
    pub idle_sleep: Duration,
}

impl SchedulerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            batch_size: settings.batch_size,
            refresh_every_batches: settings.refresh_every_batches,
            idle_sleep: Duration::from_secs(600),
        }
    }
}

/// Drives full scrape cycles over the player population.
pub struct IngestionScheduler {
    players: DieselPlayerRepository,
    ingest: IngestService,
    config: SchedulerConfig,
}

impl IngestionScheduler {
    pub fn new(
        players: DieselPlayerRepository,
        ingest: IngestService,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            players,
            ingest,
            config,
        }
    }

    /// Run one full sweep: process batches until a refresh of the
    /// candidate list comes back empty.
    pub async fn run_cycle(&self) -> Result<BatchReport, IngestError> {
        let mut totals = BatchReport::default();
        let mut candidates: Vec<String> = Vec::new();
        let mut batches_since_refresh = 0usize;
        let mut state = CycleState::Init;

        loop {
            state = match state {
                CycleState::Init => {
                    let all = self.players.get_all().await?;
                    candidates = eligible_players(&all, Utc::now());
                    batches_since_refresh = 0;
                    debug!(candidates = candidates.len(), "candidate list refreshed");
                    CycleState::Select
                }
                CycleState::Select => {
                    if candidates.is_empty() {
                        if batches_since_refresh == 0 {
                            // A fresh refresh yielded nothing: sweep over.
                            CycleState::Done
                        } else {
                            CycleState::Init
                        }
                    } else if batches_since_refresh >= self.config.refresh_every_batches {
                        CycleState::Init
                    } else {
                        CycleState::Process
                    }
                }
                CycleState::Process => {
                    let batch = select_batch(&candidates, self.config.batch_size);
                    let report = self.ingest.run_batch(&batch).await;
                    totals.merge(&report);
                    batches_since_refresh += 1;

                    // Processed players leave the in-memory list so the
                    // next window never reprocesses them this cycle.
                    candidates.retain(|name| !batch.contains(name));

                    info!(
                        batch = batch.len(),
                        scraped = report.scraped,
                        flagged = report.flagged,
                        failed = report.failed,
                        remaining = candidates.len(),
                        "batch processed"
                    );
                    CycleState::Select
                }
                CycleState::Done => break,
            };
        }

        Ok(totals)
    }

    /// Run sweeps forever, sleeping between them once the population is
    /// up to date. Never returns in normal operation.
    pub async fn run_forever(&self) -> Result<(), IngestError> {
        loop {
            let report = self.run_cycle().await?;
            info!(
                scraped = report.scraped,
                flagged = report.flagged,
                failed = report.failed,
                "cycle complete, sleeping"
            );
            tokio::time::sleep(self.config.idle_sleep).await;
        }
    }
}
