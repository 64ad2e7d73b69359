//! Command handlers.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::Settings;
use crate::repository::{
    init_schema, AsyncSqlitePool, DieselHighscoreRepository, DieselPlayerRepository,
};
use crate::scrapers::{current_day_boundary, HiscoreClient};
use crate::services::{
    ChannelTriggerQueue, IngestService, IngestionScheduler, PlayerOutcome, SchedulerConfig,
    StreamingConsumer,
};

/// Build the ingest service stack from settings. The database must exist.
fn build_ingest(settings: &Settings) -> anyhow::Result<(DieselPlayerRepository, IngestService)> {
    if !settings.database_exists() {
        bail!(
            "no database at {} (run `hiscored init` first)",
            settings.database_path().display()
        );
    }

    let pool = AsyncSqlitePool::new(&settings.database_url());
    let players = DieselPlayerRepository::new(pool.clone());
    let highscores = DieselHighscoreRepository::new(pool);

    let client = HiscoreClient::new(
        &settings.hiscore_url,
        settings.request_timeout,
        settings.request_delay,
        settings.max_attempts,
    )
    .context("failed to build HTTP client")?;

    let ingest = IngestService::new(Arc::new(client), players.clone(), highscores);
    Ok((players, ingest))
}

/// `init`: create the data directory and database schema.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings
        .ensure_directories()
        .context("failed to create data directory")?;

    let pool = AsyncSqlitePool::new(&settings.database_url());
    init_schema(&pool).await.context("failed to apply schema")?;

    println!(
        "{} Database ready at {}",
        style("✓").green().bold(),
        settings.database_path().display()
    );
    Ok(())
}

/// `run`: drive scrape cycles, forever or once.
pub async fn cmd_run(
    settings: &Settings,
    batch_size: Option<usize>,
    refresh_every: Option<usize>,
    once: bool,
) -> anyhow::Result<()> {
    let (players, ingest) = build_ingest(settings)?;

    let mut config = SchedulerConfig::from_settings(settings);
    if let Some(n) = batch_size {
        config.batch_size = n.max(1);
    }
    if let Some(n) = refresh_every {
        config.refresh_every_batches = n.max(1);
    }

    info!(
        batch_size = config.batch_size,
        refresh_every = config.refresh_every_batches,
        "starting scheduler"
    );
    let scheduler = IngestionScheduler::new(players, ingest, config);

    if once {
        let report = scheduler.run_cycle().await?;
        println!(
            "{} Cycle complete: {} scraped, {} flagged, {} failed",
            style("✓").green().bold(),
            report.scraped,
            report.flagged,
            report.failed
        );
        return Ok(());
    }

    scheduler.run_forever().await?;
    Ok(())
}

/// `scrape`: run the pipeline for explicitly named players.
pub async fn cmd_scrape(settings: &Settings, names: &[String]) -> anyhow::Result<()> {
    let (_, ingest) = build_ingest(settings)?;

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut scraped = 0usize;
    let mut flagged = 0usize;
    let mut failed = 0usize;

    // Sequential on purpose: a hand-driven scrape should stay polite.
    for name in names {
        pb.set_message(name.clone());
        match ingest.process_player(name).await {
            Ok(PlayerOutcome::Scraped) => scraped += 1,
            Ok(PlayerOutcome::Flagged) => {
                flagged += 1;
                pb.println(format!(
                    "{} {}: possible ban",
                    style("!").yellow().bold(),
                    name
                ));
            }
            Err(e) => {
                failed += 1;
                pb.println(format!("{} {}: {}", style("✗").red().bold(), name, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "{} {} scraped, {} flagged, {} failed",
        style("✓").green().bold(),
        scraped,
        flagged,
        failed
    );
    if failed > 0 {
        bail!("{failed} of {} players failed", names.len());
    }
    Ok(())
}

/// `consume`: feed externally produced triggers through the pipeline.
pub async fn cmd_consume(
    settings: &Settings,
    stdin: bool,
    queue: Option<String>,
) -> anyhow::Result<()> {
    let (_, ingest) = build_ingest(settings)?;
    let consumer = StreamingConsumer::new(ingest);

    let report = if stdin {
        consume_stdin(&consumer).await?
    } else {
        consume_amqp(settings, queue, &consumer).await?
    };

    println!(
        "{} Consumer drained: {} scraped, {} flagged, {} failed, {} rejected",
        style("✓").green().bold(),
        report.scraped,
        report.flagged,
        report.failed,
        report.rejected
    );
    Ok(())
}

/// Read one trigger payload per stdin line until EOF.
async fn consume_stdin(
    consumer: &StreamingConsumer,
) -> anyhow::Result<crate::services::ConsumerReport> {
    use tokio::io::AsyncBufReadExt;

    let (tx, mut ack_rx, mut queue) = ChannelTriggerQueue::new();

    let reader = tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
        // tx drops here, closing the queue.
    });

    let report = consumer.run(&mut queue).await?;
    ack_rx.close();
    reader.await?;
    Ok(report)
}

#[cfg(feature = "amqp")]
async fn consume_amqp(
    settings: &Settings,
    queue: Option<String>,
    consumer: &StreamingConsumer,
) -> anyhow::Result<crate::services::ConsumerReport> {
    let url = settings
        .amqp_url
        .as_deref()
        .context("HISCORED_AMQP_URL is not set")?;
    let queue_name = queue.unwrap_or_else(|| settings.amqp_queue.clone());

    info!(queue = %queue_name, "consuming scrape triggers");
    let mut amqp = crate::services::AmqpTriggerQueue::connect(url, &queue_name).await?;
    Ok(consumer.run(&mut amqp).await?)
}

#[cfg(not(feature = "amqp"))]
async fn consume_amqp(
    _settings: &Settings,
    _queue: Option<String>,
    _consumer: &StreamingConsumer,
) -> anyhow::Result<crate::services::ConsumerReport> {
    bail!("built without AMQP support; use --stdin or rebuild with `--features amqp`")
}

/// `status`: population and snapshot counts.
pub async fn cmd_status(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_exists() {
        bail!(
            "no database at {} (run `hiscored init` first)",
            settings.database_path().display()
        );
    }

    let pool = AsyncSqlitePool::new(&settings.database_url());
    let players = DieselPlayerRepository::new(pool.clone());
    let highscores = DieselHighscoreRepository::new(pool);

    let total = players.count().await?;
    let possible = players.count_possible_ban().await?;
    let confirmed = players.count_confirmed_ban().await?;
    let scraped_today = players
        .count_updated_since(current_day_boundary(Utc::now()))
        .await?;
    let snapshots = highscores.count().await?;

    println!("{}", style("hiscored status").bold());
    println!("  database:       {}", settings.database_path().display());
    println!("  players:        {total}");
    println!("  scraped today:  {scraped_today}");
    println!("  possible bans:  {possible}");
    println!("  confirmed bans: {confirmed}");
    println!("  snapshots:      {snapshots}");
    Ok(())
}
