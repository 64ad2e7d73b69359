//! Configuration for the ingestion daemon.
//!
//! Settings come from built-in defaults, overridden by `HISCORED_*`
//! environment variables (a `.env` file is honoured), overridden again by
//! CLI flags where a command exposes them.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default upstream hiscore endpoint (line-oriented "lite" format).
pub const DEFAULT_HISCORE_URL: &str =
    "https://secure.runescape.com/m=hiscore_oldschool/index_lite.ws";

/// Default number of players per scrape batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default number of batches between candidate-list refreshes.
pub const DEFAULT_REFRESH_EVERY_BATCHES: usize = 20;

/// Runtime settings for scraping and persistence.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,
    /// Upstream hiscore endpoint; the player name is appended as a query.
    pub hiscore_url: String,
    /// Players per batch.
    pub batch_size: usize,
    /// Batches processed before the candidate list is re-read from the store.
    pub refresh_every_batches: usize,
    /// Hard timeout per HTTP attempt, independent of the retry budget.
    pub request_timeout: Duration,
    /// Politeness delay applied after each upstream request.
    pub request_delay: Duration,
    /// Maximum fetch attempts per player (first try included).
    pub max_attempts: u32,
    /// AMQP connection string for the streaming trigger consumer.
    pub amqp_url: Option<String>,
    /// Queue name carrying scrape trigger messages.
    pub amqp_queue: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            hiscore_url: DEFAULT_HISCORE_URL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            refresh_every_batches: DEFAULT_REFRESH_EVERY_BATCHES,
            request_timeout: Duration::from_secs(15),
            request_delay: Duration::from_millis(250),
            max_attempts: 5,
            amqp_url: None,
            amqp_queue: "scrape-triggers".to_string(),
        }
    }
}

impl Settings {
    /// Build settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(dir) = std::env::var("HISCORED_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("HISCORED_HISCORE_URL") {
            settings.hiscore_url = url;
        }
        if let Some(n) = env_parse::<usize>("HISCORED_BATCH_SIZE") {
            settings.batch_size = n.max(1);
        }
        if let Some(n) = env_parse::<usize>("HISCORED_REFRESH_EVERY_BATCHES") {
            settings.refresh_every_batches = n.max(1);
        }
        if let Some(n) = env_parse::<u64>("HISCORED_REQUEST_TIMEOUT_SECS") {
            settings.request_timeout = Duration::from_secs(n);
        }
        if let Some(n) = env_parse::<u64>("HISCORED_REQUEST_DELAY_MS") {
            settings.request_delay = Duration::from_millis(n);
        }
        if let Some(n) = env_parse::<u32>("HISCORED_MAX_ATTEMPTS") {
            settings.max_attempts = n.max(1);
        }
        if let Ok(url) = std::env::var("HISCORED_AMQP_URL") {
            settings.amqp_url = Some(url);
        }
        if let Ok(queue) = std::env::var("HISCORED_AMQP_QUEUE") {
            settings.amqp_queue = queue;
        }

        settings
    }

    /// Override the data directory (CLI flag wins over environment).
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("hiscored.db")
    }

    /// Database URL for diesel.
    pub fn database_url(&self) -> String {
        self.database_path().display().to_string()
    }

    /// Check whether the database file exists.
    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Create the data directory if missing.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Resolve settings for a CLI invocation.
pub fn load_settings(data_dir: Option<&Path>) -> Settings {
    let settings = Settings::from_env();
    match data_dir {
        Some(dir) => settings.with_data_dir(dir.to_path_buf()),
        None => settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.refresh_every_batches, 20);
        assert_eq!(settings.max_attempts, 5);
        assert!(settings.hiscore_url.contains("hiscore"));
    }

    #[test]
    fn test_database_path_under_data_dir() {
        let settings = Settings::default().with_data_dir(PathBuf::from("/tmp/hs"));
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/hs/hiscored.db"));
        assert_eq!(settings.database_url(), "/tmp/hs/hiscored.db");
    }
}
