//! Rate-limited HTTP client for the upstream hiscore endpoint.
//!
//! One GET per player. Transient upstream trouble (throttling, server
//! errors, timeouts) is retried with exponential backoff; a 404 is not an
//! error but the upstream's way of saying the player no longer exists on
//! the leaderboard, which the pipeline records as a possible ban.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::user_agent::random_user_agent;

/// Result of a hiscore fetch for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Response body split into ordered lines.
    Hiscore(Vec<String>),
    /// Upstream returned 404: the player is banned or unknown.
    Banned,
}

/// Fetch failure after local recovery (retries) has been exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("retry budget exhausted after {attempts} attempts (last status: {last_status:?})")]
    RetriesExhausted {
        attempts: u32,
        last_status: Option<u16>,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Seam between the ingest pipeline and the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, player_name: &str) -> Result<FetchOutcome, FetchError>;
}

/// Statuses worth retrying. Everything else is terminal for the attempt.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Exponential backoff: 1s, 2s, 4s, 8s, 16s for attempts 1..=5.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << (attempt.saturating_sub(1)).min(16))
}

/// HTTP client for the upstream hiscore endpoint.
#[derive(Clone)]
pub struct HiscoreClient {
    client: Client,
    base_url: String,
    request_delay: Duration,
    max_attempts: u32,
}

impl HiscoreClient {
    /// Create a new client.
    ///
    /// `timeout` bounds each individual attempt; the retry backoff budget
    /// comes on top of it.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        request_delay: Duration,
        max_attempts: u32,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('?').to_string(),
            request_delay,
            max_attempts: max_attempts.max(1),
        })
    }

    /// Build the upstream URL for a player.
    pub fn hiscore_url(&self, player_name: &str) -> String {
        format!(
            "{}?player={}",
            self.base_url,
            urlencoding::encode(player_name)
        )
    }
}

#[async_trait]
impl Fetcher for HiscoreClient {
    async fn fetch(&self, player_name: &str) -> Result<FetchOutcome, FetchError> {
        let url = self.hiscore_url(player_name);
        let mut last_status = None;

        for attempt in 1..=self.max_attempts {
            let result = self
                .client
                .get(&url)
                .header(reqwest::header::USER_AGENT, random_user_agent())
                .send()
                .await;

            let response = match result {
                Ok(r) => r,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    debug!(player = player_name, attempt, error = %e, "transport error, retrying");
                    if attempt == self.max_attempts {
                        return Err(FetchError::RetriesExhausted {
                            attempts: attempt,
                            last_status,
                        });
                    }
                    tokio::time::sleep(backoff_delay(attempt)).await;
                    continue;
                }
                Err(e) => return Err(FetchError::Transport(e)),
            };

            let status = response.status();

            if status == StatusCode::NOT_FOUND {
                debug!(player = player_name, "upstream 404, flagging possible ban");
                tokio::time::sleep(self.request_delay).await;
                return Ok(FetchOutcome::Banned);
            }

            if status.is_success() {
                let body = response.text().await?;
                debug!(
                    player = player_name,
                    status = status.as_u16(),
                    bytes = body.len(),
                    "hiscore fetched"
                );
                let lines = body.lines().map(str::to_string).collect();
                tokio::time::sleep(self.request_delay).await;
                return Ok(FetchOutcome::Hiscore(lines));
            }

            if is_retryable_status(status.as_u16()) {
                last_status = Some(status.as_u16());
                debug!(
                    player = player_name,
                    status = status.as_u16(),
                    attempt,
                    "retryable upstream status"
                );
                if attempt == self.max_attempts {
                    break;
                }
                tokio::time::sleep(backoff_delay(attempt)).await;
                continue;
            }

            // Fatal statuses still pay the politeness delay, so a blanket
            // upstream rejection cannot turn the cycle into a tight loop.
            tokio::time::sleep(self.request_delay).await;
            return Err(FetchError::Status(status.as_u16()));
        }

        Err(FetchError::RetriesExhausted {
            attempts: self.max_attempts,
            last_status,
        })
    }
}
