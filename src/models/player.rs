//! Player identity and classification flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A known player account.
///
/// The ingestion core creates players on first encounter and mutates only
/// `possible_ban` and `updated_at`. The confirmed classification fields and
/// the label are owned by human review and are never written by the scraper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Internal numeric id.
    pub id: i32,
    /// Unique account name; matched case-insensitively against upstream.
    pub name: String,
    /// Set when a scrape attempt came back "not found" (HTTP 404).
    pub possible_ban: bool,
    /// Moderator-confirmed ban. Excluded from scraping.
    pub confirmed_ban: bool,
    /// Moderator-confirmed legitimate player.
    pub confirmed_player: bool,
    /// Opaque classification tag.
    pub label_id: Option<i32>,
    /// Timestamp of the last scrape attempt, successful or not.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Player {
    /// Whether this player was scraped at or after the given instant.
    pub fn scraped_since(&self, boundary: DateTime<Utc>) -> bool {
        self.updated_at.map(|ts| ts >= boundary).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn player() -> Player {
        Player {
            id: 1,
            name: "alice".to_string(),
            possible_ban: false,
            confirmed_ban: false,
            confirmed_player: false,
            label_id: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_scraped_since() {
        let boundary = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut player = player();
        assert!(!player.scraped_since(boundary));

        player.updated_at = Some(Utc.with_ymd_and_hms(2024, 5, 31, 23, 0, 0).unwrap());
        assert!(!player.scraped_since(boundary));

        player.updated_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        assert!(player.scraped_since(boundary));
    }
}
