//! Batch selection policy.
//!
//! Decides which players get scraped in the current cycle: confirmed bans
//! are never scraped, players already scraped today wait for the next UTC
//! day, and a bounded random window keeps batches fair without starving
//! anyone (the scheduler removes processed players from the candidate list,
//! so repeated windows always cover new ground).

use chrono::{DateTime, NaiveTime, Utc};

use crate::models::Player;

/// Most recent UTC midnight at or before `now`.
pub fn current_day_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Names of players eligible for scraping right now, in store order.
///
/// Excludes confirmed bans and players whose last scrape attempt falls
/// within the current UTC day.
pub fn eligible_players(players: &[Player], now: DateTime<Utc>) -> Vec<String> {
    let boundary = current_day_boundary(now);

    players
        .iter()
        .filter(|p| !p.confirmed_ban)
        .filter(|p| !p.scraped_since(boundary))
        .map(|p| p.name.clone())
        .collect()
}

/// Pick one batch from the candidate list.
///
/// When the list fits in `batch_size` the whole list is returned (terminal
/// batch of the cycle). Otherwise a uniformly random contiguous window of
/// `batch_size` names, order preserved.
pub fn select_batch(candidates: &[String], batch_size: usize) -> Vec<String> {
    if candidates.len() <= batch_size {
        return candidates.to_vec();
    }

    let start = random_below(candidates.len() - batch_size + 1);
    candidates[start..start + batch_size].to_vec()
}

fn random_below(bound: usize) -> usize {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0);
    nanos % bound.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn player(id: i32, name: &str) -> Player {
        Player {
            id,
            name: name.to_string(),
            possible_ban: false,
            confirmed_ban: false,
            confirmed_player: false,
            label_id: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_confirmed_bans_never_selected() {
        let mut banned = player(1, "banned");
        banned.confirmed_ban = true;
        let players = vec![banned, player(2, "ok")];

        let names = eligible_players(&players, Utc::now());
        assert_eq!(names, vec!["ok".to_string()]);
    }

    #[test]
    fn test_players_updated_today_excluded_until_rollover() {
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();

        let mut fresh = player(1, "fresh");
        fresh.updated_at = Some(Utc.with_ymd_and_hms(2024, 6, 2, 1, 0, 0).unwrap());
        let mut stale = player(2, "stale");
        stale.updated_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap());
        let players = vec![fresh, stale, player(3, "never")];

        let names = eligible_players(&players, now);
        assert_eq!(names, vec!["stale".to_string(), "never".to_string()]);

        // After the UTC day rolls over, the fresh player is eligible again.
        let tomorrow = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 1).unwrap();
        let names = eligible_players(&players, tomorrow);
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_day_boundary_is_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 23, 59, 59).unwrap();
        let boundary = current_day_boundary(now);
        assert_eq!(boundary, Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_batch_is_contiguous_window() {
        let candidates: Vec<String> = (0..120).map(|i| format!("p{i}")).collect();
        let batch = select_batch(&candidates, 50);

        assert_eq!(batch.len(), 50);
        let start = candidates
            .iter()
            .position(|n| *n == batch[0])
            .expect("batch entries come from the candidate list");
        assert_eq!(&candidates[start..start + 50], &batch[..]);
    }

    #[test]
    fn test_terminal_batch_takes_everyone() {
        let candidates: Vec<String> = (0..30).map(|i| format!("p{i}")).collect();
        let batch = select_batch(&candidates, 50);
        assert_eq!(batch, candidates);
    }

    #[test]
    fn test_empty_candidates_yield_empty_batch() {
        assert!(select_batch(&[], 50).is_empty());
    }
}
