//! Upstream scraping: HTTP client, response parsing, batch selection.

mod http_client;
mod parser;
mod selection;
mod user_agent;

pub use http_client::{FetchError, FetchOutcome, Fetcher, HiscoreClient};
pub use parser::parse_hiscore;
pub use selection::{current_day_boundary, eligible_players, select_batch};
pub use user_agent::{random_user_agent, USER_AGENTS};
