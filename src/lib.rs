//! hiscored - continuous hiscore ingestion for player behaviour analysis.
//!
//! Scrapes a rate-limited upstream leaderboard service for player skill and
//! minigame statistics, persists the snapshots, and keeps the whole player
//! population covered over time without starving anyone.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod services;
