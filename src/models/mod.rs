//! Domain models for players and hiscore snapshots.

mod highscore;
mod player;

pub use highscore::{
    HighscoreRecord, MinigameSnapshot, SkillSnapshot, ACTIVITY_NAMES, SKILL_NAMES,
};
pub use player::Player;
