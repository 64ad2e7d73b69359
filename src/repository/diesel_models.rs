//! Diesel record structs mapping to the schema tables.

use diesel::prelude::*;

use crate::schema::{highscores, players};

/// Database record for the players table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = players)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PlayerRecord {
    pub id: i32,
    pub name: String,
    pub possible_ban: i32,
    pub confirmed_ban: i32,
    pub confirmed_player: i32,
    pub label_id: Option<i32>,
    pub updated_at: Option<String>,
}

/// Insert struct for new players (id assigned by SQLite).
#[derive(Debug, Insertable)]
#[diesel(table_name = players)]
pub struct NewPlayer<'a> {
    pub name: &'a str,
    pub possible_ban: i32,
    pub confirmed_ban: i32,
    pub confirmed_player: i32,
    pub label_id: Option<i32>,
    pub updated_at: Option<&'a str>,
}

/// Database record for the highscores table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = highscores)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HighscoreRow {
    pub player_id: i32,
    pub created_at: String,
    pub skills: String,
    pub minigames: String,
}

/// Insert struct for highscore snapshots.
#[derive(Debug, Insertable)]
#[diesel(table_name = highscores)]
pub struct NewHighscore<'a> {
    pub player_id: i32,
    pub created_at: &'a str,
    pub skills: &'a str,
    pub minigames: &'a str,
}
