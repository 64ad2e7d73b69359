//! Hiscore snapshot types.
//!
//! The upstream response is positional: one line per skill in a fixed order,
//! then one line per minigame/boss in a fixed order. Those orders are
//! declared exactly once below as slices, and every positional index during
//! parsing and every iteration over a snapshot goes through them. Snapshots
//! are freshly allocated per parse call; nothing here is shared mutable
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Skill rows in upstream response order. "total" is the aggregate row.
pub const SKILL_NAMES: &[&str] = &[
    "total",
    "Attack",
    "Defence",
    "Strength",
    "Hitpoints",
    "Ranged",
    "Prayer",
    "Magic",
    "Cooking",
    "Woodcutting",
    "Fletching",
    "Fishing",
    "Firemaking",
    "Crafting",
    "Smithing",
    "Mining",
    "Herblore",
    "Agility",
    "Thieving",
    "Slayer",
    "Farming",
    "Runecraft",
    "Hunter",
    "Construction",
];

/// Minigame and boss rows in upstream response order, following the skills.
pub const ACTIVITY_NAMES: &[&str] = &[
    "league",
    "bounty_hunter_hunter",
    "bounty_hunter_rogue",
    "cs_all",
    "cs_beginner",
    "cs_easy",
    "cs_medium",
    "cs_hard",
    "cs_elite",
    "cs_master",
    "lms_rank",
    "soul_wars_zeal",
    "abyssal_sire",
    "alchemical_hydra",
    "barrows_chests",
    "bryophyta",
    "callisto",
    "cerberus",
    "chambers_of_xeric",
    "chambers_of_xeric_challenge_mode",
    "chaos_elemental",
    "chaos_fanatic",
    "commander_zilyana",
    "corporeal_beast",
    "crazy_archaeologist",
    "dagannoth_prime",
    "dagannoth_rex",
    "dagannoth_supreme",
    "deranged_archaeologist",
    "general_graardor",
    "giant_mole",
    "grotesque_guardians",
    "hespori",
    "kalphite_queen",
    "king_black_dragon",
    "kraken",
    "kreearra",
    "kril_tsutsaroth",
    "mimic",
    "nightmare",
    "obor",
    "sarachnis",
    "scorpia",
    "skotizo",
    "the_gauntlet",
    "the_corrupted_gauntlet",
    "theatre_of_blood",
    "thermonuclear_smoke_devil",
    "tzkal_zuk",
    "tztok_jad",
    "venenatis",
    "vetion",
    "vorkath",
    "wintertodt",
    "zalcano",
    "zulrah",
];

/// One value slot per name in a fixed name table.
///
/// `values[i]` corresponds to `names[i]`; `None` means the row was missing
/// or unparseable at scrape time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    values: Vec<Option<i64>>,
}

impl Snapshot {
    fn empty(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    fn set(&mut self, index: usize, value: Option<i64>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    fn get(&self, names: &[&str], name: &str) -> Option<i64> {
        names
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values[i])
    }

    fn to_json(&self, names: &[&str]) -> Value {
        let mut map = serde_json::Map::with_capacity(names.len());
        for (name, value) in names.iter().zip(&self.values) {
            let v = match value {
                Some(n) => Value::from(*n),
                None => Value::Null,
            };
            map.insert((*name).to_string(), v);
        }
        Value::Object(map)
    }

    fn from_json(names: &[&str], value: &Value) -> Self {
        let mut snapshot = Self::empty(names.len());
        if let Some(map) = value.as_object() {
            for (i, name) in names.iter().enumerate() {
                snapshot.values[i] = map.get(*name).and_then(Value::as_i64);
            }
        }
        snapshot
    }

    fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }
}

/// Experience values for every known skill, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSnapshot(Snapshot);

impl SkillSnapshot {
    pub fn new() -> Self {
        Self(Snapshot::empty(SKILL_NAMES.len()))
    }

    /// Set the experience value at a skill position.
    pub fn set(&mut self, index: usize, experience: Option<i64>) {
        self.0.set(index, experience);
    }

    /// Experience for a skill by name.
    pub fn experience(&self, skill: &str) -> Option<i64> {
        self.0.get(SKILL_NAMES, skill)
    }

    /// Iterate (skill name, experience) pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<i64>)> + '_ {
        SKILL_NAMES.iter().copied().zip(self.0.values.iter().copied())
    }

    /// True when every skill slot holds a value.
    pub fn is_complete(&self) -> bool {
        self.0.is_complete()
    }

    pub fn to_json(&self) -> Value {
        self.0.to_json(SKILL_NAMES)
    }

    pub fn from_json(value: &Value) -> Self {
        Self(Snapshot::from_json(SKILL_NAMES, value))
    }
}

impl Default for SkillSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Scores for every known minigame/boss, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinigameSnapshot(Snapshot);

impl MinigameSnapshot {
    pub fn new() -> Self {
        Self(Snapshot::empty(ACTIVITY_NAMES.len()))
    }

    /// Set the score value at an activity position.
    pub fn set(&mut self, index: usize, score: Option<i64>) {
        self.0.set(index, score);
    }

    /// Score for an activity by name.
    pub fn score(&self, activity: &str) -> Option<i64> {
        self.0.get(ACTIVITY_NAMES, activity)
    }

    /// Iterate (activity name, score) pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<i64>)> + '_ {
        ACTIVITY_NAMES
            .iter()
            .copied()
            .zip(self.0.values.iter().copied())
    }

    /// True when every activity slot holds a value.
    pub fn is_complete(&self) -> bool {
        self.0.is_complete()
    }

    pub fn to_json(&self) -> Value {
        self.0.to_json(ACTIVITY_NAMES)
    }

    pub fn from_json(value: &Value) -> Self {
        Self(Snapshot::from_json(ACTIVITY_NAMES, value))
    }
}

impl Default for MinigameSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// A persisted capture of one player's hiscore state.
///
/// Constructed by the ingest pipeline and handed to the highscore
/// repository; the core never reads it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighscoreRecord {
    pub player_id: i32,
    pub created_at: DateTime<Utc>,
    pub skills: SkillSnapshot,
    pub minigames: MinigameSnapshot,
}

impl HighscoreRecord {
    pub fn new(player_id: i32, skills: SkillSnapshot, minigames: MinigameSnapshot) -> Self {
        Self {
            player_id,
            created_at: Utc::now(),
            skills,
            minigames,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_table_sizes() {
        assert_eq!(SKILL_NAMES.len(), 24);
        assert_eq!(ACTIVITY_NAMES.len(), 56);
    }

    #[test]
    fn test_snapshot_one_entry_per_name() {
        let skills = SkillSnapshot::new();
        assert_eq!(skills.iter().count(), SKILL_NAMES.len());
        assert!(skills.iter().all(|(_, v)| v.is_none()));

        let minigames = MinigameSnapshot::new();
        assert_eq!(minigames.iter().count(), ACTIVITY_NAMES.len());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut skills = SkillSnapshot::new();
        skills.set(0, Some(13_034_431));
        skills.set(1, Some(737_627));

        let json = skills.to_json();
        assert_eq!(json["total"], 13_034_431_i64);
        assert_eq!(json["Attack"], 737_627_i64);
        assert!(json["Defence"].is_null());

        let restored = SkillSnapshot::from_json(&json);
        assert_eq!(restored, skills);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut minigames = MinigameSnapshot::new();
        minigames.set(0, Some(42));
        assert_eq!(minigames.score("league"), Some(42));
        assert_eq!(minigames.score("zulrah"), None);
        assert_eq!(minigames.score("not_a_minigame"), None);
    }
}
