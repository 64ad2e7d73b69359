//! Parser for the line-oriented hiscore response format.
//!
//! The body is one CSV row per line, positional: the first 24 lines are the
//! skills (`rank,level,experience`), everything after that is minigames and
//! bosses (`rank,score`), both in the fixed orders declared in
//! `models::highscore`. Only the experience and score fields are retained.

use crate::models::{MinigameSnapshot, SkillSnapshot, SKILL_NAMES};

/// Parse a hiscore response body into skill and minigame snapshots.
///
/// Pure function: fresh snapshots per call, same input, same output. A
/// short or malformed line leaves that position's value unset rather than
/// failing; lines beyond the expected count are ignored; truncated input
/// leaves trailing entries unset.
pub fn parse_hiscore(lines: &[String]) -> (SkillSnapshot, MinigameSnapshot) {
    let mut skills = SkillSnapshot::new();
    let mut minigames = MinigameSnapshot::new();

    for (index, line) in lines.iter().enumerate() {
        if index < SKILL_NAMES.len() {
            // rank,level,experience - keep experience
            skills.set(index, csv_field(line, 2));
        } else {
            // rank,score - keep score
            minigames.set(index - SKILL_NAMES.len(), csv_field(line, 1));
        }
    }

    (skills, minigames)
}

fn csv_field(line: &str, position: usize) -> Option<i64> {
    line.split(',').nth(position)?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ACTIVITY_NAMES;

    fn full_input() -> Vec<String> {
        let mut lines = Vec::new();
        for i in 0..SKILL_NAMES.len() {
            lines.push(format!("{},99,{}", i + 1, 1_000_000 + i));
        }
        for i in 0..ACTIVITY_NAMES.len() {
            lines.push(format!("{},{}", i + 1, 100 + i));
        }
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_full_input_populates_everything() {
        let (skills, minigames) = parse_hiscore(&full_input());
        assert!(skills.is_complete());
        assert!(minigames.is_complete());
        assert_eq!(skills.experience("total"), Some(1_000_000));
        assert_eq!(skills.experience("Construction"), Some(1_000_023));
        assert_eq!(minigames.score("league"), Some(100));
        assert_eq!(minigames.score("zulrah"), Some(155));
    }

    #[test]
    fn test_parse_is_pure() {
        let input = full_input();
        assert_eq!(parse_hiscore(&input), parse_hiscore(&input));
    }

    #[test]
    fn test_field_extraction_positions() {
        let lines = vec!["1234,99,13034431".to_string()];
        let (skills, _) = parse_hiscore(&lines);
        assert_eq!(skills.experience("total"), Some(13_034_431));

        let mut lines = full_input();
        lines[SKILL_NAMES.len()] = "500,42".to_string();
        let (_, minigames) = parse_hiscore(&lines);
        assert_eq!(minigames.score(ACTIVITY_NAMES[0]), Some(42));
    }

    #[test]
    fn test_truncated_input_leaves_trailing_unset() {
        let lines: Vec<String> = full_input().into_iter().take(10).collect();
        let (skills, minigames) = parse_hiscore(&lines);

        assert_eq!(skills.iter().filter(|(_, v)| v.is_some()).count(), 10);
        assert_eq!(skills.experience("Construction"), None);
        assert!(minigames.iter().all(|(_, v)| v.is_none()));
        // Still exactly one entry per known name.
        assert_eq!(skills.iter().count(), SKILL_NAMES.len());
        assert_eq!(minigames.iter().count(), ACTIVITY_NAMES.len());
    }

    #[test]
    fn test_malformed_lines_leave_gaps() {
        let mut lines = full_input();
        lines[3] = "12,99".to_string(); // too short for a skill row
        lines[5] = "not,a,number".to_string();
        lines[SKILL_NAMES.len() + 2] = "7".to_string(); // too short for a score row

        let (skills, minigames) = parse_hiscore(&lines);
        assert_eq!(skills.experience(SKILL_NAMES[3]), None);
        assert_eq!(skills.experience(SKILL_NAMES[5]), None);
        assert_eq!(skills.experience(SKILL_NAMES[4]), Some(1_000_004));
        assert_eq!(minigames.score(ACTIVITY_NAMES[2]), None);
    }

    #[test]
    fn test_excess_lines_are_ignored() {
        let mut lines = full_input();
        lines.push("9,9,9".to_string());
        lines.push("1,1".to_string());

        let (skills, minigames) = parse_hiscore(&lines);
        assert!(skills.is_complete());
        assert!(minigames.is_complete());
        assert_eq!(minigames.iter().count(), ACTIVITY_NAMES.len());
    }

    #[test]
    fn test_unranked_negative_values_parse() {
        // Upstream reports -1 for unranked entries.
        let mut lines = full_input();
        lines[SKILL_NAMES.len()] = "-1,-1".to_string();
        let (_, minigames) = parse_hiscore(&lines);
        assert_eq!(minigames.score(ACTIVITY_NAMES[0]), Some(-1));
    }
}
