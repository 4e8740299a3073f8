//! Domain types
//!
//! Mirrors the relational schema: profiles, habits, completion records and
//! the per-user progress counters, plus the three closed enums (attribute,
//! difficulty, role). Enum wire labels are lowercase to match the database
//! enum values.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The five life-domain attributes habits are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Brain,
    Health,
    Skill,
    Discipline,
    Focus,
}

impl Attribute {
    /// All attributes in display order.
    pub const ALL: [Attribute; 5] = [
        Attribute::Brain,
        Attribute::Health,
        Attribute::Skill,
        Attribute::Discipline,
        Attribute::Focus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Brain => "brain",
            Attribute::Health => "health",
            Attribute::Skill => "skill",
            Attribute::Discipline => "discipline",
            Attribute::Focus => "focus",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "brain" => Some(Attribute::Brain),
            "health" => Some(Attribute::Health),
            "skill" => Some(Attribute::Skill),
            "discipline" => Some(Attribute::Discipline),
            "focus" => Some(Attribute::Focus),
            _ => None,
        }
    }

    /// Human label with the flavor the dashboard shows.
    pub fn display_name(&self) -> &'static str {
        match self {
            Attribute::Brain => "Brain",
            Attribute::Health => "Health",
            Attribute::Skill => "Skill",
            Attribute::Discipline => "Discipline",
            Attribute::Focus => "Focus",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Habit difficulty. Fully determines the habit's XP value at creation.
///
/// This is a closed enum: an unrecognized wire value fails deserialization
/// instead of silently falling back to the trivial reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Trivial,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Fixed XP reward per completion.
    pub fn xp_value(&self) -> u32 {
        match self {
            Difficulty::Trivial => 5,
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Trivial => "trivial",
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trivial" => Some(Difficulty::Trivial),
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application role for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// A user's hunter profile.
///
/// `current_level` is a derived cache of `current_xp`; the store re-derives
/// it with `level_for_xp` inside every XP mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub current_xp: i64,
    pub current_level: u32,
    pub streak_count: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A daily habit. `xp_value` always equals `difficulty.xp_value()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub attribute: Attribute,
    pub difficulty: Difficulty,
    pub xp_value: u32,
    pub is_active: bool,
}

/// One "done" marker per (habit, day). Deleted on toggle-off; `xp_earned`
/// snapshots the habit's xp_value so later habit edits never rewrite
/// history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub completed_date: NaiveDate,
    pub xp_earned: i64,
}

/// Lifetime progress counters maintained alongside the profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProgress {
    pub total_xp_earned: i64,
    pub total_habits_completed: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    pub last_reset_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_xp_table() {
        assert_eq!(Difficulty::Trivial.xp_value(), 5);
        assert_eq!(Difficulty::Easy.xp_value(), 10);
        assert_eq!(Difficulty::Medium.xp_value(), 15);
        assert_eq!(Difficulty::Hard.xp_value(), 20);
    }

    #[test]
    fn test_enum_wire_labels_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&Attribute::Discipline).unwrap(),
            "\"discipline\""
        );
        assert_eq!(
            serde_json::to_string(&Difficulty::Medium).unwrap(),
            "\"medium\""
        );
        let attr: Attribute = serde_json::from_str("\"focus\"").unwrap();
        assert_eq!(attr, Attribute::Focus);
    }

    #[test]
    fn test_unknown_difficulty_is_rejected() {
        // Strict deviation from the source's silent fallback-to-5.
        let result: Result<Difficulty, _> = serde_json::from_str("\"legendary\"");
        assert!(result.is_err());
        assert_eq!(Difficulty::parse("legendary"), None);
    }

    #[test]
    fn test_parse_round_trips() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::parse(attr.as_str()), Some(attr));
        }
        for diff in [
            Difficulty::Trivial,
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
        ] {
            assert_eq!(Difficulty::parse(diff.as_str()), Some(diff));
        }
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
    }
}
