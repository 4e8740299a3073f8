//! Wire types for the levelupd HTTP API
//!
//! Shared by the daemon's handlers and the CLI client so the two ends can
//! never drift apart.

use crate::progression::{progress_fraction, rank_for_level, required_xp};
use crate::types::{Attribute, Difficulty, Profile, Role};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable machine-readable code, e.g. "validation", "onboarding_required".
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub user_id: Uuid,
    /// Bearer token; shown once, only a digest is stored server-side.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub has_profile: bool,
}

/// One habit in the onboarding batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingHabit {
    pub name: String,
    pub attribute: Attribute,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingRequest {
    pub full_name: String,
    pub habits: Vec<OnboardingHabit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
    pub attribute: Attribute,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionToggleRequest {
    pub habit_id: Uuid,
    /// Completion date; defaults to today (server clock) when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Result of a toggle, carrying the profile re-read after the committed
/// write. Clients render from this instead of guessing optimistically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionToggleResponse {
    /// True if the habit is now completed for the date, false if unchecked.
    pub completed: bool,
    pub xp_delta: i64,
    pub profile: ProfileView,
}

/// Dashboard view of a profile: raw counters plus the derived display
/// values the progression engine computes on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub full_name: String,
    pub current_xp: i64,
    pub current_level: u32,
    pub streak_count: u32,
    pub rank: String,
    pub next_level_xp: f64,
    pub progress_fraction: f64,
}

impl ProfileView {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            current_xp: profile.current_xp,
            current_level: profile.current_level,
            streak_count: profile.streak_count,
            rank: rank_for_level(profile.current_level).label().to_string(),
            next_level_xp: required_xp(profile.current_level),
            progress_fraction: progress_fraction(profile.current_xp, profile.current_level),
        }
    }
}

/// Per-attribute sub-progression, derived from all-time completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillView {
    pub attribute: Attribute,
    pub xp: i64,
    pub level: u32,
    pub next_level_xp: f64,
    pub progress_fraction: f64,
    pub habit_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillsResponse {
    pub total_xp: i64,
    pub overall_level: u32,
    pub rank: String,
    pub skills: Vec<SkillView>,
}

/// One row of the admin user table: profile joined with role and lifetime
/// progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserRow {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub current_level: u32,
    pub current_xp: i64,
    pub created_at: DateTime<Utc>,
    pub role: Role,
    pub total_habits_completed: u64,
    pub current_streak: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile(xp: i64, level: u32) -> Profile {
        Profile {
            user_id: Uuid::new_v4(),
            full_name: "Jin".to_string(),
            email: "jin@example.com".to_string(),
            current_xp: xp,
            current_level: level,
            streak_count: 3,
            last_activity_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_view_derives_display_values() {
        // Five hard completions on a fresh profile: 100 XP, still level 1,
        // still E-Rank against the 1000 XP first threshold.
        let view = ProfileView::from_profile(&sample_profile(100, 1));
        assert_eq!(view.rank, "E-Rank");
        assert_eq!(view.next_level_xp, 1000.0);
        assert!((view.progress_fraction - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_profile_view_high_level_rank() {
        let view = ProfileView::from_profile(&sample_profile(2_000_000, 52));
        assert_eq!(view.rank, "Universal Hunter");
    }
}
