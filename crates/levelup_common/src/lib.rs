//! LevelUp shared library
//!
//! Everything both the daemon (`levelupd`) and the CLI (`levelupctl`) need:
//! the progression engine, domain types, wire types, errors and config.
//!
//! The progression engine is a pure function library with no I/O; all
//! persistence lives in the daemon's store.

pub mod api;
pub mod config;
pub mod error;
pub mod progression;
pub mod types;

pub use api::{
    AdminUserRow, ApiError, CompletionToggleRequest, CompletionToggleResponse,
    CreateHabitRequest, OnboardingHabit, OnboardingRequest, ProfileView, SignupRequest,
    SignupResponse, SkillView, SkillsResponse, WhoamiResponse,
};
pub use config::LevelUpConfig;
pub use error::LevelUpError;
pub use progression::{
    apply_completion_delta, attribute_level, attribute_progress_fraction, level_for_xp,
    progress_fraction, rank_for_level, required_attribute_xp, required_xp, Rank, MAX_LEVEL,
};
pub use types::{Attribute, CompletionRecord, Difficulty, Habit, Profile, Role, UserProgress};
