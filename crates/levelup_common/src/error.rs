//! Error taxonomy
//!
//! Three families, per the failure model of the app:
//! validation (rejected before any store call), backend (store rejected a
//! write; surfaced once, no retry), and derived-state inconsistency
//! (a session with no profile, answered with "go to onboarding").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelUpError {
    /// Rejected locally before touching the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No (or invalid) bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// Valid session, insufficient role.
    #[error("forbidden: requires {0} role")]
    Forbidden(&'static str),

    /// Valid session but no profile row yet.
    #[error("profile not found; onboarding required")]
    OnboardingRequired,

    /// Requested row does not exist (or belongs to someone else).
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness or other constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store itself failed. Terminal for this user action.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LevelUpError {
    /// Stable machine-readable code for the wire.
    pub fn code(&self) -> &'static str {
        match self {
            LevelUpError::Validation(_) => "validation",
            LevelUpError::Unauthorized => "unauthorized",
            LevelUpError::Forbidden(_) => "forbidden",
            LevelUpError::OnboardingRequired => "onboarding_required",
            LevelUpError::NotFound(_) => "not_found",
            LevelUpError::Conflict(_) => "conflict",
            LevelUpError::Storage(_) => "storage",
        }
    }
}

impl From<rusqlite::Error> for LevelUpError {
    fn from(e: rusqlite::Error) -> Self {
        LevelUpError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(LevelUpError::Unauthorized.code(), "unauthorized");
        assert_eq!(LevelUpError::OnboardingRequired.code(), "onboarding_required");
        assert_eq!(
            LevelUpError::Validation("empty name".into()).code(),
            "validation"
        );
    }
}
