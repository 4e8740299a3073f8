//! XP delta application
//!
//! The per-difficulty XP table lives on [`crate::types::Difficulty`];
//! this module holds the one pure mutation helper shared by the store and
//! its tests.

/// Apply a completion (or un-completion) delta to a cumulative XP counter.
///
/// Saturates at 0: an un-completion racing ahead of its completion cannot
/// drive the counter negative. The store mirrors this with
/// `MAX(0, current_xp + delta)` in SQL so the two never disagree.
pub fn apply_completion_delta(current_xp: i64, delta: i64) -> i64 {
    (current_xp + delta).max(0)
}
