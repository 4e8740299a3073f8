//! Progression engine
//!
//! Pure, deterministic mapping from XP quantities to levels and ranks.
//! No side effects, no I/O, safe to call from any thread.
//!
//! Two distinct growth curves are in play and must stay separate:
//!
//! - **Overall curve**: the cumulative-XP threshold for leaving level L is
//!   `(L * 100)^1.5`. Steep on purpose: the first level-up sits at 1000 XP
//!   while a single habit completion pays 5-20.
//! - **Attribute curve**: `level = floor(sqrt(xp / 50)) + 1`, invertible
//!   from XP, used for the five per-attribute sub-levels.

pub mod curves;
pub mod ranks;
pub mod xp;

pub use curves::{
    attribute_level, attribute_progress_fraction, level_for_xp, progress_fraction,
    required_attribute_xp, required_xp, MAX_LEVEL,
};
pub use ranks::{rank_for_level, Rank, RANK_THRESHOLDS};
pub use xp::apply_completion_delta;
