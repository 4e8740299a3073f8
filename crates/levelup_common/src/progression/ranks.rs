//! Hunter ranks
//!
//! Coarse, human-readable labels derived from overall level via fixed
//! thresholds. The bands are not mutually exclusive when checked in
//! ascending order, so evaluation walks the table highest-first.

use serde::{Deserialize, Serialize};

/// Rank thresholds, highest first. A level maps to the first band whose
/// minimum it meets.
pub const RANK_THRESHOLDS: &[(u32, Rank)] = &[
    (50, Rank::UniversalHunter),
    (40, Rank::Monarch),
    (30, Rank::Shadow),
    (25, Rank::SRank),
    (20, Rank::ARank),
    (15, Rank::BRank),
    (10, Rank::CRank),
    (5, Rank::DRank),
];

/// The nine fixed hunter ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "E-Rank")]
    ERank,
    #[serde(rename = "D-Rank")]
    DRank,
    #[serde(rename = "C-Rank")]
    CRank,
    #[serde(rename = "B-Rank")]
    BRank,
    #[serde(rename = "A-Rank")]
    ARank,
    #[serde(rename = "S-Rank")]
    SRank,
    #[serde(rename = "Shadow")]
    Shadow,
    #[serde(rename = "Monarch")]
    Monarch,
    #[serde(rename = "Universal Hunter")]
    UniversalHunter,
}

impl Rank {
    /// Display label, matching the wire form.
    pub fn label(&self) -> &'static str {
        match self {
            Rank::ERank => "E-Rank",
            Rank::DRank => "D-Rank",
            Rank::CRank => "C-Rank",
            Rank::BRank => "B-Rank",
            Rank::ARank => "A-Rank",
            Rank::SRank => "S-Rank",
            Rank::Shadow => "Shadow",
            Rank::Monarch => "Monarch",
            Rank::UniversalHunter => "Universal Hunter",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Map an overall level to its rank, checking the highest band first.
pub fn rank_for_level(level: u32) -> Rank {
    for &(min, rank) in RANK_THRESHOLDS {
        if level >= min {
            return rank;
        }
    }
    Rank::ERank
}
