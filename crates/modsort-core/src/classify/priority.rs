//! Priority ruler
//!
//! Priorities form an inverted urgency scale: `0` is cosmetic/optional and
//! `1` is core/essential, with `2..=5` in between. The folder label is a fixed
//! function of the priority.

use serde::{Deserialize, Serialize};

use crate::error::{ModSortError, Result};

/// Highest score the three sub-scores can add up to (4 + 1 + 3).
pub const MAX_SCORE: u8 = 8;

/// Folder labels indexed by priority.
pub const FOLDER_LABELS: [&str; 6] = [
    "00 - Cosmético",
    "01 - Core",
    "02 - Sistemas",
    "03 - Gameplay",
    "04 - Persistente",
    "05 - Volátil",
];

/// Score thresholds, checked in order: `(minimum score, priority)`.
pub const SCORE_THRESHOLDS: [(u8, u8); 3] = [(7, 1), (5, 2), (3, 3)];

/// Priority tier in `0..=5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const COSMETIC: Priority = Priority(0);
    pub const CORE: Priority = Priority(1);
    pub const SYSTEMS: Priority = Priority(2);
    pub const GAMEPLAY: Priority = Priority(3);
    pub const PERSISTENT: Priority = Priority(4);
    pub const VOLATILE: Priority = Priority(5);

    pub fn new(value: u8) -> Result<Self> {
        if (value as usize) < FOLDER_LABELS.len() {
            Ok(Self(value))
        } else {
            Err(ModSortError::InvalidInput {
                reason: format!("priority {} is outside 0..=5", value),
            })
        }
    }

    /// Map a total score to a priority.
    ///
    /// A score of exactly 2 lands on priority 4; 0 and 1 land on priority 0.
    /// Priority 5 is never produced here.
    pub fn from_score(score: u8) -> Self {
        for (min, priority) in SCORE_THRESHOLDS {
            if score >= min {
                return Self(priority);
            }
        }
        if score == 2 {
            Self::PERSISTENT
        } else {
            Self::COSMETIC
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn folder(&self) -> &'static str {
        FOLDER_LABELS[self.0 as usize]
    }

    /// All priorities with their folder labels
    pub fn all() -> impl Iterator<Item = Priority> {
        (0..FOLDER_LABELS.len() as u8).map(Priority)
    }
}

impl TryFrom<u8> for Priority {
    type Error = ModSortError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
