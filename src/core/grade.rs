//! Review grades supplied by the caller after each flashcard interaction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RetainError, Result};

/// How well the learner recalled an item.
///
/// Totally ordered by recall quality: `Forgot < Hard < Good < Easy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewGrade {
    /// Could not recall the item.
    Forgot,
    /// Recalled with serious difficulty.
    Hard,
    /// Recalled after some hesitation.
    Good,
    /// Recalled instantly.
    Easy,
}

impl ReviewGrade {
    /// All grades in ascending order of quality.
    pub const ALL: [ReviewGrade; 4] = [Self::Forgot, Self::Hard, Self::Good, Self::Easy];

    /// SM-2 quality score for this grade.
    pub fn quality(self) -> u8 {
        match self {
            Self::Forgot => 0,
            Self::Hard => 3,
            Self::Good => 4,
            Self::Easy => 5,
        }
    }

    /// Whether the grade counts as a correct answer.
    pub fn is_correct(self) -> bool {
        self != Self::Forgot
    }

    /// Lowercase label used in JSON and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forgot => "forgot",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }

    /// Map an SM-2 quality back to a grade.
    ///
    /// Only the four qualities the scheduler produces are accepted.
    pub fn from_quality(quality: u8) -> Result<Self> {
        match quality {
            0 => Ok(Self::Forgot),
            3 => Ok(Self::Hard),
            4 => Ok(Self::Good),
            5 => Ok(Self::Easy),
            other => Err(RetainError::invalid_grade(other.to_string())),
        }
    }

    /// Map any SM-2 quality (0-5 scale) to the nearest grade.
    ///
    /// Qualities below 3 are failed recalls; anything above 5 is `Easy`.
    pub fn from_quality_lenient(quality: u8) -> Self {
        match quality {
            0..=2 => Self::Forgot,
            3 => Self::Hard,
            4 => Self::Good,
            _ => Self::Easy,
        }
    }

    /// Parse a grade label, treating anything unrecognised as `Forgot`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.parse() {
            Ok(grade) => grade,
            Err(err) => {
                tracing::warn!("{} (treating as forgot)", err);
                Self::Forgot
            }
        }
    }
}

impl fmt::Display for ReviewGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewGrade {
    type Err = RetainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forgot" | "again" => Ok(Self::Forgot),
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            _ => Err(RetainError::invalid_grade(s)),
        }
    }
}
