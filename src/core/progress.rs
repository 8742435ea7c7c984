//! Per-item, per-learner progress records.
//!
//! Every review produces a fresh snapshot of these values. Nothing here is
//! mutated in place by the engine; the caller owns persistence and hands the
//! previous snapshot back on the next review.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ReviewGrade;
use crate::error::{RetainError, Result};

/// Ease factor assigned to an item that has never been reviewed.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Floor for the ease factor; intervals never grow slower than this.
pub const MINIMUM_EASE_FACTOR: f64 = 1.3;

/// Highest dictionary or personal difficulty score.
pub const MAX_DIFFICULTY: u8 = 100;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// SM-2 scheduling state for one item.
///
/// Invariant: `repetitions == 0` whenever `last_grade` is `None` or
/// `Some(Forgot)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingState {
    /// Interval growth multiplier, never below [`MINIMUM_EASE_FACTOR`].
    pub ease_factor: f64,
    /// Days from the last review until the item is due again.
    pub interval_days: u32,
    /// Consecutive successful reviews since the last `Forgot`.
    pub repetitions: u32,
    /// When the item is next due. `None` until the first review.
    pub next_review_at: Option<DateTime<Utc>>,
    /// Most recent grade, `None` if never reviewed.
    pub last_grade: Option<ReviewGrade>,
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            repetitions: 0,
            next_review_at: None,
            last_grade: None,
        }
    }
}

impl SchedulingState {
    /// State of an item the learner has never seen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the item has been reviewed at least once.
    pub fn is_reviewed(&self) -> bool {
        self.last_grade.is_some()
    }

    /// Whether the item is due at `now`. Never-scheduled items are always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at {
            None => true,
            Some(at) => at <= now,
        }
    }

    /// Fractional days past the due date, 0.0 if not yet due or unscheduled.
    pub fn overdue_days(&self, now: DateTime<Utc>) -> f64 {
        match self.next_review_at {
            None => 0.0,
            Some(at) => {
                let seconds = (now - at).num_seconds() as f64;
                (seconds / SECONDS_PER_DAY).max(0.0)
            }
        }
    }

    /// Check the state against its documented domain.
    ///
    /// Used by the strict entry points; the lenient path uses [`sanitized`].
    ///
    /// [`sanitized`]: SchedulingState::sanitized
    pub fn validate(&self, minimum_ease: f64) -> Result<()> {
        if !self.ease_factor.is_finite() {
            return Err(RetainError::invalid_state(format!(
                "ease factor {} is not a finite number",
                self.ease_factor
            )));
        }
        if self.ease_factor < minimum_ease {
            return Err(RetainError::invalid_state(format!(
                "ease factor {} below minimum {}",
                self.ease_factor, minimum_ease
            )));
        }
        if self.repetitions > 0 {
            match self.last_grade {
                None => {
                    return Err(RetainError::invalid_state(format!(
                        "{} repetitions recorded for an item that was never reviewed",
                        self.repetitions
                    )))
                }
                Some(ReviewGrade::Forgot) => {
                    return Err(RetainError::invalid_state(format!(
                        "{} repetitions recorded after a forgot grade",
                        self.repetitions
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Clamp the state into its documented domain.
    ///
    /// A non-finite ease factor is replaced with `initial_ease`. Repetitions
    /// recorded for an item with no grade are dropped, since that item was
    /// never reviewed. Repetitions alongside a `forgot` grade are kept so the
    /// classifier can still label an imported record as decaying.
    pub fn sanitized(mut self, initial_ease: f64, minimum_ease: f64) -> Self {
        if self.last_grade.is_none() && self.repetitions > 0 {
            tracing::warn!(
                repetitions = self.repetitions,
                "repetitions recorded for an unreviewed item (resetting to 0)"
            );
            self.repetitions = 0;
        }
        if !self.ease_factor.is_finite() {
            self.ease_factor = initial_ease;
        }
        if self.ease_factor < minimum_ease {
            self.ease_factor = minimum_ease;
        }
        self
    }
}

/// Lifetime correct/incorrect answer totals for one item. Never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalCounters {
    /// Answers graded `hard`, `good`, or `easy`.
    pub correct_count: u32,
    /// Answers graded `forgot`.
    pub wrong_count: u32,
}

impl PersonalCounters {
    /// Create counters with the given totals.
    pub fn new(correct_count: u32, wrong_count: u32) -> Self {
        Self {
            correct_count,
            wrong_count,
        }
    }

    /// Counters after recording one more answer.
    pub fn record(self, grade: ReviewGrade) -> Self {
        if grade.is_correct() {
            Self {
                correct_count: self.correct_count.saturating_add(1),
                ..self
            }
        } else {
            Self {
                wrong_count: self.wrong_count.saturating_add(1),
                ..self
            }
        }
    }

    /// Total attempts.
    pub fn total(&self) -> u32 {
        self.correct_count.saturating_add(self.wrong_count)
    }

    /// Fraction of attempts answered correctly, `None` before the first attempt.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.correct_count as f64 / total as f64),
        }
    }
}

/// Lifecycle label derived from scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordState {
    /// Never reviewed, or reset by a `forgot` grade.
    New,
    /// One or two consecutive successes.
    Learning,
    /// Three or more consecutive successes, not yet mastered.
    Stabilizing,
    /// Long interval with a healthy ease factor.
    Mastered,
    /// A formerly strong item that failed or is badly overdue.
    Decaying,
}

impl WordState {
    /// All states in lifecycle order.
    pub const ALL: [WordState; 5] = [
        Self::New,
        Self::Learning,
        Self::Stabilizing,
        Self::Mastered,
        Self::Decaying,
    ];

    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Stabilizing => "stabilizing",
            Self::Mastered => "mastered",
            Self::Decaying => "decaying",
        }
    }
}

impl fmt::Display for WordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short-horizon trajectory of recent answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    /// Recent answers are noticeably better than the ones before.
    Easier,
    /// Recent answers are noticeably worse than the ones before.
    Harder,
    /// No clear change, or not enough history.
    #[default]
    Stable,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easier => "easier",
            Self::Harder => "harder",
            Self::Stable => "stable",
        };
        f.write_str(label)
    }
}

/// Everything the caller supplies for one answered item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewInput {
    /// Grade for this review.
    pub grade: ReviewGrade,
    /// Scheduling state before this review.
    #[serde(default)]
    pub scheduling: SchedulingState,
    /// Counters before this review.
    #[serde(default)]
    pub counters: PersonalCounters,
    /// Context-free difficulty of the item, 0-100.
    pub dictionary_difficulty: u8,
    /// Previous outcomes, most recent first, excluding this review.
    #[serde(default)]
    pub recent_history: Vec<bool>,
}

impl ReviewInput {
    /// Input for the first review of an unseen item.
    pub fn first_review(grade: ReviewGrade, dictionary_difficulty: u8) -> Self {
        Self {
            grade,
            scheduling: SchedulingState::default(),
            counters: PersonalCounters::default(),
            dictionary_difficulty,
            recent_history: Vec::new(),
        }
    }

    /// Replace the prior scheduling state.
    pub fn with_scheduling(mut self, scheduling: SchedulingState) -> Self {
        self.scheduling = scheduling;
        self
    }

    /// Replace the prior counters.
    pub fn with_counters(mut self, counters: PersonalCounters) -> Self {
        self.counters = counters;
        self
    }

    /// Replace the prior outcome history.
    pub fn with_history(mut self, recent_history: Vec<bool>) -> Self {
        self.recent_history = recent_history;
        self
    }
}

/// Full updated progress for one item after a review.
///
/// Intended to be upserted verbatim by the caller, keyed by (learner, item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullProgress {
    /// Scheduling state after the review.
    pub scheduling: SchedulingState,
    /// Counters after the review.
    pub counters: PersonalCounters,
    /// Lifecycle label of the updated state.
    pub word_state: WordState,
    /// Personal difficulty, 0-100.
    pub personal_score: u8,
    /// Trajectory including this review.
    pub trend: TrendDirection,
    /// Outcome history including this review, most recent first.
    pub recent_history: Vec<bool>,
}

impl FullProgress {
    /// Review input for the next answer on the same item.
    pub fn next_input(&self, grade: ReviewGrade, dictionary_difficulty: u8) -> ReviewInput {
        ReviewInput {
            grade,
            scheduling: self.scheduling.clone(),
            counters: self.counters,
            dictionary_difficulty,
            recent_history: self.recent_history.clone(),
        }
    }
}
