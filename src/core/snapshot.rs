//! Loosely typed wire forms of caller-supplied records.
//!
//! Persisted progress comes back from storage layers that may carry values
//! outside the engine's domain (negative intervals, a zero ease factor,
//! grade labels from an older client). These snapshots decode anything
//! shaped roughly right and convert it either strictly (returning an error)
//! or leniently (clamping to the nearest valid value and logging a warning).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::core::{
    PersonalCounters, ReviewGrade, ReviewInput, SchedulingState, MAX_DIFFICULTY,
};
use crate::error::{FailOpen, RetainError, Result};

/// Scheduling state as it may arrive from persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingSnapshot {
    pub ease_factor: Option<f64>,
    pub interval_days: Option<i64>,
    pub repetitions: Option<i64>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub last_grade: Option<String>,
}

impl SchedulingSnapshot {
    /// Convert, rejecting anything outside the documented domain.
    pub fn into_state_strict(&self, config: &SchedulerConfig) -> Result<SchedulingState> {
        let interval_days = non_negative("interval_days", self.interval_days)?;
        let repetitions = non_negative("repetitions", self.repetitions)?;
        let last_grade = self
            .last_grade
            .as_deref()
            .map(str::parse::<ReviewGrade>)
            .transpose()?;

        let state = SchedulingState {
            ease_factor: self.ease_factor.unwrap_or(config.initial_ease),
            interval_days,
            repetitions,
            next_review_at: self.next_review_at,
            last_grade,
        };
        state.validate(config.minimum_ease)?;
        Ok(state)
    }

    /// Convert, clamping out-of-range values instead of failing.
    pub fn into_state(&self, config: &SchedulerConfig) -> SchedulingState {
        self.into_state_strict(config)
            .fail_open_else("decoding scheduling state", || self.clamped(config))
    }

    fn clamped(&self, config: &SchedulerConfig) -> SchedulingState {
        SchedulingState {
            ease_factor: self.ease_factor.unwrap_or(config.initial_ease),
            interval_days: clamp_u32(self.interval_days),
            repetitions: clamp_u32(self.repetitions),
            next_review_at: self.next_review_at,
            last_grade: self.last_grade.as_deref().map(ReviewGrade::parse_lenient),
        }
        .sanitized(config.initial_ease, config.minimum_ease)
    }
}

impl From<&SchedulingState> for SchedulingSnapshot {
    fn from(state: &SchedulingState) -> Self {
        Self {
            ease_factor: Some(state.ease_factor),
            interval_days: Some(state.interval_days.into()),
            repetitions: Some(state.repetitions.into()),
            next_review_at: state.next_review_at,
            last_grade: state.last_grade.map(|g| g.as_str().to_string()),
        }
    }
}

/// Counters as they may arrive from persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountersSnapshot {
    pub correct_count: Option<i64>,
    pub wrong_count: Option<i64>,
}

impl CountersSnapshot {
    /// Convert, rejecting negative totals.
    pub fn into_counters_strict(self) -> Result<PersonalCounters> {
        Ok(PersonalCounters::new(
            non_negative("correct_count", self.correct_count)?,
            non_negative("wrong_count", self.wrong_count)?,
        ))
    }

    /// Convert, clamping negative totals to zero.
    pub fn into_counters(self) -> PersonalCounters {
        PersonalCounters::new(clamp_u32(self.correct_count), clamp_u32(self.wrong_count))
    }
}

/// A review request as it arrives from the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Grade label; absent or unknown labels are `forgot` on the lenient path.
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub scheduling: SchedulingSnapshot,
    #[serde(default)]
    pub counters: CountersSnapshot,
    pub dictionary_difficulty: i64,
    #[serde(default)]
    pub recent_history: Vec<bool>,
}

impl ReviewRequest {
    /// Convert, rejecting anything outside the documented domain.
    pub fn into_input_strict(&self, config: &SchedulerConfig) -> Result<ReviewInput> {
        let grade = self
            .grade
            .as_deref()
            .ok_or_else(|| RetainError::invalid_grade("<missing>"))?
            .parse::<ReviewGrade>()?;

        if !(0..=i64::from(MAX_DIFFICULTY)).contains(&self.dictionary_difficulty) {
            return Err(RetainError::invalid_state(format!(
                "dictionary_difficulty {} outside 0..={}",
                self.dictionary_difficulty, MAX_DIFFICULTY
            )));
        }

        Ok(ReviewInput {
            grade,
            scheduling: self.scheduling.into_state_strict(config)?,
            counters: self.counters.into_counters_strict()?,
            dictionary_difficulty: self.dictionary_difficulty as u8,
            recent_history: self.recent_history.clone(),
        })
    }

    /// Convert, clamping every field to its nearest valid value.
    pub fn into_input(&self, config: &SchedulerConfig) -> ReviewInput {
        let grade = match self.grade.as_deref() {
            Some(label) => ReviewGrade::parse_lenient(label),
            None => {
                tracing::warn!("review request has no grade (treating as forgot)");
                ReviewGrade::Forgot
            }
        };

        ReviewInput {
            grade,
            scheduling: self.scheduling.into_state(config),
            counters: self.counters.into_counters(),
            dictionary_difficulty: self
                .dictionary_difficulty
                .clamp(0, i64::from(MAX_DIFFICULTY)) as u8,
            recent_history: self.recent_history.clone(),
        }
    }
}

fn non_negative(field: &str, value: Option<i64>) -> Result<u32> {
    let value = value.unwrap_or(0);
    u32::try_from(value).map_err(|_| {
        RetainError::invalid_state(format!("{} {} outside 0..={}", field, value, u32::MAX))
    })
}

fn clamp_u32(value: Option<i64>) -> u32 {
    value.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32
}
