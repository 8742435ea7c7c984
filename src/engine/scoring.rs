//! Personal difficulty scoring.
//!
//! Adjusts the context-free dictionary difficulty of an item by how this
//! learner has actually done with it:
//!
//! - Familiarity bonus: `min(15, round(log2(max(correct, reps) + 1) * 5))`,
//!   subtracted.
//! - Mistake penalty: `min(10, round(wrong / total * 10))`, added.
//! - Decay penalty: `min(8, round(log2(overdue_days + 1) * 3))`, added.
//!
//! The result is clamped to [0, 100]. Before the first review the dictionary
//! score is returned unchanged.

use chrono::{DateTime, Utc};

use crate::config::ScoringConfig;
use crate::core::{PersonalCounters, SchedulingState, MAX_DIFFICULTY};

/// Individual adjustments behind a personal score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Points subtracted for accumulated successful exposures.
    pub familiarity_bonus: u32,
    /// Points added for the lifetime error rate.
    pub mistake_penalty: u32,
    /// Points added for time past the due date.
    pub decay_penalty: u32,
}

impl ScoreBreakdown {
    /// Apply the adjustments to a dictionary score.
    pub fn apply(&self, dictionary_score: u8) -> u8 {
        let base = i64::from(dictionary_score.min(MAX_DIFFICULTY));
        let adjusted = base - i64::from(self.familiarity_bonus)
            + i64::from(self.mistake_penalty)
            + i64::from(self.decay_penalty);
        adjusted.clamp(0, i64::from(MAX_DIFFICULTY)) as u8
    }
}

/// Personal score with the default weights.
pub fn personal_score(
    dictionary_score: u8,
    counters: &PersonalCounters,
    state: &SchedulingState,
    now: DateTime<Utc>,
) -> u8 {
    personal_score_with(dictionary_score, counters, state, &ScoringConfig::default(), now)
}

/// Personal score with explicit weights.
pub fn personal_score_with(
    dictionary_score: u8,
    counters: &PersonalCounters,
    state: &SchedulingState,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> u8 {
    match breakdown(counters, state, config, now) {
        Some(parts) => parts.apply(dictionary_score),
        None => dictionary_score.min(MAX_DIFFICULTY),
    }
}

/// Compute the adjustments, or `None` if the item has never been reviewed.
pub fn breakdown(
    counters: &PersonalCounters,
    state: &SchedulingState,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> Option<ScoreBreakdown> {
    if !state.is_reviewed() || counters.total() == 0 {
        return None;
    }

    Some(ScoreBreakdown {
        familiarity_bonus: familiarity_bonus(counters, state, config),
        mistake_penalty: mistake_penalty(counters, config),
        decay_penalty: decay_penalty(state.overdue_days(now), config),
    })
}

fn familiarity_bonus(
    counters: &PersonalCounters,
    state: &SchedulingState,
    config: &ScoringConfig,
) -> u32 {
    let exposures = counters.correct_count.max(state.repetitions);
    let points = (f64::from(exposures) + 1.0).log2() * config.familiarity_weight;
    capped(points, config.familiarity_cap)
}

fn mistake_penalty(counters: &PersonalCounters, config: &ScoringConfig) -> u32 {
    let total = counters.total();
    if total == 0 {
        return 0;
    }
    let error_rate = f64::from(counters.wrong_count) / f64::from(total);
    capped(error_rate * config.mistake_weight, config.mistake_cap)
}

fn decay_penalty(overdue_days: f64, config: &ScoringConfig) -> u32 {
    let points = (overdue_days.max(0.0) + 1.0).log2() * config.decay_weight;
    capped(points, config.decay_cap)
}

fn capped(points: f64, cap: u32) -> u32 {
    (points.round().max(0.0) as u32).min(cap)
}
