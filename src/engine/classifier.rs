//! Word lifecycle classification.
//!
//! A decision table over the current scheduling state; the first matching
//! rule wins:
//!
//! 1. never reviewed (no grade) → `new`, whatever repetitions it carries
//! 2. `repetitions == 0` → `new` (a forgotten word starts over)
//! 3. `repetitions >= 5`, `ease >= 2.3`, last grade `forgot` → `decaying`
//! 4. `repetitions >= 4`, more than 14 days overdue → `decaying`
//! 5. `repetitions >= 5`, `ease >= 2.3`, `interval >= 21` → `mastered`
//! 6. `repetitions >= 3` → `stabilizing`
//! 7. otherwise → `learning`
//!
//! The label is recomputed from scratch every time. There is no transition
//! graph and the previous label never matters.

use chrono::{DateTime, Duration, Utc};

use crate::config::ClassifierConfig;
use crate::core::{ReviewGrade, SchedulingState, WordState};

/// Classify using the default thresholds.
pub fn classify(state: &SchedulingState, now: DateTime<Utc>) -> WordState {
    classify_with(state, &ClassifierConfig::default(), now)
}

/// Classify with explicit thresholds.
pub fn classify_with(
    state: &SchedulingState,
    config: &ClassifierConfig,
    now: DateTime<Utc>,
) -> WordState {
    if !state.is_reviewed() || state.repetitions == 0 {
        return WordState::New;
    }

    let strong = state.repetitions >= config.mastered_repetitions
        && state.ease_factor >= config.mastered_ease;

    // Only reachable when classifying a state that still carries repetitions
    // alongside a forgot grade, since the scheduler zeroes them on forgot.
    if strong && state.last_grade == Some(ReviewGrade::Forgot) {
        return WordState::Decaying;
    }

    if state.repetitions >= config.overdue_decay_repetitions
        && is_severely_overdue(state, config, now)
    {
        return WordState::Decaying;
    }

    if strong && state.interval_days >= config.mastered_interval_days {
        return WordState::Mastered;
    }

    if state.repetitions >= config.stabilizing_repetitions {
        return WordState::Stabilizing;
    }

    WordState::Learning
}

fn is_severely_overdue(
    state: &SchedulingState,
    config: &ClassifierConfig,
    now: DateTime<Utc>,
) -> bool {
    match state.next_review_at {
        Some(at) => now - at > Duration::days(i64::from(config.overdue_decay_days)),
        None => false,
    }
}
