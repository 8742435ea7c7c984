//! SM-2 interval scheduling.
//!
//! Given the prior scheduling state and a grade, compute the next interval,
//! due date, and ease factor:
//!
//! 1. Map the grade to a quality `q` (forgot=0, hard=3, good=4, easy=5).
//! 2. `q < 3`: repetitions and interval reset to 0, due again immediately.
//! 3. Otherwise the interval is 1 day after the first success, 6 after the
//!    second, then `round(interval * ease)`; repetitions increment.
//! 4. `ease = max(min, ease + 0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))`.
//! 5. `next_review_at = now + interval` calendar days.
//!
//! Intervals are capped at `maximum_interval_days`, and a due date past the
//! end of the calendar saturates to `DateTime::<Utc>::MAX_UTC`.

use chrono::{DateTime, Duration, Utc};

use crate::config::SchedulerConfig;
use crate::core::{ReviewGrade, SchedulingState};
use crate::error::Result;

/// Lowest quality that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

/// Schedule the next review using the default configuration.
pub fn next_schedule(
    state: &SchedulingState,
    grade: ReviewGrade,
    now: DateTime<Utc>,
) -> SchedulingState {
    schedule(state, grade, &SchedulerConfig::default(), now)
}

/// Schedule the next review.
///
/// Total over all inputs: an out-of-range ease factor on the way in is
/// clamped before use, so the result always satisfies
/// `ease_factor >= config.minimum_ease`. An item that was never reviewed
/// starts from `config.initial_ease` whatever ease it carries.
pub fn schedule(
    state: &SchedulingState,
    grade: ReviewGrade,
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> SchedulingState {
    let mut prior = state
        .clone()
        .sanitized(config.initial_ease, config.minimum_ease);
    if !prior.is_reviewed() {
        prior.ease_factor = config.initial_ease.max(config.minimum_ease);
    }
    let q = grade.quality();

    let (interval_days, repetitions) = if q < PASSING_QUALITY {
        (0, 0)
    } else {
        let interval = match prior.repetitions {
            0 => config.first_interval_days,
            1 => config.second_interval_days,
            _ => grow_interval(prior.interval_days, prior.ease_factor),
        };
        let interval = interval.min(config.maximum_interval_days.max(1));
        (interval, prior.repetitions.saturating_add(1))
    };

    let ease_factor = next_ease(prior.ease_factor, q, config.minimum_ease);

    tracing::debug!(
        grade = %grade,
        interval_days,
        repetitions,
        ease_factor,
        "scheduled review"
    );

    SchedulingState {
        ease_factor,
        interval_days,
        repetitions,
        next_review_at: Some(due_after(now, interval_days)),
        last_grade: Some(grade),
    }
}

/// Schedule the next review, rejecting a prior state outside its domain.
pub fn schedule_strict(
    state: &SchedulingState,
    grade: ReviewGrade,
    config: &SchedulerConfig,
    now: DateTime<Utc>,
) -> Result<SchedulingState> {
    state.validate(config.minimum_ease)?;
    Ok(schedule(state, grade, config, now))
}

/// SM-2 ease update, floored at `minimum`.
pub fn next_ease(ease_factor: f64, quality: u8, minimum: f64) -> f64 {
    let miss = 5.0 - f64::from(quality.min(5));
    let delta = 0.1 - miss * (0.08 + miss * 0.02);
    (ease_factor + delta).max(minimum)
}

fn due_after(now: DateTime<Utc>, interval_days: u32) -> DateTime<Utc> {
    now.checked_add_signed(Duration::days(i64::from(interval_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

// At least one day: a corrupted zero interval must not pin a passing item
// to "due now" forever.
fn grow_interval(interval_days: u32, ease_factor: f64) -> u32 {
    let grown = (f64::from(interval_days) * ease_factor).round();
    (grown as u32).max(1)
}
