//! Short-horizon trend detection.
//!
//! Compares accuracy over the most recent window of outcomes with the window
//! immediately before it. With fewer than `min_history` outcomes (or nothing
//! in the earlier window) the trend is `stable`: not enough signal.

use crate::config::TrendConfig;
use crate::core::TrendDirection;

/// Trend with the default windows (3 vs 3, at least 4 outcomes, ±0.2).
///
/// `history` is most-recent-first.
pub fn trend(history: &[bool]) -> TrendDirection {
    trend_with(history, &TrendConfig::default())
}

/// Trend with explicit windows and deadband.
pub fn trend_with(history: &[bool], config: &TrendConfig) -> TrendDirection {
    if history.len() < config.min_history || config.window == 0 {
        return TrendDirection::Stable;
    }

    let split = config.window.min(history.len());
    let (recent, rest) = history.split_at(split);
    let previous = &rest[..config.window.min(rest.len())];

    let (Some(avg_recent), Some(avg_previous)) = (accuracy(recent), accuracy(previous)) else {
        return TrendDirection::Stable;
    };

    let delta = avg_recent - avg_previous;
    if delta > config.threshold {
        TrendDirection::Easier
    } else if delta < -config.threshold {
        TrendDirection::Harder
    } else {
        TrendDirection::Stable
    }
}

/// Prepend the newest outcome and keep at most `limit` entries.
pub fn push_outcome(history: &[bool], correct: bool, limit: usize) -> Vec<bool> {
    std::iter::once(correct)
        .chain(history.iter().copied())
        .take(limit.max(1))
        .collect()
}

fn accuracy(window: &[bool]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let correct = window.iter().filter(|&&c| c).count();
    Some(correct as f64 / window.len() as f64)
}
