//! Practice queue utilities.
//!
//! Pure helpers the caller uses to build a session from its own join of
//! vocabulary items and progress records. They never decide *how many*
//! items a learner should see beyond an optional limit.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::core::{ReviewGrade, SchedulingState, WordState};
use crate::engine::classifier;

/// An item paired with its scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry<T> {
    /// Caller-defined item payload.
    pub item: T,
    /// Scheduling state; the default for never-reviewed items.
    #[serde(default)]
    pub scheduling: SchedulingState,
}

impl<T> QueueEntry<T> {
    /// Pair an item with its scheduling state.
    pub fn new(item: T, scheduling: SchedulingState) -> Self {
        Self { item, scheduling }
    }

    /// An item the learner has never reviewed.
    pub fn unseen(item: T) -> Self {
        Self::new(item, SchedulingState::default())
    }
}

/// Keep entries that have no due date or are due at `now`.
pub fn due_filter<T>(entries: Vec<QueueEntry<T>>, now: DateTime<Utc>) -> Vec<QueueEntry<T>> {
    entries
        .into_iter()
        .filter(|entry| entry.scheduling.is_due(now))
        .collect()
}

/// Order entries for review.
///
/// Items last graded `forgot` come first, then never-reviewed items, then
/// everything else by ascending due date. The sort is stable: entries of
/// equal priority keep their input order.
pub fn review_order<T>(mut entries: Vec<QueueEntry<T>>) -> Vec<QueueEntry<T>> {
    entries.sort_by_key(|entry| priority(&entry.scheduling));
    entries
}

/// Due-filter, order, and truncate to at most `limit` entries.
pub fn build_session<T>(
    entries: Vec<QueueEntry<T>>,
    now: DateTime<Utc>,
    limit: Option<usize>,
) -> Vec<QueueEntry<T>> {
    let mut session = review_order(due_filter(entries, now));
    if let Some(limit) = limit {
        session.truncate(limit);
    }
    session
}

/// Sort key: (bucket, due date). Only the forgot and unseen buckets ignore
/// the due date, so ties inside them fall back to input order.
fn priority(state: &SchedulingState) -> (u8, Option<DateTime<Utc>>) {
    match state.last_grade {
        Some(ReviewGrade::Forgot) => (0, None),
        None => (1, None),
        Some(_) => (
            2,
            Some(state.next_review_at.unwrap_or(DateTime::<Utc>::MAX_UTC)),
        ),
    }
}

/// Overview of a set of queue entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSummary {
    /// Number of entries.
    pub total: usize,
    /// Entries due at the time of summarizing.
    pub due: usize,
    /// Entries never reviewed.
    pub unseen: usize,
    /// Entry count per lifecycle label.
    pub by_state: BTreeMap<WordState, usize>,
}

/// Summarize entries with the default classifier thresholds.
pub fn summarize<T>(entries: &[QueueEntry<T>], now: DateTime<Utc>) -> QueueSummary {
    summarize_with(entries, &ClassifierConfig::default(), now)
}

/// Summarize entries with explicit classifier thresholds.
pub fn summarize_with<T>(
    entries: &[QueueEntry<T>],
    config: &ClassifierConfig,
    now: DateTime<Utc>,
) -> QueueSummary {
    let mut summary = QueueSummary {
        total: entries.len(),
        ..Default::default()
    };

    for entry in entries {
        if entry.scheduling.is_due(now) {
            summary.due += 1;
        }
        if !entry.scheduling.is_reviewed() {
            summary.unseen += 1;
        }
        let state = classifier::classify_with(&entry.scheduling, config, now);
        *summary.by_state.entry(state).or_insert(0) += 1;
    }

    summary
}
