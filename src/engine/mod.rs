//! Review engine for Retain.
//!
//! Stateless computations over caller-supplied snapshots: SM-2 scheduling,
//! lifecycle classification, personal difficulty, trend detection, the
//! updater that composes them, and practice queue helpers.
//!
//! Nothing here reads a clock. Every function that needs the current time
//! takes `now` explicitly.

pub mod classifier;
pub mod queue;
pub mod scheduler;
pub mod scoring;
pub mod trend;
pub mod updater;

pub use classifier::{classify, classify_with};
pub use queue::{
    build_session, due_filter, review_order, summarize, summarize_with, QueueEntry, QueueSummary,
};
pub use scheduler::{next_ease, next_schedule, schedule, schedule_strict};
pub use scoring::{breakdown, personal_score, personal_score_with, ScoreBreakdown};
pub use trend::{push_outcome, trend, trend_with};
pub use updater::{apply_review, ProgressUpdater};
