//! Retain - spaced-repetition core for vocabulary review
//!
//! Retain turns one answered review into an updated progress record: the
//! next SM-2 schedule, a lifecycle label, a personal difficulty score, and
//! a recent-performance trend. It also orders practice queues. Callers own
//! storage and the clock; every computation takes `now` explicitly.

pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod util;

pub use crate::config::Config;
pub use crate::core::{
    FullProgress, PersonalCounters, ReviewGrade, ReviewInput, ReviewRequest, SchedulingState,
    TrendDirection, WordState,
};
pub use engine::{
    apply_review, build_session, classify, due_filter, next_schedule, personal_score,
    review_order, summarize, trend, ProgressUpdater, QueueEntry, QueueSummary,
};
pub use error::{FailOpen, Result, RetainError};

// CLI commands
pub use cli::{ConfigCommand, InitCommand, QueueCommand, ReviewCommand, SummaryCommand};
