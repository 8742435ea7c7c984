//! Core value types for Retain.
//!
//! Grades, per-item scheduling state, lifetime counters, derived labels,
//! and the loosely typed snapshots used at the caller boundary.

pub mod grade;
pub mod progress;
pub mod snapshot;

pub use grade::ReviewGrade;
pub use progress::{
    FullProgress, PersonalCounters, ReviewInput, SchedulingState, TrendDirection, WordState,
    INITIAL_EASE_FACTOR, MAX_DIFFICULTY, MINIMUM_EASE_FACTOR,
};
pub use snapshot::{CountersSnapshot, ReviewRequest, SchedulingSnapshot};
