//! CLI commands for Retain.
//!
//! Each command reads its input, runs the engine, and renders either
//! human-readable text or JSON:
//! - **Review commands**: review, queue, summary
//! - **Setup commands**: config, init

// Review commands
pub mod queue;
pub mod review;

// Setup commands
pub mod config_cmd;

pub use config_cmd::{ConfigCommand, InitCommand};
pub use queue::{QueueCommand, SummaryCommand};
pub use review::ReviewCommand;
