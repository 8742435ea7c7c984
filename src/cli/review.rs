//! Review command for Retain.
//!
//! Reads one review request as JSON and prints the updated progress record.
//! Nothing is persisted; the caller stores the output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::{FullProgress, ReviewRequest};
use crate::engine::ProgressUpdater;
use crate::util::describe_due;

/// Options for the review command.
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Reject out-of-range input instead of clamping it.
    pub strict: bool,
}

/// Output format for the review command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// Whether the review was applied.
    pub success: bool,
    /// Updated progress, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<FullProgress>,
    /// Error message if the review was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewOutput {
    /// Create a successful output.
    pub fn success(progress: FullProgress) -> Self {
        Self {
            success: true,
            progress: Some(progress),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            progress: None,
            error: Some(error.into()),
        }
    }
}

/// The review command implementation.
pub struct ReviewCommand {
    updater: ProgressUpdater,
}

impl ReviewCommand {
    /// Create a new review command.
    pub fn new(config: Config) -> Self {
        Self {
            updater: ProgressUpdater::new(config),
        }
    }

    /// Run the review command against raw JSON input.
    pub fn run(&self, input: &str, now: DateTime<Utc>, options: &ReviewOptions) -> ReviewOutput {
        let request: ReviewRequest = match serde_json::from_str(input) {
            Ok(r) => r,
            Err(e) => return ReviewOutput::failure(format!("invalid review request: {}", e)),
        };

        if options.strict {
            match self.updater.apply_request_strict(&request, now) {
                Ok(progress) => ReviewOutput::success(progress),
                Err(e) => ReviewOutput::failure(e.to_string()),
            }
        } else {
            ReviewOutput::success(self.updater.apply_request(&request, now))
        }
    }

    /// Format output based on options.
    pub fn format_output(
        &self,
        output: &ReviewOutput,
        now: DateTime<Utc>,
        options: &ReviewOptions,
    ) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output, now)
        }
    }

    fn format_human_readable(&self, output: &ReviewOutput, now: DateTime<Utc>) -> String {
        let progress = match (&output.progress, output.success) {
            (Some(progress), true) => progress,
            _ => {
                return format!(
                    "Review failed: {}\n",
                    output.error.as_deref().unwrap_or("unknown error")
                )
            }
        };

        let s = &progress.scheduling;
        let mut lines = Vec::new();
        lines.push(format!("State:          {}", progress.word_state));
        lines.push(format!(
            "Next review:    {} ({} day interval)",
            describe_due(s.next_review_at, now),
            s.interval_days
        ));
        lines.push(format!("Ease factor:    {:.2}", s.ease_factor));
        lines.push(format!("Repetitions:    {}", s.repetitions));
        lines.push(format!("Personal score: {}", progress.personal_score));
        lines.push(format!(
            "Answers:        {} correct, {} wrong",
            progress.counters.correct_count, progress.counters.wrong_count
        ));
        lines.push(format!("Trend:          {}", progress.trend));
        lines.push(String::new());
        lines.join("\n")
    }
}
