//! Queue and summary commands for Retain.
//!
//! Both read a JSON array of `{"item": ..., "scheduling": {...}}` entries.
//! Items are opaque to Retain and echoed back unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::core::{ReviewGrade, WordState};
use crate::engine::{build_session, classify_with, review_order, summarize_with};
use crate::engine::{QueueEntry, QueueSummary};
use crate::util::describe_due;

type Entries = Vec<QueueEntry<Value>>;

fn parse_entries(input: &str) -> Result<Entries, String> {
    serde_json::from_str(input).map_err(|e| format!("invalid queue input: {}", e))
}

/// Short label for an item payload: a string as-is, `word`/`id` fields if
/// present, otherwise compact JSON.
fn item_label(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("word")
            .or_else(|| map.get("id"))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}

// =============================================================================
// Queue
// =============================================================================

/// Options for the queue command.
#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Order every entry instead of only the due ones.
    pub all: bool,
    /// Maximum number of entries.
    pub limit: Option<usize>,
}

/// One ordered queue entry with its current label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedItem {
    /// The caller's item payload.
    pub item: Value,
    /// Current lifecycle label.
    pub word_state: WordState,
    /// Grade of the last review, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_grade: Option<ReviewGrade>,
    /// When the item is due, if scheduled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
}

/// Output format for the queue command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueOutput {
    /// Whether the queue was built.
    pub success: bool,
    /// Entries in review order.
    pub items: Vec<QueuedItem>,
    /// Error message if the input could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueueOutput {
    /// Create a successful output.
    pub fn success(items: Vec<QueuedItem>) -> Self {
        Self {
            success: true,
            items,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            items: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The queue command implementation.
pub struct QueueCommand {
    config: Config,
}

impl QueueCommand {
    /// Create a new queue command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the queue command against raw JSON input.
    pub fn run(&self, input: &str, now: DateTime<Utc>, options: &QueueOptions) -> QueueOutput {
        let entries = match parse_entries(input) {
            Ok(entries) => entries,
            Err(e) => return QueueOutput::failure(e),
        };

        let ordered = if options.all {
            let mut ordered = review_order(entries);
            if let Some(limit) = options.limit {
                ordered.truncate(limit);
            }
            ordered
        } else {
            build_session(entries, now, options.limit)
        };

        tracing::debug!(count = ordered.len(), all = options.all, "built review queue");

        let items = ordered
            .into_iter()
            .map(|entry| QueuedItem {
                word_state: classify_with(&entry.scheduling, &self.config.classifier, now),
                last_grade: entry.scheduling.last_grade,
                next_review_at: entry.scheduling.next_review_at,
                item: entry.item,
            })
            .collect();

        QueueOutput::success(items)
    }

    /// Format output based on options.
    pub fn format_output(
        &self,
        output: &QueueOutput,
        now: DateTime<Utc>,
        options: &QueueOptions,
    ) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Queue failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.items.is_empty() {
            return "Nothing due for review.\n".to_string();
        }

        let mut lines = Vec::new();
        for (i, queued) in output.items.iter().enumerate() {
            lines.push(format!(
                "{:>3}. {:<24} {:<12} {}",
                i + 1,
                item_label(&queued.item),
                queued.word_state.as_str(),
                describe_due(queued.next_review_at, now)
            ));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Options for the summary command.
#[derive(Debug, Clone, Default)]
pub struct SummaryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the summary command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    /// Whether the summary was computed.
    pub success: bool,
    /// The summary, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<QueueSummary>,
    /// Error message if the input could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SummaryOutput {
    /// Create a successful output.
    pub fn success(summary: QueueSummary) -> Self {
        Self {
            success: true,
            summary: Some(summary),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            summary: None,
            error: Some(error.into()),
        }
    }
}

/// The summary command implementation.
pub struct SummaryCommand {
    config: Config,
}

impl SummaryCommand {
    /// Create a new summary command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the summary command against raw JSON input.
    pub fn run(&self, input: &str, now: DateTime<Utc>) -> SummaryOutput {
        match parse_entries(input) {
            Ok(entries) => SummaryOutput::success(summarize_with(
                &entries,
                &self.config.classifier,
                now,
            )),
            Err(e) => SummaryOutput::failure(e),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &SummaryOutput, options: &SummaryOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        let summary = match (&output.summary, output.success) {
            (Some(summary), true) => summary,
            _ => {
                return format!(
                    "Summary failed: {}\n",
                    output.error.as_deref().unwrap_or("unknown error")
                )
            }
        };

        let mut lines = Vec::new();
        lines.push(format!("Items:   {}", summary.total));
        lines.push(format!("Due:     {}", summary.due));
        lines.push(format!("Unseen:  {}", summary.unseen));
        lines.push(String::new());
        for state in WordState::ALL {
            let count = summary.by_state.get(&state).copied().unwrap_or(0);
            lines.push(format!("  {:<12} {}", state.as_str(), count));
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    const INPUT: &str = r#"[
        {"item": "perro", "scheduling": {"ease_factor": 2.5, "interval_days": 6,
            "repetitions": 2, "next_review_at": "2024-05-30T08:00:00Z", "last_grade": "good"}},
        {"item": {"word": "gato"}},
        {"item": "casa", "scheduling": {"ease_factor": 2.1, "interval_days": 0,
            "repetitions": 0, "next_review_at": "2024-06-01T08:00:00Z", "last_grade": "forgot"}},
        {"item": "luna", "scheduling": {"ease_factor": 2.6, "interval_days": 15,
            "repetitions": 3, "next_review_at": "2024-06-10T08:00:00Z", "last_grade": "easy"}}
    ]"#;

    fn labels(output: &QueueOutput) -> Vec<String> {
        output.items.iter().map(|q| item_label(&q.item)).collect()
    }

    #[test]
    fn test_queue_due_only() {
        let cmd = QueueCommand::new(Config::default());
        let output = cmd.run(INPUT, now(), &QueueOptions::default());

        assert!(output.success);
        assert_eq!(labels(&output), vec!["casa", "gato", "perro"]);
        assert_eq!(output.items[0].word_state, WordState::New);
        assert_eq!(output.items[2].word_state, WordState::Learning);
    }

    #[test]
    fn test_queue_all_with_limit() {
        let cmd = QueueCommand::new(Config::default());
        let options = QueueOptions {
            all: true,
            limit: Some(3),
            ..Default::default()
        };
        let output = cmd.run(INPUT, now(), &options);
        assert_eq!(labels(&output), vec!["casa", "gato", "perro"]);

        let options = QueueOptions {
            all: true,
            ..Default::default()
        };
        let output = cmd.run(INPUT, now(), &options);
        assert_eq!(labels(&output), vec!["casa", "gato", "perro", "luna"]);
    }

    #[test]
    fn test_queue_invalid_input() {
        let cmd = QueueCommand::new(Config::default());
        let output = cmd.run(r#"{"item": 1}"#, now(), &QueueOptions::default());
        assert!(!output.success);
        assert!(output.error.unwrap().contains("invalid queue input"));
    }

    #[test]
    fn test_queue_format_human_readable() {
        let cmd = QueueCommand::new(Config::default());
        let options = QueueOptions::default();
        let output = cmd.run(INPUT, now(), &options);
        let formatted = cmd.format_output(&output, now(), &options);

        assert!(formatted.contains("1. casa"));
        assert!(formatted.contains("2. gato"));
        assert!(formatted.contains("not scheduled"));
        assert!(formatted.contains("2 days ago"));
    }

    #[test]
    fn test_queue_format_empty() {
        let cmd = QueueCommand::new(Config::default());
        let options = QueueOptions::default();
        let output = cmd.run("[]", now(), &options);
        assert_eq!(
            cmd.format_output(&output, now(), &options),
            "Nothing due for review.\n"
        );
    }

    #[test]
    fn test_queue_format_json_echoes_items() {
        let cmd = QueueCommand::new(Config::default());
        let options = QueueOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run(INPUT, now(), &options);
        let formatted = cmd.format_output(&output, now(), &options);

        let value: Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(value["items"][1]["item"]["word"], "gato");
        assert_eq!(value["items"][0]["last_grade"], "forgot");
        assert!(value["items"][1].get("next_review_at").is_none());
    }

    #[test]
    fn test_summary() {
        let cmd = SummaryCommand::new(Config::default());
        let output = cmd.run(INPUT, now());

        let summary = output.summary.unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.due, 3);
        assert_eq!(summary.unseen, 1);
        assert_eq!(summary.by_state.get(&WordState::New), Some(&2));
        assert_eq!(summary.by_state.get(&WordState::Learning), Some(&1));
        assert_eq!(summary.by_state.get(&WordState::Stabilizing), Some(&1));
    }

    #[test]
    fn test_summary_format_human_readable() {
        let cmd = SummaryCommand::new(Config::default());
        let output = cmd.run(INPUT, now());
        let formatted = cmd.format_output(&output, &SummaryOptions::default());

        assert!(formatted.contains("Items:   4"));
        assert!(formatted.contains(&format!("  {:<12} 0", "mastered")));
        assert!(formatted.contains(&format!("  {:<12} 2", "new")));
    }

    #[test]
    fn test_summary_invalid_input() {
        let cmd = SummaryCommand::new(Config::default());
        let output = cmd.run("nope", now());
        assert!(!output.success);
        let formatted = cmd.format_output(&output, &SummaryOptions::default());
        assert!(formatted.starts_with("Summary failed:"));
    }

    #[test]
    fn test_item_label() {
        assert_eq!(item_label(&serde_json::json!("sol")), "sol");
        assert_eq!(item_label(&serde_json::json!({"id": 7})), "7");
        assert_eq!(item_label(&serde_json::json!({"x": 1})), r#"{"x":1}"#);
        assert_eq!(item_label(&serde_json::json!(3)), "3");
    }
}
