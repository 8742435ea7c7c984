//! Retain - spaced-repetition core for vocabulary review
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use retain::config::{retain_home, Config};
use retain::error::{exit_codes, RetainError};
use retain::util::read_input;

// =============================================================================
// CLI Definition
// =============================================================================

/// Retain - spaced-repetition scheduling for vocabulary review
#[derive(Parser)]
#[command(name = "retain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply one answered review (JSON request) and print the new progress
    Review {
        /// Read the request from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,
        /// Evaluate at this instant (RFC 3339) instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Reject out-of-range input instead of clamping it
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Order a JSON array of entries into a review session
    Queue {
        /// Read entries from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,
        /// Evaluate at this instant (RFC 3339) instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Include entries that are not yet due
        #[arg(long, short)]
        all: bool,
        /// Maximum number of entries
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Count entries by due status and lifecycle label
    Summary {
        /// Read entries from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,
        /// Evaluate at this instant (RFC 3339) instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print the effective configuration
    Config {
        /// Output as JSON instead of TOML
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Write a project config with the defaults
    Init {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
        /// Force overwrite existing files
        #[arg(long, short)]
        force: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("retain error: {}", e);
            match e.downcast_ref::<RetainError>() {
                Some(err) if err.is_input_error() => exit_code(exit_codes::INVALID_INPUT),
                _ => exit_code(exit_codes::ERROR),
            }
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.retain/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("retain panic: {}", info);

        if let Some(home) = retain_home() {
            let _ = std::fs::create_dir_all(&home);
            let crash_log = home.join("crash.log");
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Review {
            input,
            now,
            strict,
            json,
            quiet,
        } => run_review(input.as_deref(), now, strict, json, quiet, &cwd),
        Commands::Queue {
            input,
            now,
            all,
            limit,
            json,
            quiet,
        } => run_queue(input.as_deref(), now, all, limit, json, quiet, &cwd),
        Commands::Summary {
            input,
            now,
            json,
            quiet,
        } => run_summary(input.as_deref(), now, json, quiet, &cwd),
        Commands::Config { json, quiet } => run_config(json, quiet, &cwd),
        Commands::Init { json, quiet, force } => run_init(json, quiet, force, &cwd),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}

/// Map a command result to an exit code. Commands only fail on bad input.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        exit_code(exit_codes::SUCCESS)
    } else {
        exit_code(exit_codes::INVALID_INPUT)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
        if !formatted.ends_with('\n') {
            println!();
        }
    }
}

fn run_review(
    input: Option<&Path>,
    now: Option<DateTime<Utc>>,
    strict: bool,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use retain::cli::review::{ReviewCommand, ReviewOptions};

    let now = now.unwrap_or_else(Utc::now);
    let raw = read_input(input)?;
    let cmd = ReviewCommand::new(Config::load_from_cwd(cwd));
    let options = ReviewOptions {
        json,
        quiet,
        strict,
    };

    let output = cmd.run(&raw, now, &options);
    print_formatted(&cmd.format_output(&output, now, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_queue(
    input: Option<&Path>,
    now: Option<DateTime<Utc>>,
    all: bool,
    limit: Option<usize>,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use retain::cli::queue::{QueueCommand, QueueOptions};

    let now = now.unwrap_or_else(Utc::now);
    let raw = read_input(input)?;
    let cmd = QueueCommand::new(Config::load_from_cwd(cwd));
    let options = QueueOptions {
        json,
        quiet,
        all,
        limit,
    };

    let output = cmd.run(&raw, now, &options);
    print_formatted(&cmd.format_output(&output, now, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_summary(
    input: Option<&Path>,
    now: Option<DateTime<Utc>>,
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use retain::cli::queue::{SummaryCommand, SummaryOptions};

    let now = now.unwrap_or_else(Utc::now);
    let raw = read_input(input)?;
    let cmd = SummaryCommand::new(Config::load_from_cwd(cwd));
    let options = SummaryOptions { json, quiet };

    let output = cmd.run(&raw, now);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_config(
    json: bool,
    quiet: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use retain::cli::config_cmd::{ConfigCommand, ConfigOptions};

    let cmd = ConfigCommand::new(Config::load_from_cwd(cwd));
    let options = ConfigOptions { json, quiet };
    print_formatted(&cmd.format_output(&options));

    Ok(exit_code(exit_codes::SUCCESS))
}

fn run_init(
    json: bool,
    quiet: bool,
    force: bool,
    cwd: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use retain::cli::config_cmd::{InitCommand, InitOptions};

    let cmd = InitCommand::new(cwd);
    let options = InitOptions { json, quiet, force };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    if output.success {
        Ok(exit_code(exit_codes::SUCCESS))
    } else {
        Ok(exit_code(exit_codes::ERROR))
    }
}
