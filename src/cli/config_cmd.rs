//! Config and init commands for Retain.
//!
//! `config` prints the effective configuration after all layers are merged.
//! `init` writes a project `.retain/config.toml` with the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{project_config_path, Config, PROJECT_DIR_NAME};

// =============================================================================
// Config
// =============================================================================

/// Options for the config command.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Output as JSON instead of TOML.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// The config command implementation.
pub struct ConfigCommand {
    config: Config,
}

impl ConfigCommand {
    /// Create a new config command for the effective configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Render the configuration.
    pub fn format_output(&self, options: &ConfigOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(&self.config)
                .unwrap_or_else(|_| "{}".to_string());
        }

        match self.config.to_toml() {
            Ok(toml) => toml,
            Err(e) => format!("# failed to render config: {}\n", e),
        }
    }
}

// =============================================================================
// Init
// =============================================================================

/// Options for the init command.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Overwrite an existing project config.
    pub force: bool,
}

/// Output format for the init command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitOutput {
    /// Whether initialization was successful.
    pub success: bool,
    /// Path of the project config file.
    pub path: String,
    /// Whether the file was written (false if it already existed).
    pub created: bool,
    /// Error message if initialization failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InitOutput {
    /// Create a successful output.
    pub fn success(path: &Path, created: bool) -> Self {
        Self {
            success: true,
            path: path.display().to_string(),
            created,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(path: &Path, error: impl Into<String>) -> Self {
        Self {
            success: false,
            path: path.display().to_string(),
            created: false,
            error: Some(error.into()),
        }
    }
}

/// The init command implementation.
pub struct InitCommand {
    cwd: PathBuf,
}

impl InitCommand {
    /// Create a new init command rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Run the init command.
    ///
    /// Always writes into `cwd`, even when an ancestor already has a
    /// `.retain` directory.
    pub fn run(&self, options: &InitOptions) -> InitOutput {
        let target = self.cwd.join(PROJECT_DIR_NAME).join("config.toml");

        if target.exists() && !options.force {
            return InitOutput::success(&target, false);
        }

        match Config::default().save_project(&self.cwd) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "wrote project config");
                InitOutput::success(&path, true)
            }
            Err(e) => InitOutput::failure(&target, e.to_string()),
        }
    }

    /// The project config that `Config::load_from_cwd` would pick up from here.
    pub fn effective_path(&self) -> PathBuf {
        project_config_path(&self.cwd)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &InitOutput, options: &InitOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Init failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.created {
            format!("Created {}\n", output.path)
        } else {
            format!(
                "{} already exists (use --force to overwrite)\n",
                output.path
            )
        }
    }
}
