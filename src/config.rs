//! Configuration loading for Retain.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.retain/config.toml`)
//! 3. User config (`~/.retain/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The defaults are the classic SM-2
//! constants and the personal-difficulty weights the engine was tuned with.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{INITIAL_EASE_FACTOR, MINIMUM_EASE_FACTOR};
use crate::error::{RetainError, Result};

/// Name of the per-project configuration directory.
pub const PROJECT_DIR_NAME: &str = ".retain";

/// Main configuration struct for Retain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// SM-2 interval scheduling.
    pub scheduler: SchedulerConfig,
    /// Lifecycle classification thresholds.
    pub classifier: ClassifierConfig,
    /// Personal difficulty adjustments.
    pub scoring: ScoringConfig,
    /// Short-horizon trend detection.
    pub trend: TrendConfig,
}

/// SM-2 scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ease factor of an unseen item.
    pub initial_ease: f64,
    /// Lowest ease factor the scheduler will produce.
    pub minimum_ease: f64,
    /// Interval after the first successful review.
    pub first_interval_days: u32,
    /// Interval after the second consecutive successful review.
    pub second_interval_days: u32,
    /// Longest interval the scheduler will produce (100 years by default).
    pub maximum_interval_days: u32,
}

impl SchedulerConfig {
    /// Check if an ease value is usable (finite and positive).
    pub fn is_valid_ease(value: f64) -> bool {
        value.is_finite() && value > 0.0
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            initial_ease: INITIAL_EASE_FACTOR,
            minimum_ease: MINIMUM_EASE_FACTOR,
            first_interval_days: 1,
            second_interval_days: 6,
            maximum_interval_days: 36_500,
        }
    }
}

/// Word lifecycle classification thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Consecutive successes required for `mastered`.
    pub mastered_repetitions: u32,
    /// Ease factor required for `mastered` (and for a failure to count as decay).
    pub mastered_ease: f64,
    /// Interval required for `mastered`.
    pub mastered_interval_days: u32,
    /// Consecutive successes required for `stabilizing`.
    pub stabilizing_repetitions: u32,
    /// Consecutive successes after which lateness counts as decay.
    pub overdue_decay_repetitions: u32,
    /// Days past due (strictly more) that count as decay.
    pub overdue_decay_days: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mastered_repetitions: 5,
            mastered_ease: 2.3,
            mastered_interval_days: 21,
            stabilizing_repetitions: 3,
            overdue_decay_repetitions: 4,
            overdue_decay_days: 14,
        }
    }
}

/// Personal difficulty score configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Maximum familiarity bonus subtracted from the dictionary score.
    pub familiarity_cap: u32,
    /// Points per doubling of successful exposures.
    pub familiarity_weight: f64,
    /// Maximum mistake penalty added.
    pub mistake_cap: u32,
    /// Points at a 100% error rate (before the cap).
    pub mistake_weight: f64,
    /// Maximum overdue penalty added.
    pub decay_cap: u32,
    /// Points per doubling of overdue days.
    pub decay_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            familiarity_cap: 15,
            familiarity_weight: 5.0,
            mistake_cap: 10,
            mistake_weight: 10.0,
            decay_cap: 8,
            decay_weight: 3.0,
        }
    }
}

/// Trend detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    /// Outcomes per comparison window.
    pub window: usize,
    /// Fewest outcomes needed before a trend is reported.
    pub min_history: usize,
    /// Accuracy change (strictly greater) that counts as a trend.
    pub threshold: f64,
    /// Outcomes kept in `FullProgress::recent_history`.
    pub history_limit: usize,
}

impl TrendConfig {
    /// Check if a threshold value is valid (must be in [0.0, 1.0] and finite).
    pub fn is_valid_threshold(value: f64) -> bool {
        value.is_finite() && (0.0..=1.0).contains(&value)
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window: 3,
            min_history: 4,
            threshold: 0.2,
            history_limit: 10,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.retain/config.toml` in cwd or an ancestor)
    /// 3. User config (`~/.retain/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config.validated()
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config.validated()
    }

    fn load_user_config() -> Option<Config> {
        let home = retain_home()?;
        Self::load_layer(&home.join("config.toml"))
    }

    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_layer(&project_config_path(cwd))
    }

    /// Load one layer, skipping it (with a warning) if it is unreadable.
    fn load_layer(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| RetainError::storage(path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| RetainError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the merged layers, falling back to defaults if the combination
    /// is unusable even though each layer was valid on its own.
    fn validated(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(e) => {
                tracing::warn!("{} (using default configuration)", e);
                Config::default()
            }
        }
    }

    /// Reject combinations the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let s = &self.scheduler;
        if !SchedulerConfig::is_valid_ease(s.minimum_ease) {
            return Err(RetainError::config(format!(
                "scheduler.minimum_ease must be a positive number, got {}",
                s.minimum_ease
            )));
        }
        if !SchedulerConfig::is_valid_ease(s.initial_ease) || s.initial_ease < s.minimum_ease {
            return Err(RetainError::config(format!(
                "scheduler.initial_ease {} must be at least minimum_ease {}",
                s.initial_ease, s.minimum_ease
            )));
        }
        if s.maximum_interval_days == 0 {
            return Err(RetainError::config(
                "scheduler.maximum_interval_days must be at least 1",
            ));
        }
        if !TrendConfig::is_valid_threshold(self.trend.threshold) {
            return Err(RetainError::config(format!(
                "trend.threshold must be in [0.0, 1.0], got {}",
                self.trend.threshold
            )));
        }
        if self.trend.window == 0 {
            return Err(RetainError::config("trend.window must be at least 1"));
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // RETAIN_INITIAL_EASE
        if let Ok(val) = env::var("RETAIN_INITIAL_EASE") {
            match val.parse::<f64>() {
                Ok(n) if SchedulerConfig::is_valid_ease(n) && n >= self.scheduler.minimum_ease => {
                    self.scheduler.initial_ease = n
                }
                _ => tracing::warn!(
                    "Invalid RETAIN_INITIAL_EASE value '{}'. Using '{}'.",
                    val,
                    self.scheduler.initial_ease
                ),
            }
        }

        // RETAIN_MINIMUM_EASE
        if let Ok(val) = env::var("RETAIN_MINIMUM_EASE") {
            match val.parse::<f64>() {
                Ok(n) if SchedulerConfig::is_valid_ease(n) && n <= self.scheduler.initial_ease => {
                    self.scheduler.minimum_ease = n
                }
                _ => tracing::warn!(
                    "Invalid RETAIN_MINIMUM_EASE value '{}'. Using '{}'.",
                    val,
                    self.scheduler.minimum_ease
                ),
            }
        }

        // RETAIN_MASTERED_INTERVAL_DAYS
        if let Ok(val) = env::var("RETAIN_MASTERED_INTERVAL_DAYS") {
            match val.parse::<u32>() {
                Ok(n) => self.classifier.mastered_interval_days = n,
                Err(_) => tracing::warn!(
                    "Invalid RETAIN_MASTERED_INTERVAL_DAYS value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val,
                    self.classifier.mastered_interval_days
                ),
            }
        }

        // RETAIN_OVERDUE_DECAY_DAYS
        if let Ok(val) = env::var("RETAIN_OVERDUE_DECAY_DAYS") {
            match val.parse::<u32>() {
                Ok(n) => self.classifier.overdue_decay_days = n,
                Err(_) => tracing::warn!(
                    "Invalid RETAIN_OVERDUE_DECAY_DAYS value '{}'. \
                    Expected a positive integer. Using '{}'.",
                    val,
                    self.classifier.overdue_decay_days
                ),
            }
        }

        // RETAIN_TREND_THRESHOLD
        if let Ok(val) = env::var("RETAIN_TREND_THRESHOLD") {
            match val.parse::<f64>() {
                Ok(n) if TrendConfig::is_valid_threshold(n) => self.trend.threshold = n,
                _ => tracing::warn!(
                    "Invalid RETAIN_TREND_THRESHOLD value '{}'. \
                    Must be in range [0.0, 1.0]. Using '{}'.",
                    val,
                    self.trend.threshold
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field: every value in
    /// `other` that differs from the default replaces the value in `self`.
    ///
    /// # Limitation
    ///
    /// A higher layer cannot set a value back to its default once a lower
    /// layer changed it, since "unset" and "explicitly default" look the same
    /// after deserialization.
    fn merge(mut self, other: Config) -> Self {
        let d = SchedulerConfig::default();
        if other.scheduler.initial_ease != d.initial_ease {
            self.scheduler.initial_ease = other.scheduler.initial_ease;
        }
        if other.scheduler.minimum_ease != d.minimum_ease {
            self.scheduler.minimum_ease = other.scheduler.minimum_ease;
        }
        if other.scheduler.first_interval_days != d.first_interval_days {
            self.scheduler.first_interval_days = other.scheduler.first_interval_days;
        }
        if other.scheduler.second_interval_days != d.second_interval_days {
            self.scheduler.second_interval_days = other.scheduler.second_interval_days;
        }
        if other.scheduler.maximum_interval_days != d.maximum_interval_days {
            self.scheduler.maximum_interval_days = other.scheduler.maximum_interval_days;
        }

        let d = ClassifierConfig::default();
        let c = other.classifier;
        if c.mastered_repetitions != d.mastered_repetitions {
            self.classifier.mastered_repetitions = c.mastered_repetitions;
        }
        if c.mastered_ease != d.mastered_ease {
            self.classifier.mastered_ease = c.mastered_ease;
        }
        if c.mastered_interval_days != d.mastered_interval_days {
            self.classifier.mastered_interval_days = c.mastered_interval_days;
        }
        if c.stabilizing_repetitions != d.stabilizing_repetitions {
            self.classifier.stabilizing_repetitions = c.stabilizing_repetitions;
        }
        if c.overdue_decay_repetitions != d.overdue_decay_repetitions {
            self.classifier.overdue_decay_repetitions = c.overdue_decay_repetitions;
        }
        if c.overdue_decay_days != d.overdue_decay_days {
            self.classifier.overdue_decay_days = c.overdue_decay_days;
        }

        let d = ScoringConfig::default();
        let s = other.scoring;
        if s.familiarity_cap != d.familiarity_cap {
            self.scoring.familiarity_cap = s.familiarity_cap;
        }
        if s.familiarity_weight != d.familiarity_weight {
            self.scoring.familiarity_weight = s.familiarity_weight;
        }
        if s.mistake_cap != d.mistake_cap {
            self.scoring.mistake_cap = s.mistake_cap;
        }
        if s.mistake_weight != d.mistake_weight {
            self.scoring.mistake_weight = s.mistake_weight;
        }
        if s.decay_cap != d.decay_cap {
            self.scoring.decay_cap = s.decay_cap;
        }
        if s.decay_weight != d.decay_weight {
            self.scoring.decay_weight = s.decay_weight;
        }

        let d = TrendConfig::default();
        let t = other.trend;
        if t.window != d.window {
            self.trend.window = t.window;
        }
        if t.min_history != d.min_history {
            self.trend.min_history = t.min_history;
        }
        if t.threshold != d.threshold {
            self.trend.threshold = t.threshold;
        }
        if t.history_limit != d.history_limit {
            self.trend.history_limit = t.history_limit;
        }

        self
    }

    /// Save configuration to the project config file.
    ///
    /// Writes `.retain/config.toml` under `dir`, creating the directory if
    /// needed. Uses write-to-temp then rename.
    pub fn save_project(&self, dir: &Path) -> Result<PathBuf> {
        let project_dir = dir.join(PROJECT_DIR_NAME);
        if !project_dir.exists() {
            fs::create_dir_all(&project_dir).map_err(|e| RetainError::storage(&project_dir, e))?;
        }

        let config_path = project_dir.join("config.toml");
        let content = self.to_toml()?;

        let temp_path = project_dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| RetainError::storage(&temp_path, e))?;
        fs::rename(&temp_path, &config_path).map_err(|e| RetainError::storage(&config_path, e))?;

        Ok(config_path)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RetainError::config(e.to_string()))
    }
}

/// Get the Retain home directory.
///
/// Resolution order: `RETAIN_HOME` (if non-empty), then `~/.retain`.
pub fn retain_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("RETAIN_HOME") {
        if home.is_empty() {
            tracing::warn!("RETAIN_HOME is empty, using default");
        } else {
            return Some(PathBuf::from(home));
        }
    }

    dirs::home_dir().map(|home| home.join(PROJECT_DIR_NAME))
}

/// Path of the project config that applies to `cwd`.
///
/// Walks up from `cwd` looking for an existing `.retain/` directory and
/// falls back to `cwd/.retain/config.toml`.
pub fn project_config_path(cwd: &Path) -> PathBuf {
    cwd.ancestors()
        .find(|ancestor| ancestor.join(PROJECT_DIR_NAME).is_dir())
        .unwrap_or(cwd)
        .join(PROJECT_DIR_NAME)
        .join("config.toml")
}
