//! Unified error types for Retain with a clamp-at-the-boundary philosophy.
//!
//! The engine itself is total: every function returns a value for any input
//! it can be handed. Errors only come from the strict validating entry points,
//! configuration loading, and the CLI's I/O. Callers that cannot afford to fail
//! mid-session use [`FailOpen`] to log and substitute the nearest valid value.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Retain operations.
#[derive(Error, Debug)]
pub enum RetainError {
    /// A review grade label or quality value outside the known set.
    #[error("invalid grade: {value}")]
    InvalidGrade { value: String },

    /// Scheduling state or review input outside its documented domain.
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Configuration loading or validation errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// I/O errors from reading input or writing config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },
}

/// A specialized Result type for Retain operations.
pub type Result<T> = std::result::Result<T, RetainError>;

impl RetainError {
    /// Create an invalid grade error.
    pub fn invalid_grade(value: impl Into<String>) -> Self {
        Self::InvalidGrade {
            value: value.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Whether this error describes bad caller input rather than an
    /// environment failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGrade { .. } | Self::InvalidState { .. } | Self::Serde { .. }
        )
    }
}

impl From<io::Error> for RetainError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for RetainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Log the error as a warning and continue with a safe value instead of
/// propagating it to latency-sensitive callers.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;

    /// Handle an error by logging a warning and computing a fallback.
    fn fail_open_else<F>(self, context: &str, fallback: F) -> T
    where
        F: FnOnce() -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }

    fn fail_open_else<F>(self, context: &str, fallback: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: clamping input)", context, err);
                fallback()
            }
        }
    }
}

/// Exit codes for the Retain CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Command failed on an environment error (I/O, config).
    pub const ERROR: i32 = 1;

    /// Input was rejected by a strict validator.
    pub const INVALID_INPUT: i32 = 2;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_grade_display() {
        let err = RetainError::invalid_grade("meh");
        assert_eq!(err.to_string(), "invalid grade: meh");
    }

    #[test]
    fn test_invalid_state_display() {
        let err = RetainError::invalid_state("ease factor 0.9 below minimum 1.3");
        assert!(err.to_string().starts_with("invalid state:"));
    }

    #[test]
    fn test_config_error_display() {
        let err = RetainError::config("invalid TOML");
        assert_eq!(err.to_string(), "config error: invalid TOML");
    }

    #[test]
    fn test_storage_error_display() {
        let err = RetainError::storage(
            "/tmp/review.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/review.json"));
    }

    #[test]
    fn test_is_input_error() {
        assert!(RetainError::invalid_grade("x").is_input_error());
        assert!(RetainError::invalid_state("x").is_input_error());
        assert!(RetainError::serde("x").is_input_error());
        assert!(!RetainError::config("x").is_input_error());
        assert!(!RetainError::from(io::Error::other("x")).is_input_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: RetainError = json_err.into();
        assert!(matches!(err, RetainError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(RetainError::invalid_state("test"));
        assert!(result.fail_open_default("test context").is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<i32> = Err(RetainError::invalid_grade("test"));
        assert_eq!(result.fail_open_with("test context", 42), 42);
    }

    #[test]
    fn test_fail_open_else_only_runs_on_error() {
        let ok: Result<i32> = Ok(7);
        assert_eq!(ok.fail_open_else("ctx", || panic!("must not run")), 7);

        let err: Result<i32> = Err(RetainError::invalid_state("test"));
        assert_eq!(err.fail_open_else("ctx", || 9), 9);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::SUCCESS, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::INVALID_INPUT, 2);
        assert_eq!(exit_codes::CRASH, 3);
    }
}
