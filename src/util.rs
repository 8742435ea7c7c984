//! Utility functions for Retain.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use crate::error::{RetainError, Result};

/// Maximum input size that will be read into memory (10 MB).
///
/// A queue export for a large deck is a few hundred KB; anything past this
/// is almost certainly the wrong file.
pub const MAX_INPUT_SIZE: u64 = 10 * 1024 * 1024;

/// Read a file into a string with size limit protection.
///
/// # Errors
///
/// Returns an error if the file cannot be read or exceeds `max_size`.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| RetainError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(RetainError::storage(
            path,
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file is too large ({} bytes, max {} bytes)", size, max_size),
            ),
        ));
    }

    fs::read_to_string(path).map_err(|e| RetainError::storage(path, e))
}

/// Read command input from `path`, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => read_to_string_with_limit(path, MAX_INPUT_SIZE),
        None => read_limited(io::stdin().lock(), MAX_INPUT_SIZE),
    }
}

/// Read a reader to a string, failing if it yields more than `max_size` bytes.
pub fn read_limited<R: Read>(reader: R, max_size: u64) -> Result<String> {
    let mut content = String::new();
    reader
        .take(max_size + 1)
        .read_to_string(&mut content)
        .map_err(|e| RetainError::storage("<stdin>", e))?;

    if content.len() as u64 > max_size {
        return Err(RetainError::storage(
            "<stdin>",
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("input exceeds {} bytes", max_size),
            ),
        ));
    }
    Ok(content)
}

/// Describe a due date relative to `now` ("now", "in 3 days", "2 days ago").
pub fn describe_due(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(due) = due else {
        return "not scheduled".to_string();
    };

    let delta = due - now;
    if delta <= Duration::zero() && delta > -Duration::days(1) {
        return "now".to_string();
    }

    let days = delta.num_days();
    match days {
        0 => "later today".to_string(),
        1 => "in 1 day".to_string(),
        -1 => "1 day ago".to_string(),
        d if d > 0 => format!("in {} days", d),
        d => format!("{} days ago", -d),
    }
}
