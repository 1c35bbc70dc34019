//! Reading cgroup control files.
//!
//! Every reader returns a [`Result`]; [`or_sentinel`] is the single place
//! where a failure turns into the field's "unset" value.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use oscontainer_common::constants::NO_LIMIT;
use oscontainer_common::error::{ErrorClass, OsContainerError, Result};

/// Reads a control file and trims surrounding whitespace.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not UTF-8.
pub fn read_trimmed(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map(|content| content.trim().to_owned())
        .map_err(|e| OsContainerError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Parses `value` read from `path`.
///
/// # Errors
///
/// Returns [`OsContainerError::Parse`] if `value` is not a `T`.
pub fn parse_value<T>(path: &Path, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| OsContainerError::parse(path, format!("{value:?}: {e}")))
}

/// Reads a control file holding a single number.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold a `T`.
pub fn read_number<T>(path: &Path) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let content = read_trimmed(path)?;
    parse_value(path, &content)
}

/// Parses a v2 limit token, where `max` means no limit.
///
/// # Errors
///
/// Returns [`OsContainerError::Parse`] for anything but `max` or an integer.
pub fn parse_limit(path: &Path, value: &str) -> Result<i64> {
    if value == "max" {
        Ok(NO_LIMIT)
    } else {
        parse_value(path, value)
    }
}

/// Reads a control file holding a v2 limit.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a limit.
pub fn read_limit(path: &Path) -> Result<i64> {
    let content = read_trimmed(path)?;
    parse_limit(path, &content)
}

/// Finds `key` in a flat-keyed file such as `memory.stat`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the key is absent, or its
/// value is not a `T`.
pub fn read_keyed<T>(path: &Path, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let content = read_trimmed(path)?;
    let value = content
        .lines()
        .filter_map(|line| line.split_once(char::is_whitespace))
        .find_map(|(k, v)| (k == key).then(|| v.trim()))
        .ok_or_else(|| OsContainerError::parse(path, format!("key {key} not present")))?;
    parse_value(path, value)
}

/// Unwraps `result`, substituting `sentinel` and logging the failure.
pub fn or_sentinel<T>(result: Result<T>, sentinel: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            match e.class() {
                ErrorClass::Unavailable => tracing::trace!(error = %e, "cgroup value unavailable"),
                ErrorClass::Malformed => tracing::warn!(error = %e, "ignoring malformed cgroup value"),
            }
            sentinel
        }
    }
}
