//! Utility functions and types used throughout the crate.

pub mod file_system;
pub mod platform;

/// Converts a slice of string-likes into owned strings.
pub fn to_owned<S: AsRef<str>>(values: impl IntoIterator<Item = S>) -> Vec<String> {
    values.into_iter().map(|value| value.as_ref().to_string()).collect()
}
