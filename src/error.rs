//! The errors that can occur.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
#[derive(Debug, Error)]
pub enum Error {
    /// An error occurred while running the runtime.
    #[error("An error occurred while running the runtime: {0}")]
    Runtime(#[from] tokio::task::JoinError),
    /// An error occurred while interacting with the file system.
    #[error("An IO error occurred: {0}")]
    IO(#[from] std::io::Error),
    /// An error occurred while parsing JSON.
    #[error("An error occurred while parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// An error occurred while reading or writing audio tags.
    #[error("An error occurred while tagging the audio file: {0}")]
    Tag(#[from] lofty::error::LoftyError),

    /// A bundled tool is neither embedded nor installed.
    #[error("{0} is not bundled with this build and was not found on PATH")]
    MissingTool(String),
    /// An error occurred while running a command.
    #[error("Failed to execute command: {0}")]
    Command(String),
    /// The downloader exited unsuccessfully.
    #[error("Download failed (exit code {code}): {reason}")]
    Download { code: i32, reason: String },
    /// An expected output file was not produced.
    #[error("No {0} file found")]
    MissingFile(String),
    /// An error occurred manipulating a path.
    #[error("An invalid path was provided: {0}")]
    Path(PathBuf),
    /// The configuration could not be used.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// An error occurred due to a timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}
