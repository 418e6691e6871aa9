//! Tools for working with the file system.

use crate::error::Result;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Creates a new executable file at the given destination, truncating any previous content.
///
/// # Arguments
///
/// * `destination` - The path to create the file at.
pub async fn create_executable(destination: impl AsRef<Path>) -> Result<File> {
    let mut open_options = OpenOptions::new();
    open_options.write(true);
    open_options.create(true);
    open_options.truncate(true);

    #[cfg(unix)]
    {
        open_options.mode(0o755);
    }

    let file = open_options.open(destination).await?;
    Ok(file)
}

/// Writes `content` as an executable at `destination`.
pub async fn write_executable(destination: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let mut file = create_executable(destination).await?;
    file.write_all(content).await?;
    file.flush().await?;

    Ok(())
}

/// Returns the path with `.temp` appended to its full file name.
///
/// `song.mp3` becomes `song.mp3.temp`, keeping the original extension visible.
pub fn temp_sibling(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".temp");

    path.with_file_name(name)
}

/// Lists the files in `dir` with the given extension, compared case-insensitively.
pub fn files_with_extension(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extension) {
            files.push(path);
        }
    }

    Ok(files)
}

/// Picks the most recently modified of `paths`.
pub fn newest(paths: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for path in paths {
        let modified = std::fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        match &newest {
            Some((time, _)) if *time >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }

    newest.map(|(_, path)| path)
}

/// Finds the most recently modified file in `dir` with the given extension.
pub fn newest_with_extension(dir: impl AsRef<Path>, extension: &str) -> Result<Option<PathBuf>> {
    Ok(newest(files_with_extension(dir, extension)?))
}

/// Returns whether the path ends with the given extension.
pub fn has_extension(path: impl AsRef<Path>, extension: &str) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Removes a file, ignoring it if it is already gone.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> Result<()> {
    match tokio::fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
