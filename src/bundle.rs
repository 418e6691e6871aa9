//! The yt-dlp and ffmpeg executables shipped inside the streamline binary.
//!
//! `build.rs` copies both tools into `OUT_DIR`; a tool that was not available at build time is
//! embedded as an empty placeholder and looked up on `PATH` instead.

use crate::error::{Error, Result};
use crate::utils::file_system;
use crate::utils::platform::Platform;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

static YT_DLP: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/yt-dlp"));
static FFMPEG: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/ffmpeg"));

/// One of the bundled tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    YtDlp,
    Ffmpeg,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::YtDlp => "yt-dlp",
            Tool::Ffmpeg => "ffmpeg",
        }
    }

    fn embedded(&self) -> &'static [u8] {
        match self {
            Tool::YtDlp => YT_DLP,
            Tool::Ffmpeg => FFMPEG,
        }
    }
}

/// Explicit tool locations that take precedence over the embedded copies.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub ytdlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

/// The extracted tools, living in a temporary directory for as long as this value does.
///
/// Dropping the toolchain deletes the directory.
#[derive(Debug)]
pub struct Toolchain {
    dir: TempDir,
    bin_dir: PathBuf,
    ytdlp: PathBuf,
    ffmpeg: PathBuf,
}

impl Toolchain {
    /// Extracts the embedded tools into a fresh temporary directory.
    pub async fn prepare(overrides: &Overrides) -> Result<Self> {
        Self::prepare_with(overrides, |tool| tool.embedded()).await
    }

    async fn prepare_with<F>(overrides: &Overrides, embedded: F) -> Result<Self>
    where
        F: Fn(Tool) -> &'static [u8],
    {
        let dir = tempfile::Builder::new().prefix("streamline").tempdir()?;
        let bin_dir = dir.path().join("bin");
        tokio::fs::create_dir(&bin_dir).await?;

        let platform = Platform::detect();
        log::debug!("Extracting {} tools into {}", platform, bin_dir.display());

        let ytdlp = install(
            Tool::YtDlp,
            &overrides.ytdlp,
            embedded(Tool::YtDlp),
            &bin_dir,
            &platform,
        )
        .await?;
        let ffmpeg = install(
            Tool::Ffmpeg,
            &overrides.ffmpeg,
            embedded(Tool::Ffmpeg),
            &bin_dir,
            &platform,
        )
        .await?;

        Ok(Self {
            dir,
            bin_dir,
            ytdlp,
            ffmpeg,
        })
    }

    pub fn ytdlp(&self) -> &Path {
        &self.ytdlp
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// The temporary directory holding the extracted tools.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// `PATH` with the extracted tools in front, so yt-dlp picks up the bundled ffmpeg.
    pub fn search_path(&self) -> OsString {
        let mut dirs = vec![self.bin_dir.clone()];
        if let Some(parent) = self.ffmpeg.parent().filter(|parent| *parent != self.bin_dir) {
            dirs.push(parent.to_path_buf());
        }
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }

        std::env::join_paths(dirs).unwrap_or_else(|_| self.bin_dir.clone().into_os_string())
    }
}

async fn install(
    tool: Tool,
    explicit: &Option<PathBuf>,
    content: &[u8],
    bin_dir: &Path,
    platform: &Platform,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::Path(path.clone()));
        }
        log::info!("Using {} from {}", tool.name(), path.display());
        return Ok(path.clone());
    }

    if !content.is_empty() {
        let path = bin_dir.join(platform.executable_name(tool.name()));
        file_system::write_executable(&path, content).await?;
        log::debug!("Extracted {} ({} bytes)", tool.name(), content.len());
        return Ok(path);
    }

    let path = which::which(tool.name()).map_err(|_| Error::MissingTool(tool.name().to_string()))?;
    log::info!("{} is not bundled, using {}", tool.name(), path.display());
    Ok(path)
}
