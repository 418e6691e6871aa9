//! Download audio or video from YouTube, SoundCloud and the other sites yt-dlp supports, using
//! copies of yt-dlp and ffmpeg that travel inside the binary.
//!
//! ```rust,no_run
//! # use streamline::{DownloadOptions, Mode};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = DownloadOptions {
//!     url: "https://youtu.be/xxxxx".to_string(),
//!     mode: Mode::Music,
//!     ..Default::default()
//! };
//! streamline::run(options).await?;
//! # Ok(())
//! # }
//! ```

use crate::bundle::{Overrides, Toolchain};
use crate::config::Config;
use crate::console::Console;
use crate::download::Session;
use crate::error::Result;
use std::path::PathBuf;

pub mod audio;
pub mod bundle;
pub mod config;
pub mod console;
pub mod download;
pub mod error;
pub mod executor;
pub mod metadata;
pub mod progress;
pub mod utils;
pub mod video;

#[cfg(all(test, unix))]
mod testing;

/// What to download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// MP3 with metadata and cover art.
    #[default]
    Music,
    /// Video in a chosen quality.
    Video,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub url: String,
    pub mode: Mode,
    /// Overrides the configured output directory.
    pub output_dir: Option<PathBuf>,
    /// Video quality preset (1-6), skipping the prompt.
    pub quality: Option<usize>,
    /// Config file to use instead of the default location.
    pub config_path: Option<PathBuf>,
    /// Console to draw on; a fresh stdout console when `None`.
    pub console: Option<Console>,
}

/// Extracts the tools, runs the requested mode and cleans up again.
///
/// Returns the downloaded file, when one could be identified.
pub async fn run(options: DownloadOptions) -> Result<Option<PathBuf>> {
    let mut config = Config::load(options.config_path.as_deref())?;
    if let Some(output_dir) = options.output_dir {
        config.output_dir = output_dir;
    }
    match config.to_toml() {
        Ok(text) => log::debug!("Effective config:\n{}", text),
        Err(e) => log::debug!("Could not render the config: {}", e),
    }
    if !config.output_dir.is_dir() {
        tokio::fs::create_dir_all(&config.output_dir).await?;
    }

    let overrides = Overrides {
        ytdlp: config.ytdlp_path.clone(),
        ffmpeg: config.ffmpeg_path.clone(),
    };
    let toolchain = Toolchain::prepare(&overrides).await?;
    log::debug!("Tools ready in {}", toolchain.root().display());

    let session = Session {
        toolchain,
        console: options.console.unwrap_or_default(),
        config,
    };

    match options.mode {
        Mode::Music => session.download_audio(&options.url).await.map(Some),
        Mode::Video => session.download_video(&options.url, options.quality).await,
    }
}
