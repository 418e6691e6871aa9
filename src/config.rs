//! User configuration, read from `<config dir>/streamline/config.toml`.
//!
//! Every field is optional in the file; missing fields keep their defaults.
//!
//! ```toml
//! output_dir = "/home/me/Music"
//! square_cover = true
//! default_quality = 2
//! ```

use crate::error::{Error, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "streamline";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where downloads are written.
    pub output_dir: PathBuf,
    /// yt-dlp output template, relative to `output_dir`.
    pub output_template: String,
    /// Embed the thumbnail as cover art in music mode.
    pub embed_cover: bool,
    /// Crop the cover to a centred square before embedding it.
    pub square_cover: bool,
    /// Edge length of the square cover, in pixels.
    pub cover_size: u32,
    /// Fill empty tags from yt-dlp's info JSON in music mode.
    pub fill_tags: bool,
    /// Album used when the source names none.
    pub default_album: String,
    /// Quality preset picked without prompting in video mode (1-6).
    pub default_quality: Option<usize>,
    pub probe_timeout_secs: u64,
    pub ffmpeg_timeout_secs: u64,
    pub download_timeout_secs: u64,
    /// Use this yt-dlp instead of the bundled one.
    pub ytdlp_path: Option<PathBuf>,
    /// Use this ffmpeg instead of the bundled one.
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            output_template: "%(title)s.%(ext)s".to_string(),
            embed_cover: true,
            square_cover: false,
            cover_size: 500,
            fill_tags: true,
            default_album: "YouTube Downloads".to_string(),
            default_quality: None,
            probe_timeout_secs: 120,
            ffmpeg_timeout_secs: 300,
            download_timeout_secs: 6 * 60 * 60,
            ytdlp_path: None,
            ffmpeg_path: None,
        }
    }
}

impl Config {
    /// The default location of the config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads the config at `path`, or at [`Config::default_path`] when `None`.
    ///
    /// A missing file yields the defaults. So does a malformed one, after logging why: a broken
    /// config should not stop a download.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path.is_some();
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            debug!("No config directory on this platform, using defaults");
            return Ok(Self::default());
        };

        if !path.is_file() {
            if explicit {
                return Err(Error::Config(format!("{} does not exist", path.display())));
            }
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        match Self::parse(&content) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                error!("Malformed config file {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Parses and validates a config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(e.message().to_string()))?;
        config.validate()?;

        Ok(config)
    }

    /// Renders the config as TOML, the way the file would spell it.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.cover_size == 0 {
            return Err(Error::Config("cover_size must be positive".to_string()));
        }
        if self.output_template.trim().is_empty() {
            return Err(Error::Config("output_template must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn ffmpeg_timeout(&self) -> Duration {
        Duration::from_secs(self.ffmpeg_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = Config::parse(
            r#"
            output_dir = "/music"
            square_cover = true
            cover_size = 600
            default_quality = 3
            ffmpeg_path = "/usr/bin/ffmpeg"
            "#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/music"));
        assert!(config.square_cover);
        assert_eq!(config.cover_size, 600);
        assert_eq!(config.default_quality, Some(3));
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/usr/bin/ffmpeg")));
        assert!(config.embed_cover);
        assert_eq!(config.default_album, "YouTube Downloads");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::parse("cover_size = 0").is_err());
        assert!(Config::parse("output_template = \"  \"").is_err());
        assert!(Config::parse("embed_cover = \"yes\"").is_err());
    }

    #[test]
    fn rendered_config_reads_back_the_same() {
        let config = Config {
            output_dir: PathBuf::from("/music"),
            default_quality: Some(2),
            ytdlp_path: Some(PathBuf::from("/opt/yt-dlp")),
            ..Default::default()
        };

        let text = config.to_toml().unwrap();
        assert!(text.contains("default_quality = 2"), "{text}");
        assert!(!text.contains("ffmpeg_path"), "{text}");
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "output_dir = [").unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
        assert!(path.exists());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        assert!(matches!(Config::load(Some(&path)), Err(Error::Config(_))));
    }
}
