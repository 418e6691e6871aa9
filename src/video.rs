//! Video mode: pick a quality, download, merge.

use crate::console::Status;
use crate::download::Session;
use crate::error::Result;
use crate::utils::file_system;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// A named yt-dlp format expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPreset {
    pub label: &'static str,
    pub format: &'static str,
}

pub const BEST_FORMAT: &str = "bestvideo+bestaudio/best";

/// The menu shown in video mode. The last entry asks for a format by hand.
pub const PRESETS: [QualityPreset; 6] = [
    QualityPreset {
        label: "Best Quality (Auto)",
        format: BEST_FORMAT,
    },
    QualityPreset {
        label: "1080p",
        format: "bestvideo[height<=1080]+bestaudio/best[height<=1080]",
    },
    QualityPreset {
        label: "720p",
        format: "bestvideo[height<=720]+bestaudio/best[height<=720]",
    },
    QualityPreset {
        label: "480p",
        format: "bestvideo[height<=480]+bestaudio/best[height<=480]",
    },
    QualityPreset {
        label: "360p",
        format: "bestvideo[height<=360]+bestaudio/best[height<=360]",
    },
    QualityPreset {
        label: "Custom Format (Advanced)",
        format: "",
    },
];

/// What a menu answer resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityChoice {
    Preset(&'static str),
    Custom,
    Invalid,
}

impl QualityChoice {
    pub fn from_number(choice: usize) -> Self {
        match choice {
            n if n == PRESETS.len() => QualityChoice::Custom,
            n if n >= 1 && n < PRESETS.len() => QualityChoice::Preset(PRESETS[n - 1].format),
            _ => QualityChoice::Invalid,
        }
    }

    /// Parses what the user typed at the prompt.
    pub fn parse(answer: &str) -> Self {
        answer
            .trim()
            .parse::<usize>()
            .map(Self::from_number)
            .unwrap_or(QualityChoice::Invalid)
    }
}

/// The boxed preset menu.
pub fn preset_menu() -> String {
    let mut menu = format!(
        "{}\n",
        "┌─ Quality Presets ───────────────────────────┐".yellow()
    );
    for (index, preset) in PRESETS.iter().enumerate() {
        menu.push_str(&format!(
            "{} {} {:<40} {}\n",
            "│".yellow(),
            format!("{}.", index + 1).green(),
            preset.label,
            "│".yellow()
        ));
    }
    menu.push_str(&format!(
        "{}\n",
        "└─────────────────────────────────────────────┘".yellow()
    ));

    menu
}

/// yt-dlp arguments for downloading `url` in `format`.
pub fn download_args(url: &str, format: &str, template: &str, output_dir: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        format.to_string(),
        "-o".to_string(),
        template.to_string(),
        "-P".to_string(),
        output_dir.to_string_lossy().into_owned(),
        url.to_string(),
    ]
}

impl Session {
    /// Downloads `url` as video. Without `quality` the user picks from [`PRESETS`].
    ///
    /// Returns the downloaded file, if yt-dlp's output named one.
    pub async fn download_video(
        &self,
        url: &str,
        quality: Option<usize>,
    ) -> Result<Option<PathBuf>> {
        self.console.banner();

        let choice = match quality.or(self.config.default_quality) {
            Some(number) => QualityChoice::from_number(number),
            None => {
                self.console.println(preset_menu());
                let answer = self
                    .console
                    .prompt(format!("Choose quality (1-{}):", PRESETS.len()))?;
                QualityChoice::parse(&answer)
            }
        };

        let format = match choice {
            QualityChoice::Preset(format) => format.to_string(),
            QualityChoice::Custom => self.custom_format(url).await?,
            QualityChoice::Invalid => {
                self.console
                    .status(Status::Warning, "Invalid choice, using best quality");
                BEST_FORMAT.to_string()
            }
        };
        log::debug!("Video format: {}", format);

        self.console.status(Status::Info, "Starting video download...");
        self.console.println("");

        let output_dir = self.output_dir();
        let args = download_args(url, &format, &self.config.output_template, output_dir);
        let report = self.download("Downloading video", args).await?;

        let file = match report.last_file().filter(|path| path.is_file()) {
            Some(path) => Some(path),
            None => file_system::newest_with_extension(output_dir, "mp4")?,
        };
        if let Some(file) = &file {
            self.console.println("");
            self.console.status(
                Status::Success,
                format!("✨ Successfully downloaded: {}", file.display().to_string().bold()),
            );
        }

        Ok(file)
    }

    /// Lists the formats yt-dlp offers and reads the user's pick.
    async fn custom_format(&self, url: &str) -> Result<String> {
        let spinner = self.console.spinner("Fetching available formats...");
        let listing = self
            .ytdlp(["-F", url], self.config.probe_timeout())
            .execute()
            .await;
        spinner.stop(listing.is_ok());

        match listing {
            Ok(output) => self.console.println(output.stdout),
            Err(e) => log::warn!("Could not list formats: {}", e),
        }

        self.console.println("");
        let format = self
            .console
            .prompt("Enter format ID or combination (e.g., 137+140):")?;
        if format.is_empty() {
            self.console
                .status(Status::Warning, "No format given, using best quality");
            return Ok(BEST_FORMAT.to_string());
        }

        Ok(format)
    }
}
