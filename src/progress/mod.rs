//! Turns yt-dlp's line-oriented output into progress events.
//!
//! yt-dlp is run with `--newline --progress`, so every progress refresh arrives as its own line:
//!
//! ```text
//! [download] Destination: Some Song.webm
//! [download]  45.2% of   12.34MiB at    1.20MiB/s ETA 00:05
//! [download] 100% of   12.34MiB in 00:00:10 at 1.21MiB/s
//! [ExtractAudio] Destination: Some Song.mp3
//! ```
//!
//! [`LineParser`] only understands the handful of shapes above; everything else is ignored.

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

pub mod bar;

pub use bar::{DownloadBar, Spinner};

static SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*([KMGT]i?B?)").expect("valid size regex"));
static PROGRESS_WITH_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*([\d.]+\s*[KMGT]i?B)")
        .expect("valid progress regex")
});
static PROGRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[download\]\s+(\d+\.?\d*)%").expect("valid percentage regex")
});
static TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"of\s+~?\s*([\d.]+\s*[KMGT]i?B)").expect("valid total size regex")
});

const KIB: f64 = 1024.0;

/// Parses sizes like `12.34MiB`, `1.2GiB`, `12.34M` or `1.2G` into bytes.
///
/// Both `KB` and `KiB` count as 1024 bytes, yt-dlp only ever prints binary units.
/// Returns 0 for anything that does not look like a size.
pub fn parse_size(size: &str) -> f64 {
    let Some(captures) = SIZE.captures(size.trim()) else {
        return 0.0;
    };

    let value: f64 = captures[1].parse().unwrap_or(0.0);
    let mut unit = captures[2].to_uppercase();
    if unit.len() == 1 {
        unit.push('B');
    }

    let multiplier = match unit.as_str() {
        "B" => 1.0,
        "KB" | "KIB" => KIB,
        "MB" | "MIB" => KIB.powi(2),
        "GB" | "GIB" => KIB.powi(3),
        "TB" | "TIB" => KIB.powi(4),
        // "Ki" without the trailing B
        _ => match unit.trim_end_matches('I') {
            "K" => KIB,
            "M" => KIB.powi(2),
            "G" => KIB.powi(3),
            "T" => KIB.powi(4),
            _ => 0.0,
        },
    };

    value * multiplier
}

/// Formats a remaining time in seconds as `MM:SS`, or `Hh Mm` past the hour.
///
/// Negative or absurd (more than a day) estimates render as `--:--`.
pub fn format_duration(seconds: f64) -> String {
    if !(0.0..=86400.0).contains(&seconds) {
        return "--:--".to_string();
    }

    let whole = seconds as u64;
    let minutes = whole / 60;
    let secs = whole % 60;

    if minutes > 60 {
        return format!("{}h {}m", minutes / 60, minutes % 60);
    }

    format!("{:02}:{:02}", minutes, secs)
}

/// Something worth reacting to in the downloader's output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Bytes downloaded so far out of the total, both derived from the printed percentage.
    Progress { downloaded: f64, total: f64 },
    /// A new file is being written.
    Destination(PathBuf),
    /// The file exists already and will not be downloaded again.
    AlreadyDownloaded(PathBuf),
    /// The current file reached 100%.
    Finished,
    /// Separate video and audio streams are being merged, into the given file when known.
    Merging(Option<PathBuf>),
    /// The audio extractor wrote its output file.
    AudioDestination(PathBuf),
    /// yt-dlp reported an error.
    Error(String),
}

/// Stateful parser over yt-dlp output lines.
///
/// Remembers the total size of the file being downloaded, so that lines carrying only a
/// percentage can still be turned into byte counts.
#[derive(Debug, Default)]
pub struct LineParser {
    total_size: f64,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// The total size, in bytes, of the file currently being downloaded, or 0 if unknown.
    pub fn total_size(&self) -> f64 {
        self.total_size
    }

    /// Parses one line of output.
    pub fn parse(&mut self, line: &str) -> Vec<ProgressEvent> {
        let mut events = Vec::new();

        if line.contains("[download]") {
            self.parse_download(line, &mut events);
        } else if line.contains("Merging formats") {
            events.push(ProgressEvent::Merging(merge_target(line)));
        } else if let Some(path) = line.strip_prefix("[ExtractAudio] Destination:") {
            let path = path.trim();
            if !path.is_empty() {
                events.push(ProgressEvent::AudioDestination(PathBuf::from(path)));
            }
        } else if let Some(message) = line.trim_start().strip_prefix("ERROR:") {
            events.push(ProgressEvent::Error(message.trim().to_string()));
        }

        events
    }

    fn parse_download(&mut self, line: &str, events: &mut Vec<ProgressEvent>) {
        if self.total_size == 0.0 {
            if let Some(captures) = TOTAL.captures(line) {
                self.total_size = parse_size(&captures[1]);
            }
        }

        if let Some(captures) = PROGRESS_WITH_TOTAL.captures(line) {
            let percent: f64 = captures[1].parse().unwrap_or(0.0);
            let total = parse_size(&captures[2]);

            if total > 0.0 {
                self.total_size = total;
                events.push(ProgressEvent::Progress {
                    downloaded: total * (percent / 100.0),
                    total,
                });
            }
        } else if let Some(captures) = PROGRESS.captures(line) {
            let percent: f64 = captures[1].parse().unwrap_or(0.0);

            if self.total_size > 0.0 {
                events.push(ProgressEvent::Progress {
                    downloaded: self.total_size * (percent / 100.0),
                    total: self.total_size,
                });
            }
        }

        if line.contains("Destination:") {
            let path = line
                .split_once("Destination:")
                .map(|(_, path)| path.trim())
                .unwrap_or_default();
            // every destination is a new file with its own size
            self.total_size = 0.0;
            events.push(ProgressEvent::Destination(PathBuf::from(path)));
        } else if line.contains("has already been downloaded") {
            let path = line
                .trim_start_matches("[download]")
                .trim()
                .trim_end_matches("has already been downloaded")
                .trim();
            events.push(ProgressEvent::AlreadyDownloaded(PathBuf::from(path)));
        } else if line.contains("100%") || line.contains("download completed") {
            events.push(ProgressEvent::Finished);
        }
    }
}

fn merge_target(line: &str) -> Option<PathBuf> {
    let (_, rest) = line.split_once("Merging formats into")?;
    let path = rest.trim().trim_matches('"');

    (!path.is_empty()).then(|| PathBuf::from(path))
}
