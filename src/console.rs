//! Styled terminal output shared by every mode.

use crate::error::Result;
use crate::progress::{DownloadBar, Spinner};
use colored::{ColoredString, Colorize};
use indicatif::{MultiProgress, ProgressDrawTarget};
use std::collections::VecDeque;
use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};

pub const AUTHOR_TAG: &str = "Streamline by SK (Shahil Ahmed)";
pub const PROJECT_URL: &str = "https://github.com/shahil-sk/streamline";

const BANNER: &str = "
╔═════════════════════════════════════════════╗
║ Streamline - YouTube/SoundCloud Downloader  ║
╚═════════════════════════════════════════════╝
";

/// The kind of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Warning,
    Error,
}

impl Status {
    pub fn icon(&self) -> ColoredString {
        match self {
            Status::Info => "ℹ".blue(),
            Status::Success => "✓".green(),
            Status::Warning => "⚠".yellow(),
            Status::Error => "✗".red(),
        }
    }
}

/// Disables colors when stdout is not a terminal or `NO_COLOR` is set.
pub fn init_colors() {
    let enabled = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    colored::control::set_override(enabled);
}

/// Writes status lines, prompts, bars and spinners without tearing each other.
///
/// Every line goes through the shared [`MultiProgress`], which log output is bridged onto as well.
#[derive(Clone, Debug)]
pub struct Console {
    multi: MultiProgress,
    answers: Arc<Mutex<VecDeque<String>>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new(MultiProgress::with_draw_target(ProgressDrawTarget::stdout_with_hz(10)))
    }
}

impl Console {
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            answers: Arc::default(),
        }
    }

    /// Answers the next prompts with `answers`, in order, before reading stdin again.
    pub fn with_answers<S: Into<String>>(self, answers: impl IntoIterator<Item = S>) -> Self {
        self.answers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(answers.into_iter().map(Into::into));
        self
    }

    fn scripted_answer(&self) -> Option<String> {
        self.answers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    pub fn multi(&self) -> &MultiProgress {
        &self.multi
    }

    pub fn println(&self, line: impl AsRef<str>) {
        self.multi.suspend(|| println!("{}", line.as_ref()));
    }

    pub fn status(&self, status: Status, message: impl AsRef<str>) {
        self.println(format!("{} {}", status.icon(), message.as_ref()));
    }

    pub fn banner(&self) {
        self.println(BANNER.cyan().to_string());
    }

    pub fn spinner(&self, message: &str) -> Spinner {
        Spinner::start(&self.multi, message)
    }

    pub fn download_bar(&self, description: &str) -> DownloadBar {
        DownloadBar::new(&self.multi, description)
    }

    /// Prints `question` and reads one trimmed line from stdin.
    pub fn prompt(&self, question: impl AsRef<str>) -> Result<String> {
        self.multi.suspend(|| -> Result<String> {
            print!("{} ", question.as_ref().cyan());
            std::io::stdout().flush()?;

            let answer = match self.scripted_answer() {
                Some(answer) => answer,
                None => {
                    let mut answer = String::new();
                    std::io::stdin().read_line(&mut answer)?;
                    answer
                }
            };
            println!();

            Ok(answer.trim().to_string())
        })
    }
}

/// The author information shown by `--about`.
pub fn about() -> String {
    format!(
        "\n{}\n\n{} {}\n",
        AUTHOR_TAG.cyan(),
        "GitHub:".yellow(),
        PROJECT_URL.blue()
    )
}

/// The usage screen shown when no mode was given.
pub fn usage() -> String {
    let mut text = String::new();
    text.push_str(&format!(
        "\n{}\n",
        "╔═════════════════════════════════════════════╗".cyan()
    ));
    text.push_str(&format!(
        "{}  {} - YouTube/SoundCloud Downloader {}\n",
        "║".cyan(),
        "Streamline".bold(),
        "║".cyan()
    ));
    text.push_str(&format!(
        "{}\n\n",
        "╚═════════════════════════════════════════════╝".cyan()
    ));

    text.push_str(&format!("{}\n", "Usage:".yellow()));
    text.push_str("  streamline -m <url>    Download audio with metadata and cover\n");
    text.push_str("  streamline -v <url>    Download video, choose quality manually\n");
    text.push_str("  streamline --about     Show author information\n\n");

    text.push_str(&format!("{}\n", "Examples:".yellow()));
    text.push_str("  streamline -m https://youtube.com/watch?v=xxxxx\n");
    text.push_str("  streamline -v https://youtu.be/xxxxx\n\n");

    text.push_str(&format!("{}\n", "Flags:".yellow()));
    text.push_str(&format!(
        "  {}        Music/audio mode (MP3 + metadata + cover art)\n",
        "-m".green()
    ));
    text.push_str(&format!(
        "  {}        Video mode (quality selection)\n",
        "-v".green()
    ));
    text.push_str(&format!("  {}   Author information\n", "--about".green()));
    text.push_str(&format!(
        "  {}    More options (output directory, quality, config)\n",
        "--help".green()
    ));

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_lists_every_mode() {
        colored::control::set_override(false);
        let text = usage();

        assert!(text.contains("streamline -m <url>"));
        assert!(text.contains("streamline -v <url>"));
        assert!(text.contains("--about"));
    }

    #[test]
    fn scripted_answers_are_trimmed_and_used_in_order() {
        let console = Console::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
            .with_answers([" 2 \n", "137+140"]);

        assert_eq!(console.prompt("Choose quality (1-6):").unwrap(), "2");
        assert_eq!(console.prompt("Enter format ID:").unwrap(), "137+140");
    }

    #[test]
    fn about_names_the_author() {
        colored::control::set_override(false);
        let text = about();

        assert!(text.contains(AUTHOR_TAG));
        assert!(text.contains(PROJECT_URL));
    }
}
