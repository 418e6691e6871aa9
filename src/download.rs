//! Running yt-dlp with a live progress display.

use crate::bundle::Toolchain;
use crate::config::Config;
use crate::console::{Console, Status};
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::progress::{DownloadBar, LineParser, ProgressEvent};
use crate::utils::{self, file_system};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a download mode needs: the extracted tools, the terminal and the user's settings.
pub struct Session {
    pub toolchain: Toolchain,
    pub console: Console,
    pub config: Config,
}

/// What yt-dlp said about the files it produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DownloadReport {
    /// Every file yt-dlp started writing, in order.
    pub destinations: Vec<PathBuf>,
    /// A file that existed already and was skipped.
    pub already_downloaded: Option<PathBuf>,
    /// The output of the audio extractor.
    pub audio: Option<PathBuf>,
    /// The output of the video/audio merger.
    pub merged: Option<PathBuf>,
    /// Error lines, in order.
    pub errors: Vec<String>,
}

impl DownloadReport {
    /// The final media file with the given extension, as best as the output tells.
    pub fn final_file(&self, extension: &str) -> Option<PathBuf> {
        [&self.audio, &self.merged]
            .into_iter()
            .flatten()
            .chain(self.destinations.iter().rev())
            .chain(self.already_downloaded.iter())
            .find(|path| file_system::has_extension(path, extension))
            .cloned()
    }

    /// The last file yt-dlp mentioned, whatever its type.
    pub fn last_file(&self) -> Option<PathBuf> {
        self.merged
            .clone()
            .or_else(|| self.destinations.last().cloned())
            .or_else(|| self.already_downloaded.clone())
    }
}

/// Turns progress events into bars and status lines, and records them in a [`DownloadReport`].
pub struct ProgressRenderer<'a> {
    console: &'a Console,
    description: String,
    bar: Option<DownloadBar>,
    report: DownloadReport,
}

impl<'a> ProgressRenderer<'a> {
    pub fn new(console: &'a Console, description: &str) -> Self {
        Self {
            console,
            description: description.to_string(),
            bar: None,
            report: DownloadReport::default(),
        }
    }

    pub fn handle(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Progress { downloaded, total } => {
                let console = self.console;
                let description = &self.description;
                self.bar
                    .get_or_insert_with(|| console.download_bar(description))
                    .update(downloaded, total);
            }
            ProgressEvent::Destination(path) => {
                self.complete_bar();
                self.console
                    .status(Status::Info, format!("File: {}", path.display()));
                self.report.destinations.push(path);
            }
            ProgressEvent::AlreadyDownloaded(path) => {
                self.console
                    .status(Status::Warning, "File already exists, skipping...");
                self.report.already_downloaded = Some(path);
            }
            ProgressEvent::Finished => self.complete_bar(),
            ProgressEvent::Merging(path) => {
                self.complete_bar();
                self.console
                    .status(Status::Info, "Merging video and audio streams...");
                if path.is_some() {
                    self.report.merged = path;
                }
            }
            ProgressEvent::AudioDestination(path) => {
                self.complete_bar();
                self.report.audio = Some(path);
            }
            ProgressEvent::Error(message) => {
                log::debug!("yt-dlp error: {}", message);
                self.report.errors.push(message);
            }
        }
    }

    fn complete_bar(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.complete();
        }
    }

    /// Completes any bar still open and hands back the report.
    pub fn finish(mut self) -> DownloadReport {
        self.complete_bar();
        self.report
    }
}

impl Session {
    /// An executor for the bundled yt-dlp.
    pub fn ytdlp<S: AsRef<str>>(
        &self,
        args: impl IntoIterator<Item = S>,
        timeout: Duration,
    ) -> Executor {
        Executor {
            executable_path: self.toolchain.ytdlp().to_path_buf(),
            timeout,
            args: utils::to_owned(args),
            search_path: Some(self.toolchain.search_path()),
        }
    }

    /// An executor for the bundled ffmpeg.
    pub fn ffmpeg<S: AsRef<str>>(&self, args: impl IntoIterator<Item = S>) -> Executor {
        Executor {
            executable_path: self.toolchain.ffmpeg().to_path_buf(),
            timeout: self.config.ffmpeg_timeout(),
            args: utils::to_owned(args),
            search_path: Some(self.toolchain.search_path()),
        }
    }

    /// The output directory as yt-dlp should see it.
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Asks yt-dlp for the title behind `url` without downloading anything.
    pub async fn probe_title(&self, url: &str) -> Result<String> {
        let args = [
            "--skip-download",
            "--no-warnings",
            "--no-playlist",
            "--print",
            "%(title)s",
            url,
        ];
        let output = self.ytdlp(args, self.config.probe_timeout()).execute().await?;

        Ok(output.stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Runs yt-dlp with `args`, rendering its progress under `description`.
    pub async fn download(&self, description: &str, args: Vec<String>) -> Result<DownloadReport> {
        let mut args = args;
        args.extend(utils::to_owned(["--newline", "--progress"]));

        let mut parser = LineParser::new();
        let mut renderer = ProgressRenderer::new(&self.console, description);

        let executor = self.ytdlp(args, self.config.download_timeout());
        let code = executor
            .stream(|line| {
                log::trace!("yt-dlp: {}", line);
                for event in parser.parse(line) {
                    renderer.handle(event);
                }
            })
            .await?;
        let report = renderer.finish();

        if code != 0 {
            let reason = report
                .errors
                .last()
                .cloned()
                .unwrap_or_else(|| "yt-dlp exited unsuccessfully".to_string());
            return Err(Error::Download { code, reason });
        }

        Ok(report)
    }
}


#[cfg(all(test, unix))]
mod session_tests {
    use super::*;
    use crate::testing::Workspace;

    #[tokio::test]
    async fn failed_download_reports_the_last_error_line() {
        let workspace = Workspace::new();
        let ytdlp = r#"
echo "[youtube] Extracting URL: $1"
echo "ERROR: [youtube] xxxxx: Sign in to confirm your age" >&2
echo "ERROR: [youtube] xxxxx: Video unavailable" >&2
exit 1
"#;
        let session = workspace.session(ytdlp, "", Config::default(), &[]).await;

        let err = session
            .download("Downloading audio", vec!["https://youtu.be/xxxxx".to_string()])
            .await
            .unwrap_err();

        match err {
            Error::Download { code, reason } => {
                assert_eq!(code, 1);
                assert_eq!(reason, "[youtube] xxxxx: Video unavailable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn silent_failure_still_has_a_reason() {
        let workspace = Workspace::new();
        let session = workspace.session("exit 2", "", Config::default(), &[]).await;

        let err = session.download("Downloading video", Vec::new()).await.unwrap_err();
        let Error::Download { code, reason } = err else {
            panic!("expected a download error");
        };
        assert_eq!(code, 2);
        assert_eq!(reason, "yt-dlp exited unsuccessfully");
    }

    #[tokio::test]
    async fn progress_flags_are_appended() {
        let workspace = Workspace::new();
        let session = workspace
            .session(&workspace.record_args(), "", Config::default(), &[])
            .await;

        session
            .download("Downloading audio", vec!["https://youtu.be/xxxxx".to_string()])
            .await
            .unwrap();

        assert_eq!(
            workspace.recorded_args(),
            vec!["https://youtu.be/xxxxx", "--newline", "--progress"]
        );
    }
}
