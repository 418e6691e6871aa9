//! Sessions backed by shell scripts standing in for yt-dlp and ffmpeg.

use crate::bundle::{Overrides, Toolchain};
use crate::config::Config;
use crate::console::Console;
use crate::download::Session;
use indicatif::{MultiProgress, ProgressDrawTarget};
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch directory with an `out/` folder for downloads and the fake tools beside it.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("out")).unwrap();
        Self { dir }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    /// Writes an executable `sh` script. `{out}` in `body` is replaced by the output directory.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let body = body.replace("{out}", &self.output_dir().to_string_lossy());
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// A shell line that stores every argument of the script in the workspace's `args` file.
    pub fn record_args(&self) -> String {
        let file = self.dir.path().join("args");
        format!("printf '%s\\n' \"$@\" > '{}'", file.display())
    }

    /// The arguments recorded by [`Workspace::record_args`], one per line.
    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// A session running `ytdlp` and `ffmpeg` scripts, with prompts answered from `answers`.
    pub async fn session(
        &self,
        ytdlp: &str,
        ffmpeg: &str,
        config: Config,
        answers: &[&str],
    ) -> Session {
        let config = Config {
            output_dir: self.output_dir(),
            ytdlp_path: Some(self.script("yt-dlp", ytdlp)),
            ffmpeg_path: Some(self.script("ffmpeg", ffmpeg)),
            ..config
        };
        let overrides = Overrides {
            ytdlp: config.ytdlp_path.clone(),
            ffmpeg: config.ffmpeg_path.clone(),
        };

        Session {
            toolchain: Toolchain::prepare(&overrides).await.unwrap(),
            console: console().with_answers(answers.iter().copied()),
            config,
        }
    }
}

pub fn console() -> Console {
    Console::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()))
}
