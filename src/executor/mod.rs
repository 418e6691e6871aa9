//! A tool for executing commands.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

/// Represents a command executor.
///
/// # Example
///
/// ```rust,no_run
/// # use streamline::utils;
/// # use std::path::PathBuf;
/// # use std::time::Duration;
/// # use streamline::executor::Executor;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = Executor {
///     executable_path: PathBuf::from("yt-dlp"),
///     timeout: Duration::from_secs(30),
///     args: utils::to_owned(["-F", "https://youtu.be/dQw4w9WgXcQ"]),
///     search_path: None,
/// };
///
/// let output = executor.execute().await?;
/// println!("Output: {}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Executor {
    /// The path to the command executable.
    pub executable_path: PathBuf,
    /// The timeout for the process.
    pub timeout: Duration,

    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The `PATH` the process sees, if it should differ from ours.
    pub search_path: Option<OsString>,
}

/// Represents the output of a process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// The stdout of the process.
    pub stdout: String,
    /// The stderr of the process.
    pub stderr: String,
    /// The exit code of the process.
    pub code: i32,
}

impl Executor {
    fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.executable_path);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        #[cfg(target_os = "windows")]
        {
            command.creation_flags(0x08000000);
        }

        if let Some(path) = &self.search_path {
            command.env("PATH", path);
        }

        command.args(&self.args);
        command
    }

    /// Executes the command and returns the output.
    ///
    /// # Errors
    ///
    /// This function will return an error if the command could not be executed, exited with a
    /// non-zero code, or if the process timed out.
    pub async fn execute(&self) -> Result<ProcessOutput> {
        log::debug!("Executing command: {:?}", self);

        let mut child = self.command().spawn()?;

        // Drain both pipes while waiting, a full pipe would block the child forever.
        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stdout".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stderr".to_string()))?;

        let stdout_task = tokio::spawn(async move {
            let mut buffer = Vec::new();
            tokio::io::copy(&mut BufReader::new(stdout_handle), &mut buffer).await?;
            Ok::<Vec<u8>, std::io::Error>(buffer)
        });

        let stderr_task = tokio::spawn(async move {
            let mut buffer = Vec::new();
            tokio::io::copy(&mut BufReader::new(stderr_handle), &mut buffer).await?;
            Ok::<Vec<u8>, std::io::Error>(buffer)
        });

        let exit_status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(result) => result?,
            Err(_) => {
                log::warn!("Process timed out after {:?}, killing it", self.timeout);
                if let Err(e) = child.kill().await {
                    log::error!("Failed to kill process after timeout: {}", e);
                }

                return Err(Error::Timeout(self.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_task.await??).into_owned();
        let stderr = String::from_utf8_lossy(&stderr_task.await??).into_owned();

        let code = exit_status.code().unwrap_or(-1);
        if exit_status.success() {
            return Ok(ProcessOutput {
                stdout,
                stderr,
                code,
            });
        }

        Err(Error::Command(format!(
            "Process failed with code {}: {}",
            code,
            stderr.trim()
        )))
    }

    /// Runs the command, handing every stdout and stderr line to `on_line` as it arrives.
    ///
    /// Returns the exit code; a non-zero exit is left for the caller to interpret.
    ///
    /// # Errors
    ///
    /// This function will return an error if the command could not be spawned, or if it ran
    /// longer than the timeout.
    pub async fn stream<F>(&self, mut on_line: F) -> Result<i32>
    where
        F: FnMut(&str),
    {
        log::debug!("Streaming command: {:?}", self);

        let mut child = self.command().spawn()?;
        let stdout_handle = child
            .stdout
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stdout".to_string()))?;
        let stderr_handle = child
            .stderr
            .take()
            .ok_or_else(|| Error::Command("Failed to capture stderr".to_string()))?;

        let (sender, mut receiver) = mpsc::unbounded_channel();
        let stdout_task = tokio::spawn(forward_lines(stdout_handle, sender.clone()));
        let stderr_task = tokio::spawn(forward_lines(stderr_handle, sender));

        let run = async {
            while let Some(line) = receiver.recv().await {
                on_line(&line);
            }
            stdout_task.await??;
            stderr_task.await??;

            Ok::<_, Error>(child.wait().await?)
        };
        let outcome = tokio::time::timeout(self.timeout, run).await;

        let exit_status = match outcome {
            Ok(result) => result?,
            Err(_) => {
                log::warn!("Process timed out after {:?}, killing it", self.timeout);
                if let Err(e) = child.kill().await {
                    log::error!("Failed to kill process after timeout: {}", e);
                }

                return Err(Error::Timeout(self.timeout));
            }
        };

        Ok(exit_status.code().unwrap_or(-1))
    }
}

async fn forward_lines<R>(reader: R, sender: mpsc::UnboundedSender<String>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer).await? == 0 {
            return Ok(());
        }

        let line = String::from_utf8_lossy(&buffer);
        let line = line.trim_end_matches(['\n', '\r']);
        if sender.send(line.to_string()).is_err() {
            return Ok(());
        }
    }
}
