//! Terminal rendering for downloads and indeterminate work.

use super::format_duration;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressState, ProgressStyle};
use std::fmt::Write;
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{msg:.bold} {bar:40.green/dim} │ {percent1:.cyan} │ {megabytes:.yellow} │ {speed:.blue} │ ETA: {remaining:.green}";
const SPINNER_FRAMES: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];
const MIB: f64 = 1024.0 * 1024.0;

/// Average bytes per second since the bar started.
fn average_speed(state: &ProgressState) -> f64 {
    let elapsed = state.elapsed().as_secs_f64().max(0.1);
    state.pos() as f64 / elapsed
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("percent1", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:.1}%", state.fraction() * 100.0);
        })
        .with_key("megabytes", |state: &ProgressState, w: &mut dyn Write| {
            let total = state.len().unwrap_or(0) as f64;
            let _ = write!(w, "{:.2}/{:.2} MB", state.pos() as f64 / MIB, total / MIB);
        })
        .with_key("speed", |state: &ProgressState, w: &mut dyn Write| {
            let _ = write!(w, "{:.2} MB/s", average_speed(state) / MIB);
        })
        .with_key("remaining", |state: &ProgressState, w: &mut dyn Write| {
            let speed = average_speed(state);
            let remaining = match state.len() {
                Some(total) if speed > 0.0 => total.saturating_sub(state.pos()) as f64 / speed,
                _ => 0.0,
            };
            let _ = write!(w, "{}", format_duration(remaining));
        })
        .progress_chars("█░")
}

/// A byte-counting progress bar for one downloaded file.
pub struct DownloadBar {
    bar: ProgressBar,
}

impl DownloadBar {
    pub fn new(multi: &MultiProgress, description: &str) -> Self {
        let bar = multi.add(ProgressBar::new(0));
        bar.set_style(bar_style());
        bar.set_message(description.to_string());

        Self { bar }
    }

    /// Moves the bar to `current` out of `total` bytes.
    pub fn update(&self, current: f64, total: f64) {
        let total = total.max(0.0) as u64;
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position((current.max(0.0) as u64).min(total));
    }

    /// Fills the bar and leaves it on screen.
    pub fn complete(self) {
        if let Some(total) = self.bar.length().filter(|total| *total > 0) {
            self.bar.set_position(total);
        }
        self.bar.finish();
    }
}

/// A spinner for work without measurable progress.
///
/// The animation is driven by indicatif's steady tick thread until [`Spinner::stop`] is called.
pub struct Spinner {
    bar: ProgressBar,
    multi: MultiProgress,
    message: String,
}

impl Spinner {
    pub fn start(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&SPINNER_FRAMES);
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            multi: multi.clone(),
            message: message.to_string(),
        }
    }

    /// Stops the animation and leaves a ✓ or ✗ line behind.
    pub fn stop(self, success: bool) {
        self.bar.finish_and_clear();
        self.multi.remove(&self.bar);

        let icon = if success { "✓".green() } else { "✗".red() };
        let message = self.message;
        self.multi.suspend(|| println!("{} {}", icon, message));
    }
}
