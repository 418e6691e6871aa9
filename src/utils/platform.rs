//! Platform detection.

use std::fmt;

/// Represents the operating system where the program is running.
#[derive(Clone, Debug, PartialEq)]
pub enum Platform {
    /// The Windows operating system.
    Windows,
    /// The Linux operating system.
    Linux,
    /// The macOS operating system.
    Mac,

    /// An unknown operating system.
    Unknown(String),
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Windows => write!(f, "Windows"),
            Platform::Linux => write!(f, "Linux"),
            Platform::Mac => write!(f, "MacOS"),
            Platform::Unknown(os) => write!(f, "Unknown: {}", os),
        }
    }
}

impl Platform {
    /// Detects the current platform where the program is running.
    pub fn detect() -> Self {
        let os = std::env::consts::OS;

        match os {
            "windows" => Platform::Windows,
            "linux" => Platform::Linux,
            "macos" => Platform::Mac,
            _ => Platform::Unknown(os.to_string()),
        }
    }

    /// Returns the file name an executable called `name` has on this platform.
    pub fn executable_name(&self, name: &str) -> String {
        match self {
            Platform::Windows => format!("{}.exe", name),
            _ => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executable_names_get_exe_suffix_on_windows_only() {
        assert_eq!(Platform::Windows.executable_name("ffmpeg"), "ffmpeg.exe");
        assert_eq!(Platform::Linux.executable_name("yt-dlp"), "yt-dlp");
        assert_eq!(Platform::Mac.executable_name("yt-dlp"), "yt-dlp");
    }

    #[test]
    fn platforms_display_their_names() {
        assert_eq!(Platform::Mac.to_string(), "MacOS");
        assert_eq!(Platform::Unknown("plan9".to_string()).to_string(), "Unknown: plan9");
    }
}
