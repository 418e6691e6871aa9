use clap::Parser;
use clap::error::ErrorKind;
use colored::Colorize;
use indicatif_log_bridge::LogWrapper;
use log::LevelFilter;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use streamline::console::{self, Console};
use streamline::{DownloadOptions, Mode};

#[derive(Parser, Clone, Debug)]
#[command(
    name = "streamline",
    version,
    about = "YouTube/SoundCloud downloader with bundled yt-dlp and ffmpeg",
    after_help = "Examples:\n  streamline -m https://youtube.com/watch?v=xxxxx\n  streamline -v https://youtu.be/xxxxx --quality 2"
)]
pub struct Cli {
    /// Music/audio mode (MP3 + metadata + cover art)
    #[arg(short = 'm', long = "music", value_name = "URL", conflicts_with_all = ["video", "about"])]
    pub music: Option<String>,

    /// Video mode (quality selection)
    #[arg(short = 'v', long = "video", value_name = "URL", conflicts_with = "about")]
    pub video: Option<String>,

    /// Author information
    #[arg(long = "about", action = clap::ArgAction::SetTrue)]
    pub about: bool,

    /// Directory downloads are written to
    #[arg(long = "output-dir", short)]
    pub output_dir: Option<PathBuf>,

    /// Video quality preset (1-6), skips the menu
    #[arg(long = "quality", short)]
    pub quality: Option<usize>,

    /// Config file to use instead of the default one
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    #[arg(
        long = "verbosity",
        default_value = "error",
        value_parser = clap::builder::PossibleValuesParser::new([
            "info", "debug", "error", "none", "full"
        ])
    )]
    pub verbosity: String,
}

/// What a command line asks for.
enum Invocation {
    Download(Mode, String, Cli),
    About,
    Usage,
    /// `--help` or `--version`, rendered by clap.
    Builtin(clap::Error),
}

/// Sorts a command line into an [`Invocation`]. Anything clap rejects falls back to the usage
/// screen.
fn interpret<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Invocation::Builtin(e);
        }
        Err(_) => return Invocation::Usage,
    };

    if cli.about {
        return Invocation::About;
    }
    match (cli.music.clone(), cli.video.clone()) {
        (Some(url), _) => Invocation::Download(Mode::Music, url, cli),
        (None, Some(url)) => Invocation::Download(Mode::Video, url, cli),
        (None, None) => Invocation::Usage,
    }
}

fn level(verbosity: &str) -> LevelFilter {
    match verbosity {
        "none" => LevelFilter::Off,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "full" => LevelFilter::Trace,
        _ => LevelFilter::Error,
    }
}

fn init_logging(console: &Console, verbosity: &str) {
    let logger = env_logger::Builder::new()
        .filter_level(level(verbosity))
        .parse_default_env()
        .build();
    let max_level = logger.filter();

    if LogWrapper::new(console.multi().clone(), logger).try_init().is_ok() {
        log::set_max_level(max_level);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    console::init_colors();

    let (mode, url, args) = match interpret(std::env::args_os()) {
        Invocation::Download(mode, url, args) => (mode, url, args),
        Invocation::About => {
            println!("{}", console::about());
            return ExitCode::SUCCESS;
        }
        Invocation::Usage => {
            print!("{}", console::usage());
            return ExitCode::SUCCESS;
        }
        Invocation::Builtin(e) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    let console = Console::default();
    init_logging(&console, &args.verbosity);

    let options = DownloadOptions {
        url,
        mode,
        output_dir: args.output_dir,
        quality: args.quality,
        config_path: args.config,
        console: Some(console.clone()),
    };

    match streamline::run(options).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            console.multi().suspend(|| eprintln!("\n{} {}", "✗ Error:".red(), e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn modes_are_exclusive() {
        assert!(Cli::try_parse_from(["streamline", "-m", "a", "-v", "b"]).is_err());
        assert!(Cli::try_parse_from(["streamline", "--about", "-m", "a"]).is_err());
    }

    #[test]
    fn music_mode_with_options() {
        let cli = Cli::try_parse_from([
            "streamline",
            "-m",
            "https://youtu.be/xxxxx",
            "-o",
            "/music",
            "--verbosity",
            "debug",
        ])
        .unwrap();

        assert_eq!(cli.music.as_deref(), Some("https://youtu.be/xxxxx"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/music")));
        assert_eq!(level(&cli.verbosity), LevelFilter::Debug);
    }

    #[test]
    fn no_mode_parses_to_usage() {
        let cli = Cli::try_parse_from(["streamline"]).unwrap();
        assert!(cli.music.is_none() && cli.video.is_none() && !cli.about);
        assert!(matches!(interpret(["streamline"]), Invocation::Usage));
    }

    #[test]
    fn malformed_command_lines_show_usage() {
        let malformed: [&[&str]; 5] = [
            &["streamline", "https://youtu.be/xxxxx"],
            &["streamline", "-m"],
            &["streamline", "-x", "https://youtu.be/xxxxx"],
            &["streamline", "-m", "a", "-v", "b"],
            &["streamline", "-v", "u", "--quality", "best"],
        ];

        for args in malformed {
            assert!(matches!(interpret(args.iter().copied()), Invocation::Usage), "{args:?}");
        }
    }

    #[test]
    fn help_and_version_stay_with_clap() {
        assert!(matches!(interpret(["streamline", "--help"]), Invocation::Builtin(_)));
        assert!(matches!(interpret(["streamline", "--version"]), Invocation::Builtin(_)));
    }

    #[test]
    fn modes_carry_their_url() {
        match interpret(["streamline", "-v", "https://youtu.be/xxxxx", "-q", "2"]) {
            Invocation::Download(mode, url, cli) => {
                assert_eq!(mode, Mode::Video);
                assert_eq!(url, "https://youtu.be/xxxxx");
                assert_eq!(cli.quality, Some(2));
            }
            _ => panic!("expected a download"),
        }
        assert!(matches!(interpret(["streamline", "--about"]), Invocation::About));
    }

    #[test]
    fn unknown_verbosity_is_rejected() {
        assert!(Cli::try_parse_from(["streamline", "-v", "u", "--verbosity", "loud"]).is_err());
    }
}
