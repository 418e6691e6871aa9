//! Music mode: best audio as MP3 with metadata, chapters and cover art.

use crate::console::Status;
use crate::download::{DownloadReport, Session};
use crate::error::{Error, Result};
use crate::metadata;
use crate::utils::file_system;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// yt-dlp arguments for downloading `url` as MP3.
pub fn download_args(
    url: &str,
    template: &str,
    output_dir: &Path,
    write_info: bool,
) -> Vec<String> {
    let mut args: Vec<String> = [
        url,
        "-f",
        "bestaudio",
        "--extract-audio",
        "--audio-format",
        "mp3",
        "--convert-thumbnails",
        "jpg",
        "--embed-metadata",
        "--embed-chapters",
        "--add-metadata",
        "-o",
        template,
        "--write-thumbnail",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect();

    if write_info {
        args.push("--write-info-json".to_string());
    }
    args.push("-P".to_string());
    args.push(output_dir.to_string_lossy().into_owned());

    args
}

/// ffmpeg arguments that copy `mp3` into `output` with `cover` attached as front cover.
pub fn embed_cover_args(mp3: &Path, cover: &Path, output: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        mp3.to_string_lossy().into_owned(),
        "-i".to_string(),
        cover.to_string_lossy().into_owned(),
        "-map".to_string(),
        "0:0".to_string(),
        "-map".to_string(),
        "1:0".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        "-id3v2_version".to_string(),
        "3".to_string(),
        "-metadata:s:v".to_string(),
        "title=Album cover".to_string(),
        "-metadata:s:v".to_string(),
        "comment=Cover (front)".to_string(),
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "mp3".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// ffmpeg arguments that crop `image` to a centred square of `size` pixels.
pub fn square_cover_args(image: &Path, size: u32, output: &Path) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        image.to_string_lossy().into_owned(),
        "-vf".to_string(),
        format!(r"crop=min(iw\,ih):min(iw\,ih),scale={size}:{size}"),
        "-frames:v".to_string(),
        "1".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// Picks the MP3 yt-dlp produced.
fn locate_mp3(report: &DownloadReport, output_dir: &Path) -> Result<PathBuf> {
    if let Some(path) = report.final_file("mp3").filter(|path| path.is_file()) {
        return Ok(path);
    }
    // the extractor keeps the stem of the downloaded stream
    if let Some(path) = report
        .destinations
        .iter()
        .rev()
        .chain(report.already_downloaded.iter())
        .map(|path| path.with_extension("mp3"))
        .find(|path| path.is_file())
    {
        return Ok(path);
    }

    file_system::newest_with_extension(output_dir, "mp3")?
        .ok_or_else(|| Error::MissingFile("MP3".to_string()))
}

/// The thumbnail written next to `mp3`, or failing that the newest JPEG that appeared in
/// `output_dir` during the download. Anything listed in `existing` predates it and is left alone.
fn locate_thumbnail(
    mp3: &Path,
    output_dir: &Path,
    existing: &[PathBuf],
) -> Result<Option<PathBuf>> {
    let sibling = mp3.with_extension("jpg");
    if sibling.is_file() {
        return Ok(Some(sibling));
    }

    let appeared = file_system::files_with_extension(output_dir, "jpg")?
        .into_iter()
        .filter(|path| !existing.contains(path));
    Ok(file_system::newest(appeared))
}

impl Session {
    /// Downloads `url` as an MP3 with embedded cover art.
    pub async fn download_audio(&self, url: &str) -> Result<PathBuf> {
        self.console.banner();

        let spinner = self.console.spinner("Fetching video information...");
        match self.probe_title(url).await {
            Ok(title) => {
                spinner.stop(true);
                if !title.is_empty() {
                    self.console.status(Status::Info, format!("Title: {}", title));
                }
            }
            Err(e) => {
                spinner.stop(false);
                log::warn!("Could not fetch video information: {}", e);
            }
        }

        self.console.status(Status::Info, "Starting audio download...");
        self.console.println("");

        let output_dir = self.output_dir();
        let existing_images = file_system::files_with_extension(output_dir, "jpg")?;
        let args = download_args(
            url,
            &self.config.output_template,
            output_dir,
            self.config.fill_tags,
        );
        let report = self.download("Downloading audio", args).await?;

        let mp3 = locate_mp3(&report, output_dir)?;
        log::debug!("Audio file: {}", mp3.display());

        if self.config.embed_cover {
            if let Some(thumbnail) = locate_thumbnail(&mp3, output_dir, &existing_images)? {
                self.embed_cover(&mp3, &thumbnail).await?;
                file_system::remove_if_exists(&thumbnail).await?;
            }
        } else {
            file_system::remove_if_exists(mp3.with_extension("jpg")).await?;
        }

        if self.config.fill_tags {
            self.fill_tags(&mp3).await;
        }

        self.console.println("");
        self.console.status(
            Status::Success,
            format!("✨ Successfully downloaded: {}", mp3.display().to_string().bold()),
        );

        Ok(mp3)
    }

    async fn embed_cover(&self, mp3: &Path, thumbnail: &Path) -> Result<()> {
        let cover = if self.config.square_cover {
            self.square_cover(thumbnail).await
        } else {
            None
        };

        let spinner = self.console.spinner("Embedding thumbnail into audio file...");
        let temp = file_system::temp_sibling(mp3);
        let args = embed_cover_args(mp3, cover.as_deref().unwrap_or(thumbnail), &temp);
        let result = self.ffmpeg(args).execute().await;
        spinner.stop(result.is_ok());

        if let Some(cover) = &cover {
            file_system::remove_if_exists(cover).await?;
        }
        if let Err(e) = result {
            file_system::remove_if_exists(&temp).await?;
            return Err(e);
        }

        tokio::fs::rename(&temp, mp3).await?;
        Ok(())
    }

    /// Crops the thumbnail into a temporary square cover; falls back to the original on failure.
    async fn square_cover(&self, thumbnail: &Path) -> Option<PathBuf> {
        let cover = self.toolchain.root().join("cover.jpg");
        let args = square_cover_args(thumbnail, self.config.cover_size, &cover);

        match self.ffmpeg(args).execute().await {
            Ok(_) => Some(cover),
            Err(e) => {
                log::warn!("Could not crop the cover, embedding it as is: {}", e);
                None
            }
        }
    }

    async fn fill_tags(&self, mp3: &Path) {
        let info = metadata::info_json_path(mp3);
        if !info.is_file() {
            log::debug!("No info JSON at {}, leaving tags as they are", info.display());
            return;
        }

        let result = metadata::TrackInfo::from_info_json(&info, &self.config.default_album)
            .and_then(|track| track.fill_missing(mp3));
        if let Err(e) = result {
            self.console
                .status(Status::Warning, format!("Could not complete the tags: {}", e));
        }
        if let Err(e) = file_system::remove_if_exists(&info).await {
            log::warn!("Could not remove {}: {}", info.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_args_follow_the_music_recipe() {
        let args = download_args(
            "https://youtu.be/xxxxx",
            "%(title)s.%(ext)s",
            Path::new("/music"),
            false,
        );

        assert_eq!(args[0], "https://youtu.be/xxxxx");
        assert_eq!(&args[1..3], &["-f", "bestaudio"]);
        assert!(args.windows(2).any(|pair| pair == ["--audio-format", "mp3"]));
        assert!(args.windows(2).any(|pair| pair == ["--convert-thumbnails", "jpg"]));
        assert!(args.windows(2).any(|pair| pair == ["-o", "%(title)s.%(ext)s"]));
        assert!(args.contains(&"--write-thumbnail".to_string()));
        assert!(!args.contains(&"--write-info-json".to_string()));
        assert_eq!(&args[args.len() - 2..], &["-P", "/music"]);
    }

    #[test]
    fn download_args_request_info_json_for_tagging() {
        let args = download_args("u", "t", Path::new("."), true);
        assert!(args.contains(&"--write-info-json".to_string()));
    }

    #[test]
    fn embed_args_write_id3v23_into_the_temp_file() {
        let args = embed_cover_args(
            Path::new("Song.mp3"),
            Path::new("Song.jpg"),
            Path::new("Song.mp3.temp"),
        );

        assert_eq!(&args[..4], &["-i", "Song.mp3", "-i", "Song.jpg"]);
        assert!(args.windows(2).any(|pair| pair == ["-id3v2_version", "3"]));
        assert!(args.windows(2).any(|pair| pair == ["-metadata:s:v", "comment=Cover (front)"]));
        assert_eq!(&args[args.len() - 3..], &["-f", "mp3", "Song.mp3.temp"]);
    }

    #[test]
    fn square_cover_filter_escapes_commas() {
        let args = square_cover_args(Path::new("in.jpg"), 500, Path::new("out.jpg"));
        assert!(args.contains(&r"crop=min(iw\,ih):min(iw\,ih),scale=500:500".to_string()));
    }

    #[test]
    fn mp3_is_found_from_the_report_or_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mp3 = dir.path().join("Some Song.mp3");
        std::fs::write(&mp3, b"ID3").unwrap();

        let report = DownloadReport {
            audio: Some(mp3.clone()),
            ..Default::default()
        };
        assert_eq!(locate_mp3(&report, dir.path()).unwrap(), mp3);

        let report = DownloadReport {
            destinations: vec![dir.path().join("Some Song.webm")],
            ..Default::default()
        };
        assert_eq!(locate_mp3(&report, dir.path()).unwrap(), mp3);

        assert_eq!(locate_mp3(&DownloadReport::default(), dir.path()).unwrap(), mp3);
    }

    #[test]
    fn missing_mp3_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_mp3(&DownloadReport::default(), dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "No MP3 file found");
    }

    #[test]
    fn thumbnail_prefers_the_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let mp3 = dir.path().join("Song.mp3");
        std::fs::write(dir.path().join("Other.jpg"), b"x").unwrap();
        assert_eq!(
            locate_thumbnail(&mp3, dir.path(), &[]).unwrap(),
            Some(dir.path().join("Other.jpg"))
        );

        std::fs::write(dir.path().join("Song.jpg"), b"x").unwrap();
        assert_eq!(
            locate_thumbnail(&mp3, dir.path(), &[]).unwrap(),
            Some(dir.path().join("Song.jpg"))
        );
    }

    #[test]
    fn images_from_before_the_download_are_never_the_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let holiday = dir.path().join("holiday.jpg");
        std::fs::write(&holiday, b"x").unwrap();

        let mp3 = dir.path().join("Song.mp3");
        let existing = vec![holiday];
        assert_eq!(locate_thumbnail(&mp3, dir.path(), &existing).unwrap(), None);
    }
}

#[cfg(all(test, unix))]
mod session_tests {
    use crate::config::Config;
    use crate::testing::Workspace;

    const EXTRACTING_YTDLP: &str = r#"
case "$1" in
  --skip-download) echo "Song"; exit 0 ;;
esac
printf 'ID3 audio' > '{out}/Song.mp3'
printf 'thumbnail' > '{out}/Song.jpg'
echo "[download] Destination: {out}/Song.webm"
echo "[download] 100% of 3.47MiB in 00:00"
echo "[ExtractAudio] Destination: {out}/Song.mp3"
"#;

    /// Copies the audio input into the output file with a marker, like a real embed would.
    const EMBEDDING_FFMPEG: &str = r#"
for last; do :; done
{ cat "$2"; printf ' +cover'; } > "$last"
"#;

    fn plain() -> Config {
        Config {
            fill_tags: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn cover_is_embedded_through_a_temp_file() {
        let workspace = Workspace::new();
        let session = workspace
            .session(EXTRACTING_YTDLP, EMBEDDING_FFMPEG, plain(), &[])
            .await;

        let mp3 = session.download_audio("https://youtu.be/xxxxx").await.unwrap();

        assert_eq!(mp3, workspace.path("Song.mp3"));
        assert_eq!(std::fs::read_to_string(&mp3).unwrap(), "ID3 audio +cover");
        assert!(!workspace.path("Song.mp3.temp").exists());
        assert!(!workspace.path("Song.jpg").exists());
    }

    #[tokio::test]
    async fn failed_embedding_keeps_the_audio_and_drops_the_temp_file() {
        let workspace = Workspace::new();
        let failing = "for last; do :; done
printf partial > \"$last\"
echo broken >&2
exit 1";
        let session = workspace
            .session(EXTRACTING_YTDLP, failing, plain(), &[])
            .await;

        let result = session.download_audio("https://youtu.be/xxxxx").await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(workspace.path("Song.mp3")).unwrap(), "ID3 audio");
        assert!(!workspace.path("Song.mp3.temp").exists());
    }

    #[tokio::test]
    async fn unrelated_images_survive_a_download() {
        let ytdlp = r#"
case "$1" in
  --skip-download) echo "Song"; exit 0 ;;
esac
printf 'ID3 audio' > '{out}/Song.mp3'
echo "[ExtractAudio] Destination: {out}/Song.mp3"
"#;
        for embed_cover in [false, true] {
            let workspace = Workspace::new();
            std::fs::write(workspace.path("holiday.jpg"), b"my picture").unwrap();
            let config = Config {
                embed_cover,
                ..plain()
            };
            let session = workspace.session(ytdlp, EMBEDDING_FFMPEG, config, &[]).await;

            let mp3 = session.download_audio("https://youtu.be/xxxxx").await.unwrap();

            assert!(workspace.path("holiday.jpg").exists(), "embed_cover = {embed_cover}");
            assert_eq!(std::fs::read_to_string(&mp3).unwrap(), "ID3 audio");
        }
    }

    #[tokio::test]
    async fn thumbnail_is_removed_without_embedding_when_covers_are_off() {
        let workspace = Workspace::new();
        let config = Config {
            embed_cover: false,
            ..plain()
        };
        let session = workspace
            .session(EXTRACTING_YTDLP, "exit 1", config, &[])
            .await;

        let mp3 = session.download_audio("https://youtu.be/xxxxx").await.unwrap();

        assert_eq!(std::fs::read_to_string(&mp3).unwrap(), "ID3 audio");
        assert!(!workspace.path("Song.jpg").exists());
    }

    #[tokio::test]
    async fn info_json_is_removed_after_tagging() {
        let workspace = Workspace::new();
        let ytdlp = format!(
            "{}\nprintf '{{\"title\": \"Song\"}}' > '{{out}}/Song.info.json'",
            EXTRACTING_YTDLP
        );
        let session = workspace
            .session(&ytdlp, EMBEDDING_FFMPEG, Config::default(), &[])
            .await;

        session.download_audio("https://youtu.be/xxxxx").await.unwrap();

        assert!(workspace.path("Song.mp3").exists());
        assert!(!workspace.path("Song.info.json").exists());
    }
}
