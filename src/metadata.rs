use crate::error::{Error, Result};
use lofty::{
    config::WriteOptions,
    file::{AudioFile, TaggedFileExt},
    read_from_path,
    tag::{Accessor, Tag},
};
use log::{debug, warn};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where yt-dlp writes the info JSON of the file at `media`.
pub fn info_json_path(media: &Path) -> PathBuf {
    media.with_extension("info.json")
}

/// The tags music mode makes sure every file carries.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track: u32,
}

fn text<'a>(info: &'a Value, key: &str) -> Option<&'a str> {
    info.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl TrackInfo {
    /// Prefers music-specific fields (`track`, `artist`, `album`) over the generic video ones.
    pub fn from_info(info: &Value, default_album: &str) -> Self {
        let title = text(info, "track")
            .or_else(|| text(info, "title"))
            .unwrap_or("Unknown Title");
        let artist = text(info, "artist")
            .or_else(|| text(info, "uploader"))
            .unwrap_or("Unknown Artist");
        let album = text(info, "album").unwrap_or(default_album);
        let track = info
            .get("track_number")
            .and_then(|number| {
                number
                    .as_u64()
                    .or_else(|| number.as_str().and_then(|s| s.trim().parse().ok()))
            })
            .filter(|number| *number > 0)
            .unwrap_or(1);

        Self {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            track: u32::try_from(track).unwrap_or(1),
        }
    }

    pub fn from_info_json(path: &Path, default_album: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let info: Value = serde_json::from_str(&content)?;

        Ok(Self::from_info(&info, default_album))
    }

    /// Sets every tag that is still empty. Returns whether anything changed.
    pub fn apply(&self, tag: &mut Tag) -> bool {
        let mut changed = false;

        if tag.title().is_none_or(|title| title.trim().is_empty()) {
            tag.set_title(self.title.clone());
            changed = true;
        }
        if tag.artist().is_none_or(|artist| artist.trim().is_empty()) {
            tag.set_artist(self.artist.clone());
            changed = true;
        }
        if tag.album().is_none_or(|album| album.trim().is_empty()) {
            tag.set_album(self.album.clone());
            changed = true;
        }
        if tag.track().is_none() {
            tag.set_track(self.track);
            changed = true;
        }

        changed
    }

    /// Fills the empty tags of the audio file at `path`, written as ID3v2.3.
    pub fn fill_missing(&self, path: &Path) -> Result<()> {
        let mut tagged_file = read_from_path(path)?;

        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            warn!("No tags found, creating a new tag of type `{tag_type:?}`");
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .tag_mut(tag_type)
            .ok_or_else(|| Error::Path(path.to_path_buf()))?;

        if !self.apply(tag) {
            debug!("Tags of {} are complete", path.display());
            return Ok(());
        }

        let write_options = WriteOptions::new()
            .use_id3v23(true)
            .remove_others(false)
            .respect_read_only(false);
        tagged_file.save_to_path(path, write_options)?;

        Ok(())
    }
}
