//! Audio file tag reading.
//!
//! Uses the lofty crate for format-independent metadata access.
//! Supports MP3, FLAC, OGG, M4A, and WAV files.
//!
//! # Features
//! - Parse everything identification needs into [`ParsedTrackInfo`]
//! - MusicBrainz identifiers (artist, release group, release, recording, track)
//! - Release country, label, catalog number and album disambiguation
//! - Title cleanup for comparison ([`clean_track_title`])

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::identification::traits::TagReader;

/// Everything identification knows about a file from its tags.
///
/// Missing text fields are `None`; missing numbers are zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedTrackInfo {
    pub title: Option<String>,
    /// Title with featuring credits and edition annotations removed
    pub clean_title: Option<String>,
    pub artist_title: Option<String>,
    pub album_title: Option<String>,
    #[serde(rename = "artistMBId")]
    pub artist_mbid: Option<String>,
    /// Release group id
    #[serde(rename = "albumMBId")]
    pub album_mbid: Option<String>,
    #[serde(rename = "releaseMBId")]
    pub release_mbid: Option<String>,
    #[serde(rename = "recordingMBId")]
    pub recording_mbid: Option<String>,
    #[serde(rename = "trackMBId")]
    pub track_mbid: Option<String>,
    /// Track number first; some taggers store extra positions after it
    pub track_numbers: Vec<u32>,
    pub disc_number: u32,
    pub disc_count: u32,
    pub country: Option<String>,
    pub year: u32,
    pub label: Option<String>,
    pub catalog_number: Option<String>,
    pub disambiguation: Option<String>,
    pub duration: Duration,
}

impl ParsedTrackInfo {
    /// First track number, or 0 when untagged.
    pub fn track_number(&self) -> u32 {
        self.track_numbers.first().copied().unwrap_or(0)
    }

    /// Set the title and refresh the cleaned title alongside it.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.clean_title = Some(clean_track_title(&title));
        self.title = Some(title);
    }
}

/// True when an optional tag value is absent or whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

static FEATURING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\[|\()*\b((featuring|feat.|feat|ft|ft.)\s{1}){1}\s*.*(\]|\))*")
        .expect("valid regex")
});

static EDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:\(|\[)(?:[^\(\[]*)(?:version|limited|deluxe|single|clean|album|special|bonus|promo|remastered)(?:[^\)\]]*)(?:\)|\])",
    )
    .expect("valid regex")
});

/// Strip featuring credits and bracketed edition annotations from a title.
///
/// `"Song (feat. Someone)"` and `"Song [Remastered 2011]"` both become
/// `"Song"`.
pub fn clean_track_title(title: &str) -> String {
    let without_featuring = FEATURING.replace_all(title, "");
    let without_edition = EDITION.replace_all(&without_featuring, "");
    without_edition.trim().to_string()
}

/// Reads tags with lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    pub fn new() -> Self {
        Self
    }
}

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<ParsedTrackInfo> {
        read(path)
    }
}

/// Read and parse the tags of one file.
pub fn read(path: &Path) -> Result<ParsedTrackInfo> {
    // Probe the file to determine format and read tags
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("failed to open file for probing: {}", e)))?
        .read()
        .map_err(|e| Error::metadata(path, format!("failed to read file metadata: {}", e)))?;

    let duration = tagged_file.properties().duration();

    // Get the primary tag, or fall back to the first available tag
    let Some(tag) = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
    else {
        tracing::debug!("No tags in {:?}", path);
        return Ok(ParsedTrackInfo {
            duration,
            ..Default::default()
        });
    };

    let mut info = parse_tag(tag);
    info.duration = duration;
    Ok(info)
}

fn parse_tag(tag: &Tag) -> ParsedTrackInfo {
    let text = |key: ItemKey| -> Option<String> {
        tag.get_string(&key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let custom = |name: &str| text(ItemKey::Unknown(name.to_string()));

    let title = tag.title().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let clean_title = title.as_deref().map(clean_track_title);

    ParsedTrackInfo {
        clean_title,
        title,
        artist_title: tag.artist().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        album_title: tag.album().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        artist_mbid: text(ItemKey::MusicBrainzArtistId),
        album_mbid: text(ItemKey::MusicBrainzReleaseGroupId),
        release_mbid: text(ItemKey::MusicBrainzReleaseId),
        recording_mbid: text(ItemKey::MusicBrainzRecordingId),
        track_mbid: text(ItemKey::MusicBrainzTrackId),
        track_numbers: tag.track().into_iter().collect(),
        disc_number: tag.disk().unwrap_or(0),
        disc_count: tag.disk_total().unwrap_or(0),
        country: custom("RELEASECOUNTRY").or_else(|| custom("MusicBrainz Album Release Country")),
        year: tag.year().unwrap_or(0),
        label: text(ItemKey::Label).or_else(|| text(ItemKey::Publisher)),
        catalog_number: text(ItemKey::CatalogNumber),
        disambiguation: custom("MUSICBRAINZ_ALBUMCOMMENT")
            .or_else(|| custom("MusicBrainz Album Comment")),
        duration: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::tag::TagType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_non_audio_file_returns_error() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "This is just some text, not music.").expect("Failed to write to temp file");

        let result = read(file.path());

        assert!(matches!(result, Err(Error::Metadata { .. })));
    }

    #[test]
    fn test_read_non_existent_file_returns_error() {
        let result = LoftyTagReader::new().read_tags(Path::new("non_existent_file.mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_tag_fields() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.set_title("Crazy Baldhead (Remastered)".to_string());
        tag.set_artist("Bob Marley & The Wailers".to_string());
        tag.set_album("Rastaman Vibration".to_string());
        tag.set_track(3);
        tag.set_disk(1);
        tag.set_disk_total(2);
        tag.insert_text(ItemKey::MusicBrainzReleaseId, "release-1".to_string());
        tag.insert_text(ItemKey::MusicBrainzRecordingId, " ".to_string());

        let info = parse_tag(&tag);

        assert_eq!(info.title.as_deref(), Some("Crazy Baldhead (Remastered)"));
        assert_eq!(info.clean_title.as_deref(), Some("Crazy Baldhead"));
        assert_eq!(info.album_title.as_deref(), Some("Rastaman Vibration"));
        assert_eq!(info.track_numbers, vec![3]);
        assert_eq!(info.disc_number, 1);
        assert_eq!(info.disc_count, 2);
        assert_eq!(info.release_mbid.as_deref(), Some("release-1"));
        assert!(info.recording_mbid.is_none());
        assert!(info.label.is_none());
    }

    #[test]
    fn test_clean_track_title_featuring() {
        assert_eq!(clean_track_title("Song Name (feat. Other Artist)"), "Song Name");
        assert_eq!(clean_track_title("Song Name ft. Other Artist"), "Song Name");
        assert_eq!(clean_track_title("Song Name [featuring Someone]"), "Song Name");
    }

    #[test]
    fn test_clean_track_title_editions() {
        assert_eq!(clean_track_title("Song (Album Version)"), "Song");
        assert_eq!(clean_track_title("Song [Remastered 2011]"), "Song");
        assert_eq!(clean_track_title("Song (Deluxe Edition)"), "Song");
        assert_eq!(clean_track_title("Song (Live)"), "Song (Live)");
    }

    #[test]
    fn test_clean_track_title_keeps_plain_titles() {
        assert_eq!(clean_track_title("  Positive Vibration "), "Positive Vibration");
        assert_eq!(clean_track_title("Aftermath"), "Aftermath");
    }

    #[test]
    fn test_set_title_refreshes_clean_title() {
        let mut info = ParsedTrackInfo::default();
        info.set_title("Song (Single Version)");
        assert_eq!(info.clean_title.as_deref(), Some("Song"));
        assert_eq!(info.track_number(), 0);
    }

    #[test]
    fn test_serde_uses_mbid_names() {
        let info = ParsedTrackInfo {
            release_mbid: Some("abc".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"releaseMBId\":\"abc\""));
        assert!(json.contains("\"trackNumbers\":[]"));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("  ")));
        assert!(!is_blank(Some("x")));
    }
}
