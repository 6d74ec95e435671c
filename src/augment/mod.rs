//! Filename-based augmentation.
//!
//! Tags are often missing from freshly downloaded files, but the file and
//! folder names usually carry the same information. [`FilenameAugmenter`]
//! fills the gaps before identification:
//!
//! - `01 - Title.flac`, `01 Title.flac`, `01. Title.flac`
//! - `Artist - 01 - Title.flac`
//! - the parent folder name as the album title, applied batch-wide
//!
//! Existing tag values are never overwritten.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::trace;

use crate::identification::local::{LocalAlbumRelease, LocalTrack};
use crate::identification::traits::Augmenter;
use crate::metadata::{clean_track_title, is_blank};

/// Augmentation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AugmentError {
    #[error("Path has no usable file name: {0}")]
    InvalidPath(String),

    #[error("Augmentation failed: {0}")]
    Failed(String),
}

/// `Artist - 01 - Title`
static ARTIST_NUMBER_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<artist>.+?)\s+-\s+(?P<number>\d{1,3})\s+-\s+(?P<title>.+)$").expect("valid regex")
});

/// `01 - Title`, `01. Title`, `01 Title`, `1-01 Title`
static NUMBER_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{1,2}-)?(?P<number>\d{1,3})(?:\s*[-.]\s*|\s+)(?P<title>.+)$").expect("valid regex")
});

/// What a file name says about its track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameInfo {
    pub artist: Option<String>,
    pub track_number: Option<u32>,
    pub title: Option<String>,
}

/// Parse a file stem into artist, track number and title.
///
/// A stem matching none of the patterns is taken as the title.
pub fn parse_file_stem(stem: &str) -> FilenameInfo {
    let stem = stem.replace('_', " ");
    let stem = stem.trim();
    if stem.is_empty() {
        return FilenameInfo::default();
    }

    if let Some(caps) = ARTIST_NUMBER_TITLE.captures(stem) {
        return FilenameInfo {
            artist: Some(caps["artist"].trim().to_string()),
            track_number: caps["number"].parse().ok(),
            title: Some(caps["title"].trim().to_string()),
        };
    }

    if let Some(caps) = NUMBER_TITLE.captures(stem) {
        return FilenameInfo {
            artist: None,
            track_number: caps["number"].parse().ok(),
            title: Some(caps["title"].trim().to_string()),
        };
    }

    FilenameInfo {
        title: Some(stem.to_string()),
        ..Default::default()
    }
}

/// Folder name to use as an album title, if it looks like one.
fn folder_album_title(path: &Path) -> Option<String> {
    let name = path.parent()?.file_name()?.to_str()?.trim();
    // disc folders say nothing about the album
    let lower = name.to_lowercase();
    if name.is_empty() || lower.starts_with("cd") || lower.starts_with("disc") {
        return None;
    }
    Some(name.to_string())
}

/// Fills missing titles, track numbers, artists and album titles from
/// file and folder names.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenameAugmenter;

impl FilenameAugmenter {
    pub fn new() -> Self {
        Self
    }
}

impl Augmenter for FilenameAugmenter {
    fn augment_release(&self, release: &mut LocalAlbumRelease) -> Result<(), AugmentError> {
        let untitled = release.local_tracks.iter().all(|t| is_blank(t.album_title()));
        if !untitled {
            return Ok(());
        }

        let Some(album) = release.local_tracks.first().and_then(|t| folder_album_title(&t.path)) else {
            return Ok(());
        };
        // only when every file sits in the same folder
        let parent = release.local_tracks[0].path.parent();
        if release.local_tracks.iter().any(|t| t.path.parent() != parent) {
            return Ok(());
        }

        trace!(album = %album, tracks = release.track_count(), "Album title from folder name");
        for track in &mut release.local_tracks {
            track.file_track_info.album_title = Some(album.clone());
        }
        Ok(())
    }

    fn augment_track(&self, track: &mut LocalTrack, _is_extra: bool) -> Result<(), AugmentError> {
        let stem = track
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AugmentError::InvalidPath(track.path.display().to_string()))?;
        let parsed = parse_file_stem(stem);
        let info = &mut track.file_track_info;

        if is_blank(info.title.as_deref())
            && let Some(title) = parsed.title
        {
            trace!(path = %track.path.display(), title = %title, "Title from file name");
            info.title = Some(title);
        }
        if info.track_number() == 0
            && let Some(number) = parsed.track_number
        {
            info.track_numbers = vec![number];
        }
        if is_blank(info.artist_title.as_deref())
            && let Some(artist) = parsed.artist
        {
            info.artist_title = Some(artist);
        }

        info.clean_title = info.title.as_deref().map(clean_track_title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ParsedTrackInfo;
    use std::path::PathBuf;

    fn untagged(path: &str) -> LocalTrack {
        LocalTrack::new(path, ParsedTrackInfo::default())
    }

    #[test]
    fn test_parse_number_dash_title() {
        let info = parse_file_stem("03 - Natty Dread");
        assert_eq!(info.track_number, Some(3));
        assert_eq!(info.title.as_deref(), Some("Natty Dread"));
        assert!(info.artist.is_none());
    }

    #[test]
    fn test_parse_number_space_title() {
        let info = parse_file_stem("07 Rebel Music");
        assert_eq!(info.track_number, Some(7));
        assert_eq!(info.title.as_deref(), Some("Rebel Music"));
    }

    #[test]
    fn test_parse_number_dot_title() {
        let info = parse_file_stem("12. So Jah Seh");
        assert_eq!(info.track_number, Some(12));
        assert_eq!(info.title.as_deref(), Some("So Jah Seh"));
    }

    #[test]
    fn test_parse_artist_number_title() {
        let info = parse_file_stem("Bob Marley - 02 - Them Belly Full");
        assert_eq!(info.artist.as_deref(), Some("Bob Marley"));
        assert_eq!(info.track_number, Some(2));
        assert_eq!(info.title.as_deref(), Some("Them Belly Full"));
    }

    #[test]
    fn test_parse_underscores() {
        let info = parse_file_stem("05_Talkin_Blues");
        assert_eq!(info.track_number, Some(5));
        assert_eq!(info.title.as_deref(), Some("Talkin Blues"));
    }

    #[test]
    fn test_parse_plain_title() {
        let info = parse_file_stem("Lively Up Yourself");
        assert_eq!(info.track_number, None);
        assert_eq!(info.title.as_deref(), Some("Lively Up Yourself"));
    }

    #[test]
    fn test_augment_track_fills_missing_fields() {
        let mut track = untagged("/music/Natty Dread/Bob Marley - 01 - Lively Up Yourself (Remastered).mp3");

        FilenameAugmenter.augment_track(&mut track, false).unwrap();

        let info = &track.file_track_info;
        assert_eq!(info.title.as_deref(), Some("Lively Up Yourself (Remastered)"));
        assert_eq!(info.clean_title.as_deref(), Some("Lively Up Yourself"));
        assert_eq!(info.track_numbers, vec![1]);
        assert_eq!(info.artist_title.as_deref(), Some("Bob Marley"));
    }

    #[test]
    fn test_augment_track_keeps_existing_tags() {
        let mut track = untagged("/music/x/04 - Wrong Title.mp3");
        track.file_track_info.set_title("Revolution");
        track.file_track_info.track_numbers = vec![9];

        FilenameAugmenter.augment_track(&mut track, true).unwrap();

        assert_eq!(track.file_track_info.title.as_deref(), Some("Revolution"));
        assert_eq!(track.file_track_info.track_numbers, vec![9]);
    }

    #[test]
    fn test_augment_track_without_file_name_fails() {
        let mut track = LocalTrack::new(PathBuf::from("/"), ParsedTrackInfo::default());
        let result = FilenameAugmenter.augment_track(&mut track, false);
        assert!(matches!(result, Err(AugmentError::InvalidPath(_))));
    }

    #[test]
    fn test_augment_release_uses_folder_name() {
        let mut release = LocalAlbumRelease::new(vec![
            untagged("/music/Natty Dread/01.mp3"),
            untagged("/music/Natty Dread/02.mp3"),
        ]);

        FilenameAugmenter.augment_release(&mut release).unwrap();

        assert!(release.local_tracks.iter().all(|t| t.album_title() == Some("Natty Dread")));
    }

    #[test]
    fn test_augment_release_keeps_tagged_album() {
        let mut tagged = untagged("/music/folder/01.mp3");
        tagged.file_track_info.album_title = Some("Exodus".to_string());
        let mut release = LocalAlbumRelease::new(vec![tagged, untagged("/music/folder/02.mp3")]);

        FilenameAugmenter.augment_release(&mut release).unwrap();

        assert_eq!(release.local_tracks[0].album_title(), Some("Exodus"));
        assert_eq!(release.local_tracks[1].album_title(), None);
    }

    #[test]
    fn test_augment_release_skips_disc_folders() {
        let mut release = LocalAlbumRelease::new(vec![untagged("/music/Uprising/CD1/01.mp3")]);

        FilenameAugmenter.augment_release(&mut release).unwrap();

        assert_eq!(release.local_tracks[0].album_title(), None);
    }
}
