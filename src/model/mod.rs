//! Catalog reference data.
//!
//! Defines the entities a catalog mirror or remote metadata source hands
//! us: [`Artist`], [`Album`], [`AlbumRelease`], [`Track`] and the
//! [`TrackFile`]s already on disk for an album. Identification only ever
//! reads these; ownership lives with whoever fetched them.
//!
//! Everything is serde-friendly so a catalog snapshot can be loaded from
//! JSON (see [`crate::catalog::MemoryCatalog`]).

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Name and foreign identifier shared by an artist and its credits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtistMetadata {
    pub id: i64,
    /// Catalog (MusicBrainz) artist id
    pub foreign_artist_id: String,
    pub name: String,
}

/// Which album types and statuses the library tracks for an artist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataProfile {
    pub id: i64,
    pub name: String,
    pub primary_album_types: Vec<String>,
    pub secondary_album_types: Vec<String>,
    pub release_statuses: Vec<String>,
}

/// An artist known to the library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Artist {
    pub id: i64,
    pub artist_metadata_id: i64,
    pub metadata: ArtistMetadata,
    pub metadata_profile: Option<MetadataProfile>,
}

impl Artist {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

impl fmt::Display for Artist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.metadata.foreign_artist_id, self.metadata.name)
    }
}

/// A release group: the abstract album independent of pressings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Album {
    pub id: i64,
    pub artist_metadata_id: i64,
    pub foreign_album_id: String,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub artist_metadata: ArtistMetadata,
}

impl Album {
    pub fn year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}

/// One disc (or side, or file set) of a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Medium {
    pub number: u32,
    pub name: String,
    /// "CD", "Digital Media", "12\" Vinyl", ... or "Unknown"
    pub format: String,
}

/// A concrete pressing of an album, with its own track list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlbumRelease {
    pub id: i64,
    pub album_id: i64,
    pub foreign_release_id: String,
    /// Ids this release was previously known by (merged releases)
    pub old_foreign_release_ids: Vec<String>,
    pub title: String,
    pub status: String,
    pub disambiguation: String,
    pub release_date: Option<NaiveDate>,
    /// Country names, e.g. "United States", "Europe", "[Worldwide]"
    pub country: Vec<String>,
    pub label: Vec<String>,
    pub media: Vec<Medium>,
    pub track_count: usize,
    pub album: Album,
    /// May be empty until populated from the catalog mirror
    pub tracks: Vec<Track>,
}

impl AlbumRelease {
    pub fn year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }

    /// True if `id` is this release's current or any former foreign id.
    pub fn has_foreign_id(&self, id: &str) -> bool {
        self.foreign_release_id == id || self.old_foreign_release_ids.iter().any(|x| x == id)
    }
}

impl fmt::Display for AlbumRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.foreign_release_id, self.title)
    }
}

/// A track on a release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Track {
    pub id: i64,
    pub album_release_id: i64,
    pub foreign_track_id: String,
    pub foreign_recording_id: String,
    pub old_foreign_recording_ids: Vec<String>,
    pub title: String,
    /// Position on its medium, starting at 1
    pub absolute_track_number: u32,
    pub medium_number: u32,
    /// Length in milliseconds, 0 if unknown
    pub duration: u64,
    pub artist_metadata: ArtistMetadata,
}

impl Track {
    /// True if `id` is this track's current or any former recording id.
    pub fn has_recording_id(&self, id: &str) -> bool {
        self.foreign_recording_id == id || self.old_foreign_recording_ids.iter().any(|x| x == id)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}][{}-{}][{}]",
            self.foreign_track_id, self.medium_number, self.absolute_track_number, self.title
        )
    }
}

/// A file the library already holds for an album.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackFile {
    pub id: i64,
    pub album_id: i64,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_matches_old_ids() {
        let release = AlbumRelease {
            foreign_release_id: "new".to_string(),
            old_foreign_release_ids: vec!["old".to_string()],
            ..Default::default()
        };
        assert!(release.has_foreign_id("new"));
        assert!(release.has_foreign_id("old"));
        assert!(!release.has_foreign_id("other"));
    }

    #[test]
    fn test_release_deserializes_with_missing_fields() {
        let json = r#"{"id": 4, "foreignReleaseId": "abc", "releaseDate": "1976-04-30"}"#;
        let release: AlbumRelease = serde_json::from_str(json).unwrap();
        assert_eq!(release.id, 4);
        assert_eq!(release.year(), Some(1976));
        assert!(release.tracks.is_empty());
        assert!(release.album.release_date.is_none());
    }
}
