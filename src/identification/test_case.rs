//! Diagnostic test-case record.
//!
//! Every `identify` call logs one of these at debug level. Pasted into a
//! bug report it carries everything needed to replay the identification:
//! the library artists, the overrides in effect, the options and every
//! track's parsed tags plus any fingerprint results.
//!
//! Field names are an interchange format shared with existing fixtures,
//! so they are pinned by serde renames.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::local::{IdentificationOverrides, IdentifyOptions, LocalTrack};
use crate::metadata::ParsedTrackInfo;
use crate::model::MetadataProfile;

/// Placeholder the reporter replaces with the release they expected.
const EXPECTED_PLACEHOLDERS: [&str; 3] = ["expected-id-1", "expected-id-2", "..."];

const ARTIST_PLACEHOLDER: &str = "expected-artist-id (dev: don't forget to add metadata profile)";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdTestCase {
    #[serde(rename = "expectedMusicBrainzReleaseIds")]
    pub expected_musicbrainz_release_ids: Vec<String>,
    pub library_artists: Vec<ArtistTestCase>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub release: Option<String>,
    pub new_download: bool,
    pub single_release: bool,
    pub tracks: Vec<BasicLocalTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprints: Option<Vec<AcoustIdTestCase>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtistTestCase {
    pub artist: String,
    pub metadata_profile: Option<MetadataProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicLocalTrack {
    pub path: PathBuf,
    pub file_track_info: ParsedTrackInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcoustIdTestCase {
    pub path: PathBuf,
    #[serde(rename = "acoustIdResults")]
    pub acoustid_results: Vec<String>,
}

impl IdTestCase {
    /// Snapshot the inputs of one `identify` call.
    pub fn capture(tracks: &[LocalTrack], overrides: &IdentificationOverrides, options: &IdentifyOptions) -> Self {
        let artist = overrides.artist.as_ref();

        let fingerprints: Vec<AcoustIdTestCase> = tracks
            .iter()
            .filter_map(|t| {
                t.acoustid_results.as_ref().map(|results| AcoustIdTestCase {
                    path: t.path.clone(),
                    acoustid_results: results.clone(),
                })
            })
            .collect();

        Self {
            expected_musicbrainz_release_ids: EXPECTED_PLACEHOLDERS.iter().map(|s| s.to_string()).collect(),
            library_artists: vec![ArtistTestCase {
                artist: artist
                    .map(|a| a.metadata.foreign_artist_id.clone())
                    .unwrap_or_else(|| ARTIST_PLACEHOLDER.to_string()),
                metadata_profile: artist.and_then(|a| a.metadata_profile.clone()),
            }],
            artist: artist.map(|a| a.metadata.foreign_artist_id.clone()),
            album: overrides.album.as_ref().map(|a| a.foreign_album_id.clone()),
            release: overrides.album_release.as_ref().map(|r| r.foreign_release_id.clone()),
            new_download: options.new_download,
            single_release: options.single_release,
            tracks: tracks
                .iter()
                .map(|t| BasicLocalTrack {
                    path: t.path.clone(),
                    file_track_info: t.file_track_info.clone(),
                })
                .collect(),
            fingerprints: (!fingerprints.is_empty()).then_some(fingerprints),
        }
    }

    /// Local tracks to replay, fingerprint results attached.
    pub fn local_tracks(&self) -> Vec<LocalTrack> {
        self.tracks
            .iter()
            .map(|t| {
                let mut track = LocalTrack::new(t.path.clone(), t.file_track_info.clone());
                track.acoustid_results = self
                    .fingerprints
                    .as_ref()
                    .and_then(|fps| fps.iter().find(|f| f.path == t.path))
                    .map(|f| f.acoustid_results.clone());
                track
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_capture_without_overrides() {
        let artist = artist_metadata(1, "Burning Spear");
        let release = album_release(1, &album(1, "Marcus Garvey", &artist), catalog_tracks(1, 2, &artist));
        let tracks = local_tracks_for(&release);

        let case = IdTestCase::capture(&tracks, &IdentificationOverrides::default(), &IdentifyOptions::default());

        assert_eq!(case.library_artists[0].artist, ARTIST_PLACEHOLDER);
        assert!(case.artist.is_none());
        assert_eq!(case.tracks.len(), 2);
        assert!(case.fingerprints.is_none());
    }

    #[test]
    fn test_json_field_names() {
        let artist = artist_metadata(1, "Burning Spear");
        let album = album(1, "Marcus Garvey", &artist);
        let overrides = IdentificationOverrides {
            artist: Some(library_artist(&artist)),
            album: Some(album.clone()),
            album_release: None,
        };
        let options = IdentifyOptions {
            new_download: true,
            ..Default::default()
        };
        let mut track = local_track_for(&catalog_tracks(1, 1, &artist)[0], &album_release(1, &album, vec![]));
        track.acoustid_results = Some(vec!["rec-1".to_string()]);

        let json = IdTestCase::capture(&[track], &overrides, &options).to_json().unwrap();

        assert!(json.contains("\"expectedMusicBrainzReleaseIds\":[\"expected-id-1\""));
        assert!(json.contains("\"libraryArtists\":[{\"artist\":\"artist-mbid-1\""));
        assert!(json.contains("\"album\":\"album-mbid-1\""));
        assert!(json.contains("\"release\":null"));
        assert!(json.contains("\"newDownload\":true"));
        assert!(json.contains("\"singleRelease\":false"));
        assert!(json.contains("\"fileTrackInfo\":{"));
        assert!(json.contains("\"acoustIdResults\":[\"rec-1\"]"));
    }

    #[test]
    fn test_replay_attaches_fingerprints() {
        let json = r#"{
            "expectedMusicBrainzReleaseIds": ["rel-1"],
            "libraryArtists": [{"artist": "a-1", "metadataProfile": null}],
            "newDownload": false,
            "singleRelease": true,
            "tracks": [
                {"path": "/music/01.mp3", "fileTrackInfo": {"title": "One", "trackNumbers": [1]}},
                {"path": "/music/02.mp3", "fileTrackInfo": {"title": "Two"}}
            ],
            "fingerprints": [{"path": "/music/02.mp3", "acoustIdResults": ["rec-2"]}]
        }"#;

        let case = IdTestCase::from_json(json).unwrap();
        let tracks = case.local_tracks();

        assert!(case.single_release);
        assert_eq!(tracks[0].file_track_info.track_number(), 1);
        assert!(tracks[0].acoustid_results.is_none());
        assert_eq!(tracks[1].acoustid_results, Some(vec!["rec-2".to_string()]));
    }
}
