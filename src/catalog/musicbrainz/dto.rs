//! MusicBrainz API Data Transfer Objects
//!
//! These types match EXACTLY what the MusicBrainz API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the musicbrainz module - convert to catalog types.
//!
//! API Reference: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! We use three release endpoints: search (`/release?query=`), browse
//! (`/release?release-group=` or `?recording=`) and lookup (`/release/{id}`).

use serde::{Deserialize, Serialize};

/// Search or browse response: a page of releases
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseList {
    /// Total hits (search responses)
    pub count: Option<u32>,
    /// Total hits (browse responses)
    pub release_count: Option<u32>,
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// Release (one pressing of a release group)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Release {
    /// MusicBrainz release ID
    pub id: String,
    /// Search relevance 0-100 (search responses only)
    pub score: Option<u32>,
    pub title: String,
    /// Release status (Official, Bootleg, etc.)
    pub status: Option<String>,
    pub disambiguation: Option<String>,
    /// Release date (YYYY, YYYY-MM, or YYYY-MM-DD)
    pub date: Option<String>,
    /// ISO 3166-1 country code of the first release event
    pub country: Option<String>,
    #[serde(default)]
    pub release_events: Vec<ReleaseEvent>,
    #[serde(default)]
    pub label_info: Vec<LabelInfo>,
    pub artist_credit: Option<Vec<ArtistCredit>>,
    pub release_group: Option<ReleaseGroup>,
    #[serde(default)]
    pub media: Vec<Medium>,
}

/// Where and when a release came out
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReleaseEvent {
    pub date: Option<String>,
    pub area: Option<Area>,
}

/// Country or region ("United States", "Europe", "[Worldwide]")
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Area {
    pub id: Option<String>,
    pub name: String,
    #[serde(default, rename = "iso-3166-1-codes")]
    pub iso_3166_1_codes: Vec<String>,
}

/// Label and catalog number pair
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LabelInfo {
    pub catalog_number: Option<String>,
    pub label: Option<Label>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// Artist credit (can be multiple for collaborations)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtistCredit {
    /// The artist
    pub artist: Artist,
    /// How this artist is credited (may differ from official name)
    pub name: Option<String>,
    /// Join phrase (e.g., " & ", " feat. ")
    pub joinphrase: Option<String>,
}

/// Artist info
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Artist {
    /// MusicBrainz artist ID
    pub id: String,
    /// Official artist name
    pub name: String,
    /// Sort name (e.g., "Beatles, The")
    pub sort_name: Option<String>,
}

/// Release group (e.g., "Abbey Road" across all editions)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReleaseGroup {
    /// MusicBrainz release group ID
    pub id: String,
    pub title: String,
    /// Primary type (Album, Single, EP, etc.)
    pub primary_type: Option<String>,
    pub first_release_date: Option<String>,
    pub artist_credit: Option<Vec<ArtistCredit>>,
}

/// Medium (disc) within a release
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Medium {
    /// Position in release (disc number)
    pub position: Option<u32>,
    /// Medium title, usually empty
    pub title: Option<String>,
    /// Format (CD, Vinyl, Digital Media, etc.)
    pub format: Option<String>,
    pub track_count: Option<u32>,
    /// Tracks (only with `inc=recordings`)
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// Track on a medium
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Track {
    /// MusicBrainz track ID
    pub id: String,
    /// Track position on medium
    pub position: Option<u32>,
    /// Track number as printed (may be "A1" on vinyl)
    pub number: Option<String>,
    /// Track title (may differ from recording title)
    pub title: Option<String>,
    /// Track length in milliseconds
    pub length: Option<u64>,
    pub artist_credit: Option<Vec<ArtistCredit>>,
    pub recording: Option<Recording>,
}

/// Recording behind a track
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Recording {
    pub id: String,
    pub title: String,
    pub length: Option<u64>,
}

/// Error response from MusicBrainz API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: String,
    pub help: Option<String>,
}

// ============================================================================
// CONTRACT TESTS
// These verify our DTOs match what the real API returns.
// If these fail, the API has changed and we need to update our DTOs.
// ============================================================================

#[cfg(test)]
mod contract_tests {
    use super::*;

    /// Test parsing a search response
    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "created": "2024-01-01T00:00:00.000Z",
            "count": 2,
            "offset": 0,
            "releases": [
                {"id": "rel-1", "score": 100, "title": "Rastaman Vibration", "status": "Official"},
                {"id": "rel-2", "score": 87, "title": "Rastaman Vibration"}
            ]
        }"#;

        let list: ReleaseList = serde_json::from_str(json).expect("Should parse search response");

        assert_eq!(list.count, Some(2));
        assert_eq!(list.releases.len(), 2);
        assert_eq!(list.releases[0].score, Some(100));
        assert!(list.releases[1].status.is_none());
        assert!(list.releases[1].media.is_empty());
    }

    /// Test parsing a browse response
    #[test]
    fn test_parse_browse_response() {
        let json = r#"{
            "release-count": 1,
            "release-offset": 0,
            "releases": [{"id": "rel-1", "title": "Legalize It", "media": []}]
        }"#;

        let list: ReleaseList = serde_json::from_str(json).expect("Should parse browse response");

        assert_eq!(list.release_count, Some(1));
        assert_eq!(list.releases[0].title, "Legalize It");
    }

    /// Test parsing a full release lookup
    #[test]
    fn test_parse_release_with_includes() {
        let json = r#"{
            "id": "rel-123",
            "title": "Rastaman Vibration",
            "status": "Official",
            "disambiguation": "",
            "date": "1976-04-30",
            "country": "US",
            "release-events": [{
                "date": "1976-04-30",
                "area": {"id": "area-1", "name": "United States", "iso-3166-1-codes": ["US"]}
            }],
            "label-info": [{
                "catalog-number": "ILPS 9383",
                "label": {"id": "label-1", "name": "Island Records"}
            }],
            "artist-credit": [{
                "artist": {"id": "art-1", "name": "Bob Marley & The Wailers", "sort-name": "Marley, Bob & The Wailers"},
                "name": "Bob Marley & The Wailers",
                "joinphrase": ""
            }],
            "release-group": {
                "id": "rg-1",
                "title": "Rastaman Vibration",
                "primary-type": "Album",
                "first-release-date": "1976-04-30"
            },
            "media": [{
                "position": 1,
                "title": "",
                "format": "12\" Vinyl",
                "track-count": 10,
                "tracks": [{
                    "id": "trk-1",
                    "position": 1,
                    "number": "A1",
                    "title": "Positive Vibration",
                    "length": 215000,
                    "recording": {"id": "rec-1", "title": "Positive Vibration", "length": 214000}
                }]
            }]
        }"#;

        let release: Release = serde_json::from_str(json).expect("Should parse release");

        assert_eq!(release.release_events[0].area.as_ref().unwrap().name, "United States");
        assert_eq!(release.label_info[0].catalog_number.as_deref(), Some("ILPS 9383"));
        let medium = &release.media[0];
        assert_eq!(medium.format.as_deref(), Some("12\" Vinyl"));
        assert_eq!(medium.tracks[0].number.as_deref(), Some("A1"));
        assert_eq!(medium.tracks[0].recording.as_ref().unwrap().id, "rec-1");
    }

    /// Test parsing error response
    #[test]
    fn test_parse_error_response() {
        let json = r#"{
            "error": "Not Found",
            "help": "For usage, please see: https://musicbrainz.org/doc/MusicBrainz_API"
        }"#;

        let error: ApiError = serde_json::from_str(json).expect("Should parse error");
        assert_eq!(error.error, "Not Found");
        assert!(error.help.is_some());
    }
}
