//! Catalog sources.
//!
//! [`MemoryCatalog`] is the local mirror: a JSON snapshot of the artists,
//! albums, releases, tracks and track files the library knows about.
//! [`musicbrainz`] talks to the MusicBrainz web service for releases the
//! mirror doesn't have yet.
//!
//! # Snapshot format
//!
//! ```json
//! {
//!   "artists": [{ "id": 1, "artistMetadataId": 1, "metadata": { "id": 1, "foreignArtistId": "...", "name": "..." } }],
//!   "albums": [{ "id": 1, "artistMetadataId": 1, "foreignAlbumId": "...", "title": "..." }],
//!   "releases": [{ "id": 1, "albumId": 1, "foreignReleaseId": "...", "title": "...", "media": [...] }],
//!   "tracks": [{ "id": 1, "albumReleaseId": 1, "foreignRecordingId": "...", "title": "...", "absoluteTrackNumber": 1 }],
//!   "trackFiles": [{ "id": 1, "albumId": 1, "path": "/music/..." }]
//! }
//! ```
//!
//! Releases may carry their tracks inline; they are moved into the track
//! table on load.

pub mod musicbrainz;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::identification::distance::{clean_for_comparison, levenshtein_coefficient};
use crate::identification::traits::CatalogMirror;
use crate::model::{Album, AlbumRelease, Artist, Track, TrackFile};

pub use musicbrainz::MusicBrainzClient;

/// Minimum cleaned-name similarity for artist and album candidates.
pub const CANDIDATE_SIMILARITY: f64 = 0.8;

/// Errors from the catalog mirror or a remote catalog.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Remote provider unavailable or misbehaving
    #[error("Provider error: {0}")]
    Provider(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Serialized form of the mirror.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSnapshot {
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub releases: Vec<AlbumRelease>,
    pub tracks: Vec<Track>,
    pub track_files: Vec<TrackFile>,
}

/// Catalog mirror held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    data: CatalogSnapshot,
}

impl MemoryCatalog {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        let mut catalog = Self::default();
        let CatalogSnapshot {
            artists,
            albums,
            releases,
            tracks,
            track_files,
        } = snapshot;

        catalog.data.artists = artists;
        catalog.data.albums = albums;
        catalog.data.tracks = tracks;
        catalog.data.track_files = track_files;
        for release in releases {
            catalog.insert_release(release);
        }
        catalog
    }

    /// Load a JSON snapshot from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            artists = catalog.data.artists.len(),
            releases = catalog.data.releases.len(),
            "Loaded catalog mirror"
        );
        Ok(catalog)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let snapshot: CatalogSnapshot =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.releases.is_empty()
    }

    pub fn with_artist(mut self, artist: Artist) -> Self {
        self.data.artists.push(artist);
        self
    }

    pub fn with_album(mut self, album: Album) -> Self {
        self.data.albums.push(album);
        self
    }

    /// Add a release; inline tracks move to the track table.
    pub fn with_release(mut self, release: AlbumRelease) -> Self {
        self.insert_release(release);
        self
    }

    pub fn with_track_file(mut self, file: TrackFile) -> Self {
        self.data.track_files.push(file);
        self
    }

    fn insert_release(&mut self, mut release: AlbumRelease) {
        let mut known: HashSet<i64> = self.data.tracks.iter().map(|t| t.id).collect();
        let mut next_id = known.iter().copied().max().unwrap_or(0).max(0) + 1;
        for mut track in std::mem::take(&mut release.tracks) {
            // snapshots may leave track ids out; 0 is never a duplicate
            if track.id == 0 {
                while known.contains(&next_id) {
                    next_id += 1;
                }
                track.id = next_id;
            } else if known.contains(&track.id) {
                continue;
            }
            known.insert(track.id);
            track.album_release_id = release.id;
            self.data.tracks.push(track);
        }

        if release.track_count == 0 {
            release.track_count = self.release_tracks(release.id).len();
        }

        let inline_album = release.album.id != 0 && release.album.id == release.album_id;
        if inline_album && !self.data.albums.iter().any(|a| a.id == release.album_id) {
            self.data.albums.push(release.album.clone());
        }

        self.data.releases.push(release);
    }

    fn release_tracks(&self, release_id: i64) -> Vec<Track> {
        self.data
            .tracks
            .iter()
            .filter(|t| t.album_release_id == release_id)
            .cloned()
            .collect()
    }

    fn resolve_album(&self, album: &Album) -> Album {
        let mut album = album.clone();
        if album.artist_metadata.name.is_empty()
            && let Some(artist) = self
                .data
                .artists
                .iter()
                .find(|a| a.artist_metadata_id == album.artist_metadata_id)
        {
            album.artist_metadata = artist.metadata.clone();
        }
        album
    }

    /// Release with its album attached and no tracks.
    fn resolve_release(&self, release: &AlbumRelease) -> AlbumRelease {
        let album = self
            .data
            .albums
            .iter()
            .find(|a| a.id == release.album_id)
            .unwrap_or(&release.album);

        AlbumRelease {
            album: self.resolve_album(album),
            tracks: Vec::new(),
            ..release.clone()
        }
    }
}

fn resembles(query: &str, candidate: &str) -> bool {
    let query = clean_for_comparison(query);
    let candidate = clean_for_comparison(candidate);
    if query.is_empty() || candidate.is_empty() {
        return false;
    }
    query == candidate || levenshtein_coefficient(&query, &candidate) >= CANDIDATE_SIMILARITY
}

#[async_trait]
impl CatalogMirror for MemoryCatalog {
    async fn artist_by_foreign_id(&self, foreign_id: &str) -> Result<Option<Artist>, CatalogError> {
        Ok(self
            .data
            .artists
            .iter()
            .find(|a| a.metadata.foreign_artist_id == foreign_id)
            .cloned())
    }

    async fn artist_candidates(&self, name: &str) -> Result<Vec<Artist>, CatalogError> {
        let found: Vec<Artist> = self
            .data
            .artists
            .iter()
            .filter(|a| resembles(name, a.name()))
            .cloned()
            .collect();
        tracing::trace!(name, count = found.len(), "Artist candidates");
        Ok(found)
    }

    async fn album_candidates(&self, artist_metadata_id: i64, title: &str) -> Result<Vec<Album>, CatalogError> {
        Ok(self
            .data
            .albums
            .iter()
            .filter(|a| a.artist_metadata_id == artist_metadata_id && resembles(title, &a.title))
            .map(|a| self.resolve_album(a))
            .collect())
    }

    async fn release_by_foreign_id(&self, foreign_id: &str) -> Result<Option<AlbumRelease>, CatalogError> {
        Ok(self
            .data
            .releases
            .iter()
            .find(|r| r.has_foreign_id(foreign_id))
            .map(|r| self.resolve_release(r)))
    }

    async fn releases_by_album(&self, album_id: i64) -> Result<Vec<AlbumRelease>, CatalogError> {
        Ok(self
            .data
            .releases
            .iter()
            .filter(|r| r.album_id == album_id)
            .map(|r| self.resolve_release(r))
            .collect())
    }

    async fn releases_by_recording_ids(&self, recording_ids: &[String]) -> Result<Vec<AlbumRelease>, CatalogError> {
        let mut found = Vec::new();
        for release in &self.data.releases {
            let tracks = self.release_tracks(release.id);
            if tracks
                .iter()
                .any(|t| recording_ids.iter().any(|id| t.has_recording_id(id)))
            {
                found.push(AlbumRelease {
                    tracks,
                    ..self.resolve_release(release)
                });
            }
        }
        Ok(found)
    }

    async fn tracks_by_releases(&self, release_ids: &[i64]) -> Result<Vec<Track>, CatalogError> {
        Ok(self
            .data
            .tracks
            .iter()
            .filter(|t| release_ids.contains(&t.album_release_id))
            .cloned()
            .collect())
    }

    async fn files_by_album(&self, album_id: i64) -> Result<Vec<TrackFile>, CatalogError> {
        Ok(self
            .data
            .track_files
            .iter()
            .filter(|f| f.album_id == album_id)
            .cloned()
            .collect())
    }
}
