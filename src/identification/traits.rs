//! Collaborator traits for identification.
//!
//! The orchestrator only talks to the outside world through these traits,
//! so tests can substitute the in-memory implementations in [`mocks`].
//!
//! # Example
//!
//! ```ignore
//! use music_matcher::identification::traits::{CatalogMirror, RemoteCatalog};
//!
//! // In production code:
//! let service = IdentificationService::new(
//!     Arc::new(LoftyTagReader::new()),
//!     Arc::new(FilenameAugmenter::new()),
//!     Arc::new(AcoustIdFingerprinter::new(api_key)?),
//!     Arc::new(MemoryCatalog::load(path)?),
//!     Arc::new(MusicBrainzClient::new(DEFAULT_BASE_URL, 10)?),
//!     FingerprintingMode::NewFiles,
//! );
//!
//! // In tests:
//! let remote = MockRemote::with_error(CatalogError::Network("timeout".into()));
//! ```

use async_trait::async_trait;
use std::path::Path;

use super::local::{LocalAlbumRelease, LocalTrack};
use crate::augment::AugmentError;
use crate::catalog::CatalogError;
use crate::enrichment::EnrichmentError;
use crate::error::Result;
use crate::metadata::ParsedTrackInfo;
use crate::model::{Album, AlbumRelease, Artist, Track, TrackFile};

/// Reads tags from an audio file.
pub trait TagReader: Send + Sync {
    fn read_tags(&self, path: &Path) -> Result<ParsedTrackInfo>;
}

/// Fills in derived fields the tags left out.
pub trait Augmenter: Send + Sync {
    /// Batch-level pass over a freshly grouped release.
    fn augment_release(&self, release: &mut LocalAlbumRelease) -> std::result::Result<(), AugmentError>;

    /// Single track; `is_extra` marks files pulled in from the library.
    fn augment_track(&self, track: &mut LocalTrack, is_extra: bool) -> std::result::Result<(), AugmentError>;
}

/// Acoustic fingerprint lookup.
#[async_trait]
pub trait Fingerprinter: Send + Sync {
    /// Store candidate recording ids scoring at least `threshold` in each
    /// track's `acoustid_results`.
    async fn lookup(&self, tracks: &mut [LocalTrack], threshold: f64) -> std::result::Result<(), EnrichmentError>;
}

/// Reads against the local catalog mirror.
#[async_trait]
pub trait CatalogMirror: Send + Sync {
    async fn artist_by_foreign_id(&self, foreign_id: &str) -> std::result::Result<Option<Artist>, CatalogError>;

    /// Artists whose name resembles `name`.
    async fn artist_candidates(&self, name: &str) -> std::result::Result<Vec<Artist>, CatalogError>;

    /// Albums by the artist whose title resembles `title`.
    async fn album_candidates(
        &self,
        artist_metadata_id: i64,
        title: &str,
    ) -> std::result::Result<Vec<Album>, CatalogError>;

    /// Looks up current and former release ids.
    async fn release_by_foreign_id(&self, foreign_id: &str) -> std::result::Result<Option<AlbumRelease>, CatalogError>;

    async fn releases_by_album(&self, album_id: i64) -> std::result::Result<Vec<AlbumRelease>, CatalogError>;

    /// Releases containing any of the recordings, returned with their
    /// tracks so the overlap can be measured.
    async fn releases_by_recording_ids(
        &self,
        recording_ids: &[String],
    ) -> std::result::Result<Vec<AlbumRelease>, CatalogError>;

    async fn tracks_by_releases(&self, release_ids: &[i64]) -> std::result::Result<Vec<Track>, CatalogError>;

    /// Files the library already holds for an album.
    async fn files_by_album(&self, album_id: i64) -> std::result::Result<Vec<TrackFile>, CatalogError>;
}

/// Searches against a remote metadata service. Releases come back with
/// their tracks.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    async fn search_by_album_id(&self, album_id: &str) -> std::result::Result<Vec<AlbumRelease>, CatalogError>;

    async fn search_by_recording_ids(
        &self,
        recording_ids: &[String],
    ) -> std::result::Result<Vec<AlbumRelease>, CatalogError>;

    /// Free text search; an empty `album` or `artist` widens the search.
    async fn search(&self, album: &str, artist: &str) -> std::result::Result<Vec<AlbumRelease>, CatalogError>;
}
