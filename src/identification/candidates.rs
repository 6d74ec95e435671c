//! Candidate release generation.
//!
//! Three sources, tried in this order by the orchestrator: the catalog
//! mirror driven by tags (and any caller overrides), the catalog mirror
//! driven by fingerprint recording ids, and the remote catalog.

use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, trace};

use super::calculator::VARIOUS_ARTIST_IDS;
use super::grouping::is_various_artists;
use super::local::{
    CandidateAlbumRelease, IdentificationOverrides, LocalAlbumRelease, count_distinct, most_common,
};
use super::traits::{CatalogMirror, RemoteCatalog};
use crate::catalog::CatalogError;
use crate::error::Result;
use crate::model::{Album, AlbumRelease, Artist, TrackFile};

/// Share of a batch's tracks a release must cover by fingerprint.
pub const FINGERPRINT_OVERLAP_THRESHOLD: f64 = 0.6;

/// Fingerprint candidates kept after ordering.
pub const MAX_FINGERPRINT_CANDIDATES: usize = 10;

/// Artist text used to search the remote catalog for compilations.
pub const VARIOUS_ARTISTS_NAME: &str = "Various Artists";

/// The release id every track agrees on, if any.
///
/// An untagged track counts as a differing value.
fn consensus_release_id(batch: &LocalAlbumRelease) -> Option<&str> {
    let ids = count_distinct(batch.local_tracks.iter().map(|t| t.file_track_info.release_mbid.as_deref()));
    match ids.as_slice() {
        [(Some(id), _)] if !id.trim().is_empty() => Some(*id),
        _ => None,
    }
}

/// The one non-blank album id every track carries, if any.
fn consensus_album_id(batch: &LocalAlbumRelease) -> Option<&str> {
    let ids = count_distinct(batch.local_tracks.iter().map(|t| t.file_track_info.album_mbid.as_deref()));
    match ids.as_slice() {
        [(Some(id), _)] if !id.trim().is_empty() => Some(*id),
        _ => None,
    }
}

fn most_common_album_tag(batch: &LocalAlbumRelease) -> Option<&str> {
    most_common(batch.local_tracks.iter().map(|t| t.album_title()))
        .flatten()
        .filter(|s| !s.trim().is_empty())
}

fn most_common_artist_tag(batch: &LocalAlbumRelease) -> Option<&str> {
    most_common(batch.local_tracks.iter().map(|t| t.artist_title()))
        .flatten()
        .filter(|s| !s.trim().is_empty())
}

/// Every recording id fingerprinting produced for the batch, deduplicated.
fn fingerprint_recording_ids(batch: &LocalAlbumRelease) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in batch
        .local_tracks
        .iter()
        .filter_map(|t| t.acoustid_results.as_ref())
        .flatten()
    {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}

/// Candidates from the catalog mirror, driven by tags and overrides.
///
/// Overrides win over tags: a forced release is used as is, a forced album
/// or artist reuses the release the tags point at only when it belongs to
/// them.
pub async fn from_tags(
    catalog: &dyn CatalogMirror,
    batch: &LocalAlbumRelease,
    overrides: &IdentificationOverrides,
    include_existing: bool,
) -> Result<Vec<CandidateAlbumRelease>> {
    let start = Instant::now();

    let tag_release = match consensus_release_id(batch) {
        Some(id) => {
            debug!(release_id = id, "Selecting release from consensus release id");
            catalog.release_by_foreign_id(id).await?
        }
        None => None,
    };

    let releases = if let Some(release) = &overrides.album_release {
        debug!(release = %release, tracks = release.track_count, "Release was forced");
        vec![release.clone()]
    } else if let Some(album) = &overrides.album {
        match tag_release {
            Some(release) if release.album_id == album.id => vec![release],
            _ => by_album(catalog, batch, album).await?,
        }
    } else if let Some(artist) = &overrides.artist {
        match tag_release {
            Some(release) if release.album.artist_metadata_id == artist.artist_metadata_id => vec![release],
            _ => by_artist(catalog, batch, artist).await?,
        }
    } else if let Some(release) = tag_release {
        vec![release]
    } else {
        by_search(catalog, batch).await?
    };

    let candidates = with_existing_files(catalog, releases, include_existing).await?;
    debug!(
        tracks = batch.track_count(),
        candidates = candidates.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Got candidates from tags"
    );
    Ok(candidates)
}

/// Releases of an album, closest track count first.
async fn by_album(
    catalog: &dyn CatalogMirror,
    batch: &LocalAlbumRelease,
    album: &Album,
) -> std::result::Result<Vec<AlbumRelease>, CatalogError> {
    let mut releases = catalog.releases_by_album(album.id).await?;
    let local_count = batch.track_count();
    releases.sort_by_key(|r| r.track_count.abs_diff(local_count));
    Ok(releases)
}

/// Releases of the artist's albums resembling the album tag.
async fn by_artist(
    catalog: &dyn CatalogMirror,
    batch: &LocalAlbumRelease,
    artist: &Artist,
) -> std::result::Result<Vec<AlbumRelease>, CatalogError> {
    trace!(artist = %artist, "Getting candidates for artist");
    let Some(album_tag) = most_common_album_tag(batch) else {
        return Ok(Vec::new());
    };

    let mut releases = Vec::new();
    for album in catalog.album_candidates(artist.artist_metadata_id, album_tag).await? {
        releases.extend(by_album(catalog, batch, &album).await?);
    }
    Ok(releases)
}

/// Nothing pinned: plausible artists, then their plausible albums.
async fn by_search(
    catalog: &dyn CatalogMirror,
    batch: &LocalAlbumRelease,
) -> std::result::Result<Vec<AlbumRelease>, CatalogError> {
    let artists = if is_various_artists(&batch.local_tracks) {
        debug!("Batch looks like various artists");
        let mut artists = Vec::new();
        for id in VARIOUS_ARTIST_IDS {
            artists.extend(catalog.artist_by_foreign_id(id).await?);
        }
        artists
    } else {
        match most_common_artist_tag(batch) {
            Some(artist_tag) => catalog.artist_candidates(artist_tag).await?,
            None => Vec::new(),
        }
    };

    let mut releases = Vec::new();
    for artist in &artists {
        releases.extend(by_artist(catalog, batch, artist).await?);
    }
    Ok(releases)
}

/// Pair releases with the files the library holds for their album.
async fn with_existing_files(
    catalog: &dyn CatalogMirror,
    releases: Vec<AlbumRelease>,
    include_existing: bool,
) -> std::result::Result<Vec<CandidateAlbumRelease>, CatalogError> {
    let mut files_by_album: HashMap<i64, Vec<TrackFile>> = HashMap::new();
    let mut candidates = Vec::with_capacity(releases.len());

    for release in releases {
        let existing_files = if include_existing && release.album_id != 0 {
            if !files_by_album.contains_key(&release.album_id) {
                let files = catalog.files_by_album(release.album_id).await?;
                files_by_album.insert(release.album_id, files);
            }
            files_by_album.get(&release.album_id).cloned().unwrap_or_default()
        } else {
            Vec::new()
        };
        candidates.push(CandidateAlbumRelease {
            album_release: release,
            existing_files,
        });
    }
    Ok(candidates)
}

/// Candidates from the catalog mirror, driven by fingerprint results.
///
/// Keeps releases whose track recordings cover at least
/// [`FINGERPRINT_OVERLAP_THRESHOLD`] of the batch, closest track count
/// first, then highest coverage.
pub async fn from_fingerprint(
    catalog: &dyn CatalogMirror,
    batch: &LocalAlbumRelease,
    overrides: &IdentificationOverrides,
    include_existing: bool,
) -> Result<Vec<CandidateAlbumRelease>> {
    let recording_ids = fingerprint_recording_ids(batch);
    if recording_ids.is_empty() || batch.track_count() == 0 {
        return Ok(Vec::new());
    }

    let mut releases = catalog.releases_by_recording_ids(&recording_ids).await?;

    // stay consistent with whatever the caller pinned
    if let Some(release) = &overrides.album_release {
        releases.retain(|r| r.foreign_release_id == release.foreign_release_id);
    } else if let Some(album) = &overrides.album {
        releases.retain(|r| r.album_id == album.id);
    } else if let Some(artist) = &overrides.artist {
        releases.retain(|r| r.album.artist_metadata_id == artist.artist_metadata_id);
    }

    let local_count = batch.track_count();
    let mut scored: Vec<(AlbumRelease, f64)> = releases
        .into_iter()
        .map(|release| {
            let common = release
                .tracks
                .iter()
                .filter(|t| recording_ids.iter().any(|id| t.has_recording_id(id)))
                .count();
            let proportion = common as f64 / local_count as f64;
            (release, proportion)
        })
        .filter(|(_, proportion)| *proportion >= FINGERPRINT_OVERLAP_THRESHOLD)
        .collect();

    scored.sort_by(|(a, pa), (b, pb)| {
        a.track_count
            .abs_diff(local_count)
            .cmp(&b.track_count.abs_diff(local_count))
            .then_with(|| pb.total_cmp(pa))
    });

    let releases = scored
        .into_iter()
        .take(MAX_FINGERPRINT_CANDIDATES)
        .map(|(release, _)| release)
        .collect();

    let candidates = with_existing_files(catalog, releases, include_existing).await?;
    debug!(
        recordings = recording_ids.len(),
        candidates = candidates.len(),
        "Got candidates from fingerprints"
    );
    Ok(candidates)
}

/// Candidates from the remote catalog. Provider errors count as no results.
pub async fn from_remote(remote: &dyn RemoteCatalog, batch: &LocalAlbumRelease) -> Vec<CandidateAlbumRelease> {
    match search_remote(remote, batch).await {
        Ok(releases) => {
            let mut candidates: Vec<CandidateAlbumRelease> = Vec::with_capacity(releases.len());
            for release in releases {
                if !candidates
                    .iter()
                    .any(|c| c.album_release.foreign_release_id == release.foreign_release_id)
                {
                    candidates.push(CandidateAlbumRelease::new(release));
                }
            }
            debug!(candidates = candidates.len(), "Got candidates from remote catalog");
            candidates
        }
        Err(e) => {
            info!(error = %e, "Remote catalog search failed, continuing without it");
            Vec::new()
        }
    }
}

async fn search_remote(
    remote: &dyn RemoteCatalog,
    batch: &LocalAlbumRelease,
) -> std::result::Result<Vec<AlbumRelease>, CatalogError> {
    // each strategy falls through to the next when it finds nothing
    if let Some(album_id) = consensus_album_id(batch) {
        debug!(album_id, "Searching remote catalog by album id");
        let releases = remote.search_by_album_id(album_id).await?;
        if !releases.is_empty() {
            return Ok(releases);
        }
    }

    let recording_ids = fingerprint_recording_ids(batch);
    if !recording_ids.is_empty() {
        debug!(recordings = recording_ids.len(), "Searching remote catalog by recording ids");
        let releases = remote.search_by_recording_ids(&recording_ids).await?;
        if !releases.is_empty() {
            return Ok(releases);
        }
    }

    let artist = if is_various_artists(&batch.local_tracks) {
        Some(VARIOUS_ARTISTS_NAME)
    } else {
        most_common_artist_tag(batch)
    };
    let (Some(artist), Some(album)) = (artist, most_common_album_tag(batch)) else {
        return Ok(Vec::new());
    };

    debug!(artist, album, "Searching remote catalog by text");
    let releases = remote.search(album, artist).await?;
    if !releases.is_empty() {
        return Ok(releases);
    }

    // widen: album alone, then artist alone
    let mut releases = remote.search(album, "").await?;
    releases.extend(remote.search("", artist).await?);
    Ok(releases)
}
