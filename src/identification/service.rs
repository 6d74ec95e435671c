//! Identification service - matches local tracks to catalog releases
//!
//! This is the high-level API for identification:
//! 1. Group local tracks into batches that look like one release each
//! 2. Find candidate releases (tags, then remote, then fingerprints)
//! 3. Assign tracks to each candidate and keep the closest release
//! 4. If the best match is poor, fingerprint and try again with more candidates

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

use super::calculator::{album_release_distance, map_release_tracks};
use super::candidates;
use super::grouping::group_tracks;
use super::local::{CandidateAlbumRelease, IdentificationOverrides, IdentifyOptions, LocalAlbumRelease, LocalTrack};
use super::test_case::IdTestCase;
use super::traits::{Augmenter, CatalogMirror, Fingerprinter, RemoteCatalog, TagReader};
use crate::config::FingerprintingMode;
use crate::error::Result;

/// Minimum AcoustID score for a recording id to count.
pub const FINGERPRINT_SCORE_THRESHOLD: f64 = 0.5;

/// Release distance above which a match is worth fingerprinting.
pub const MAX_GOOD_RELEASE_DISTANCE: f64 = 0.15;

/// Worst single track distance above which a match is worth fingerprinting.
pub const MAX_GOOD_TRACK_DISTANCE: f64 = 0.40;

/// Service for identifying which releases local files belong to
pub struct IdentificationService {
    tag_reader: Arc<dyn TagReader>,
    augmenter: Arc<dyn Augmenter>,
    fingerprinter: Arc<dyn Fingerprinter>,
    catalog: Arc<dyn CatalogMirror>,
    remote: Arc<dyn RemoteCatalog>,
    fingerprinting: FingerprintingMode,
}

impl IdentificationService {
    pub fn new(
        tag_reader: Arc<dyn TagReader>,
        augmenter: Arc<dyn Augmenter>,
        fingerprinter: Arc<dyn Fingerprinter>,
        catalog: Arc<dyn CatalogMirror>,
        remote: Arc<dyn RemoteCatalog>,
        fingerprinting: FingerprintingMode,
    ) -> Self {
        Self {
            tag_reader,
            augmenter,
            fingerprinter,
            catalog,
            remote,
            fingerprinting,
        }
    }

    /// Group `tracks` into releases and match each one.
    ///
    /// Batches with no plausible candidate come back unmatched. Batches are
    /// processed one at a time.
    pub async fn identify(
        &self,
        tracks: Vec<LocalTrack>,
        overrides: &IdentificationOverrides,
        options: &IdentifyOptions,
    ) -> Result<Vec<LocalAlbumRelease>> {
        let start = Instant::now();
        debug!("Starting track identification");
        log_test_case(&tracks, overrides, options);

        let track_count = tracks.len();
        let mut releases = if options.single_release {
            vec![LocalAlbumRelease::new(tracks)]
        } else {
            group_tracks(tracks)
        };
        debug!(
            tracks = track_count,
            releases = releases.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Sorted tracks into releases"
        );

        for release in &mut releases {
            self.augment(release);
            self.identify_release(release, overrides, options).await?;
        }

        debug!(
            tracks = track_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Track identification done"
        );
        Ok(releases)
    }

    /// Augment every track, then the batch. The first failure is logged
    /// and the batch goes on with whatever it has.
    fn augment(&self, release: &mut LocalAlbumRelease) {
        let result = release
            .local_tracks
            .iter_mut()
            .try_for_each(|t| self.augmenter.augment_track(t, false))
            .and_then(|_| self.augmenter.augment_release(release));

        if let Err(e) = result {
            warn!(tracks = release.track_count(), error = %e, "Augmentation failed");
        }
    }

    fn fingerprinting_allowed(&self, new_download: bool) -> bool {
        self.fingerprinting.allows(new_download)
    }

    async fn identify_release(
        &self,
        release: &mut LocalAlbumRelease,
        overrides: &IdentificationOverrides,
        options: &IdentifyOptions,
    ) -> Result<()> {
        if release.local_tracks.is_empty() {
            return Ok(());
        }

        let start = Instant::now();
        let fingerprint_allowed = self.fingerprinting_allowed(options.new_download);
        let mut fingerprinted = false;

        let mut candidates =
            candidates::from_tags(self.catalog.as_ref(), release, overrides, options.include_existing).await?;
        if candidates.is_empty() && options.add_new_artists {
            candidates = candidates::from_remote(self.remote.as_ref(), release).await;
        }

        if candidates.is_empty() && fingerprint_allowed {
            debug!("No candidates found, fingerprinting");
            self.fingerprinter
                .lookup(&mut release.local_tracks, FINGERPRINT_SCORE_THRESHOLD)
                .await?;
            fingerprinted = true;

            candidates =
                candidates::from_fingerprint(self.catalog.as_ref(), release, overrides, options.include_existing)
                    .await?;
            if candidates.is_empty() && options.add_new_artists {
                candidates = candidates::from_remote(self.remote.as_ref(), release).await;
            }
        }

        if candidates.is_empty() {
            // can't find any candidates even after fingerprinting
            debug!(tracks = release.track_count(), "No candidates, leaving release unmatched");
            return Ok(());
        }

        debug!(
            candidates = candidates.len(),
            tracks = release.track_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Got candidates"
        );

        self.populate_tracks(&mut candidates).await?;
        let mut extra_tracks = Vec::new();
        self.collect_extra_tracks(release, &candidates, &mut extra_tracks);

        best_release(release, &candidates, &extra_tracks);

        // fingerprints can improve the match even against the same candidates
        if !fingerprinted && fingerprint_allowed && should_fingerprint(release) {
            debug!(distance = %release.distance, "Match not good enough, fingerprinting");
            self.fingerprinter
                .lookup(&mut release.local_tracks, FINGERPRINT_SCORE_THRESHOLD)
                .await?;

            // pinned album or release means the caller already chose
            if !overrides.pins_album() {
                let mut found =
                    candidates::from_fingerprint(self.catalog.as_ref(), release, overrides, options.include_existing)
                        .await?;
                if options.add_new_artists {
                    found.extend(candidates::from_remote(self.remote.as_ref(), release).await);
                }

                let mut new_candidates: Vec<CandidateAlbumRelease> = Vec::new();
                for candidate in found {
                    let id = &candidate.album_release.foreign_release_id;
                    let known = candidates
                        .iter()
                        .chain(new_candidates.iter())
                        .any(|c| &c.album_release.foreign_release_id == id);
                    if !known {
                        new_candidates.push(candidate);
                    }
                }
                debug!(candidates = new_candidates.len(), "Adding candidates after fingerprinting");

                self.populate_tracks(&mut new_candidates).await?;
                self.collect_extra_tracks(release, &new_candidates, &mut extra_tracks);
                candidates.extend(new_candidates);
            }

            // fingerprint the library files we might be matching against too
            if !extra_tracks.is_empty() {
                self.fingerprinter
                    .lookup(&mut extra_tracks, FINGERPRINT_SCORE_THRESHOLD)
                    .await?;
            }

            best_release(release, &candidates, &extra_tracks);
        }

        debug!(
            release = ?release.album_release.as_ref().map(|r| r.to_string()),
            distance = release.distance.normalized_distance(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Best release found"
        );

        release.populate_match();
        Ok(())
    }

    /// Fetch track lists for candidates that came without one.
    async fn populate_tracks(&self, candidates: &mut [CandidateAlbumRelease]) -> Result<()> {
        let ids: Vec<i64> = candidates
            .iter()
            .filter(|c| c.album_release.tracks.is_empty())
            .map(|c| c.album_release.id)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }

        let tracks = self.catalog.tracks_by_releases(&ids).await?;
        debug!(releases = ids.len(), tracks = tracks.len(), "Retrieved possible tracks");

        for candidate in candidates.iter_mut().filter(|c| c.album_release.tracks.is_empty()) {
            let release_id = candidate.album_release.id;
            candidate.album_release.tracks = tracks
                .iter()
                .filter(|t| t.album_release_id == release_id)
                .cloned()
                .collect();
        }
        Ok(())
    }

    /// Turn candidates' existing library files into local tracks.
    ///
    /// `extra` is keyed by path and never holds a track already in the
    /// batch; only files not seen before have their tags read.
    fn collect_extra_tracks(
        &self,
        release: &LocalAlbumRelease,
        candidates: &[CandidateAlbumRelease],
        extra: &mut Vec<LocalTrack>,
    ) {
        for file in candidates.iter().flat_map(|c| c.existing_files.iter()) {
            let known = release.local_tracks.iter().chain(extra.iter()).any(|t| t.path == file.path);
            if known {
                continue;
            }

            let file_track_info = match self.tag_reader.read_tags(&file.path) {
                Ok(info) => info,
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Failed to read tags of existing file");
                    Default::default()
                }
            };

            let mut track = LocalTrack {
                path: file.path.clone(),
                size: file.size,
                modified: file.modified,
                file_track_info,
                existing_file: true,
                additional_file: true,
                ..Default::default()
            };
            if let Err(e) = self.augmenter.augment_track(&mut track, true) {
                warn!(path = %track.path.display(), error = %e, "Augmentation failed");
            }
            extra.push(track);
        }
    }
}

/// Emit the diagnostic test-case record.
fn log_test_case(tracks: &[LocalTrack], overrides: &IdentificationOverrides, options: &IdentifyOptions) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    match IdTestCase::capture(tracks, overrides, options).to_json() {
        Ok(json) => debug!("*** IdentificationService TestCaseGenerator ***\n{}", json),
        Err(e) => debug!(error = %e, "Could not serialize test case"),
    }
}

/// Score every candidate and keep the closest one on `release`.
///
/// A candidate only replaces the current best when strictly closer, so
/// the first of several equal candidates wins. An exact match ends the
/// search.
fn best_release(release: &mut LocalAlbumRelease, candidates: &[CandidateAlbumRelease], extra_tracks: &[LocalTrack]) {
    let start = Instant::now();
    debug!(
        tracks = release.track_count(),
        candidates = candidates.len(),
        "Matching track files against candidates"
    );
    trace!(paths = ?release.local_tracks.iter().map(|t| &t.path).collect::<Vec<_>>(), "Processing files");

    let mut best_distance = 1.0;

    for candidate in candidates {
        let album_release = &candidate.album_release;
        let candidate_start = Instant::now();

        let mut extra: Vec<LocalTrack> = Vec::new();
        for file in &candidate.existing_files {
            if release.local_tracks.iter().chain(extra.iter()).any(|t| t.path == file.path) {
                continue;
            }
            if let Some(track) = extra_tracks.iter().find(|t| t.path == file.path) {
                extra.push(track.clone());
            }
        }

        let pool: Vec<LocalTrack> = release.local_tracks.iter().chain(extra.iter()).cloned().collect();
        let mapping = map_release_tracks(&pool, &album_release.tracks);
        let distance = album_release_distance(&pool, album_release, &mapping);
        let current = distance.normalized_distance();

        debug!(
            release = %album_release,
            tracks = album_release.track_count,
            existing = candidate.existing_files.len(),
            distance = current,
            best = best_distance,
            elapsed_ms = candidate_start.elapsed().as_millis() as u64,
            "Scored candidate release"
        );

        if current < best_distance {
            best_distance = current;
            release.distance = distance;
            release.album_release = Some(album_release.clone());
            release.existing_tracks = extra;
            release.track_mapping = Some(mapping);
            if current == 0.0 {
                break;
            }
        }
    }

    debug!(
        distance = best_distance,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Best release chosen"
    );
}

/// True if the current match is poor enough to be worth fingerprinting.
fn should_fingerprint(release: &LocalAlbumRelease) -> bool {
    let Some(mapping) = &release.track_mapping else {
        return true;
    };

    release.distance.normalized_distance() > MAX_GOOD_RELEASE_DISTANCE
        || mapping.has_unmatched()
        || mapping.worst_track_distance() > MAX_GOOD_TRACK_DISTANCE
}
