//! Working state for one identification run.
//!
//! Local tracks come from the scanner (or are synthesized from files the
//! library already holds); batches and candidates live only as long as the
//! `identify` call that created them.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::distance::Distance;
use crate::metadata::ParsedTrackInfo;
use crate::model::{Album, AlbumRelease, Artist, Track, TrackFile};

/// A scanned audio file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalTrack {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub file_track_info: ParsedTrackInfo,
    /// Recording ids from fingerprinting; `None` until a lookup has run
    pub acoustid_results: Option<Vec<String>>,
    /// Already known to the library
    pub existing_file: bool,
    /// Pulled in from a candidate's existing files rather than scanned
    pub additional_file: bool,

    // Filled in by `LocalAlbumRelease::populate_match`
    pub matched_release: Option<String>,
    pub tracks: Vec<Track>,
    pub distance: Option<Distance>,
}

impl LocalTrack {
    pub fn new(path: impl Into<PathBuf>, file_track_info: ParsedTrackInfo) -> Self {
        Self {
            path: path.into(),
            file_track_info,
            ..Default::default()
        }
    }

    pub fn artist_title(&self) -> Option<&str> {
        self.file_track_info.artist_title.as_deref()
    }

    pub fn album_title(&self) -> Option<&str> {
        self.file_track_info.album_title.as_deref()
    }
}

/// A local track paired with the catalog track it was assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMatch {
    pub local_path: PathBuf,
    pub track: Track,
    pub distance: Distance,
}

/// Result of assigning local tracks to a release's catalog tracks.
///
/// Every local track appears either in `mapping` or `local_extra`, and
/// every catalog track either in `mapping` or `mb_extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMapping {
    pub mapping: Vec<TrackMatch>,
    /// Local files with no catalog track
    pub local_extra: Vec<PathBuf>,
    /// Catalog tracks with no local file
    pub mb_extra: Vec<Track>,
}

impl TrackMapping {
    pub fn get(&self, path: &Path) -> Option<&TrackMatch> {
        self.mapping.iter().find(|m| m.local_path == path)
    }

    /// Normalized distance of the worst mapped pair, 1.0 if nothing mapped.
    pub fn worst_track_distance(&self) -> f64 {
        self.mapping
            .iter()
            .map(|m| m.distance.normalized_distance())
            .reduce(f64::max)
            .unwrap_or(1.0)
    }

    pub fn has_unmatched(&self) -> bool {
        !self.local_extra.is_empty() || !self.mb_extra.is_empty()
    }
}

/// A batch of local tracks believed to be one release.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalAlbumRelease {
    pub local_tracks: Vec<LocalTrack>,
    pub album_release: Option<AlbumRelease>,
    pub distance: Distance,
    pub track_mapping: Option<TrackMapping>,
    /// Library files folded in from the winning candidate
    pub existing_tracks: Vec<LocalTrack>,
}

impl LocalAlbumRelease {
    pub fn new(local_tracks: Vec<LocalTrack>) -> Self {
        Self {
            local_tracks,
            ..Default::default()
        }
    }

    pub fn track_count(&self) -> usize {
        self.local_tracks.len()
    }

    pub fn is_matched(&self) -> bool {
        self.album_release.is_some()
    }

    /// Stamp the chosen release and mapped catalog track onto every local
    /// track, after folding in the existing tracks (deduplicated by path).
    pub fn populate_match(&mut self) {
        let Some(release) = &self.album_release else {
            return;
        };

        let mut seen: HashSet<PathBuf> = self.local_tracks.iter().map(|t| t.path.clone()).collect();
        for existing in self.existing_tracks.drain(..) {
            if seen.insert(existing.path.clone()) {
                self.local_tracks.push(existing);
            }
        }

        for local in &mut self.local_tracks {
            local.matched_release = Some(release.foreign_release_id.clone());
            if let Some(found) = self.track_mapping.as_ref().and_then(|m| m.get(&local.path)) {
                local.tracks = vec![found.track.clone()];
                local.distance = Some(found.distance.clone());
            }
        }
    }
}

/// A catalog release under consideration for a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateAlbumRelease {
    pub album_release: AlbumRelease,
    /// Files the library already holds for the release's album
    pub existing_files: Vec<TrackFile>,
}

impl CandidateAlbumRelease {
    pub fn new(album_release: AlbumRelease) -> Self {
        Self {
            album_release,
            existing_files: Vec::new(),
        }
    }
}

/// Caller-pinned identities; each one narrows the candidate search.
#[derive(Debug, Clone, Default)]
pub struct IdentificationOverrides {
    pub artist: Option<Artist>,
    pub album: Option<Album>,
    pub album_release: Option<AlbumRelease>,
}

impl IdentificationOverrides {
    /// True if an album or release is pinned.
    pub fn pins_album(&self) -> bool {
        self.album.is_some() || self.album_release.is_some()
    }
}

/// Per-call switches for `identify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifyOptions {
    /// Files arrived with a download (fingerprinting policy may depend on it)
    pub new_download: bool,
    /// Skip grouping, treat the input as one release
    pub single_release: bool,
    /// Pair candidates with the library's existing files for their album
    pub include_existing: bool,
    /// Fall back to the remote catalog when the mirror has nothing
    pub add_new_artists: bool,
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        Self {
            new_download: false,
            single_release: false,
            include_existing: true,
            add_new_artists: true,
        }
    }
}

/// Distinct values with their counts, most common first. Ties keep first
/// occurrence order.
pub(crate) fn count_distinct<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Vec<(T, usize)> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Most frequent value; ties go to whichever appeared first.
pub(crate) fn most_common<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Option<T> {
    count_distinct(values).into_iter().next().map(|(value, _)| value)
}

/// Group items by key, groups and members in first-occurrence order.
pub(crate) fn group_by<T, K: PartialEq>(items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<(K, Vec<T>)> {
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(item),
            None => groups.push((k, vec![item])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identification::distance::Factor;

    fn local(path: &str) -> LocalTrack {
        LocalTrack::new(path, ParsedTrackInfo::default())
    }

    #[test]
    fn test_most_common_prefers_first_on_tie() {
        assert_eq!(most_common(["b", "a", "a", "b"]), Some("b"));
        assert_eq!(most_common(["b", "a", "a"]), Some("a"));
        assert_eq!(most_common(Vec::<&str>::new()), None);
    }

    #[test]
    fn test_count_distinct_orders_by_count() {
        let counts = count_distinct([Some("x"), None, None, Some("y")]);
        assert_eq!(counts, vec![(None, 2), (Some("x"), 1), (Some("y"), 1)]);
    }

    #[test]
    fn test_group_by_keeps_order() {
        let groups = group_by(vec![1, 2, 3, 4, 5], |n| n % 2);
        assert_eq!(groups, vec![(1, vec![1, 3, 5]), (0, vec![2, 4])]);
    }

    #[test]
    fn test_worst_track_distance() {
        let mut mapping = TrackMapping::default();
        assert_eq!(mapping.worst_track_distance(), 1.0);

        for penalty in [0.1, 0.7] {
            let mut distance = Distance::new();
            distance.add(Factor::TrackTitle, penalty);
            mapping.mapping.push(TrackMatch {
                local_path: PathBuf::from("x"),
                track: Track::default(),
                distance,
            });
        }
        assert!((mapping.worst_track_distance() - 0.7).abs() < 1e-9);
        assert!(!mapping.has_unmatched());
    }

    #[test]
    fn test_populate_match_merges_existing_and_stamps_tracks() {
        let release = AlbumRelease {
            foreign_release_id: "rel".to_string(),
            ..Default::default()
        };
        let track = Track {
            title: "One".to_string(),
            ..Default::default()
        };

        let mut batch = LocalAlbumRelease::new(vec![local("/a/1.mp3"), local("/a/2.mp3")]);
        batch.existing_tracks = vec![local("/a/2.mp3"), local("/lib/3.mp3")];
        batch.album_release = Some(release);
        batch.track_mapping = Some(TrackMapping {
            mapping: vec![TrackMatch {
                local_path: PathBuf::from("/a/1.mp3"),
                track: track.clone(),
                distance: Distance::new(),
            }],
            ..Default::default()
        });

        batch.populate_match();

        assert_eq!(batch.track_count(), 3);
        assert!(batch.existing_tracks.is_empty());
        assert!(batch
            .local_tracks
            .iter()
            .all(|t| t.matched_release.as_deref() == Some("rel")));
        assert_eq!(batch.local_tracks[0].tracks, vec![track]);
        assert!(batch.local_tracks[0].distance.is_some());
        assert!(batch.local_tracks[1].tracks.is_empty());
    }

    #[test]
    fn test_populate_match_without_release_is_noop() {
        let mut batch = LocalAlbumRelease::new(vec![local("/a/1.mp3")]);
        batch.existing_tracks = vec![local("/lib/2.mp3")];
        batch.populate_match();
        assert_eq!(batch.track_count(), 1);
        assert!(batch.local_tracks[0].matched_release.is_none());
    }
}
