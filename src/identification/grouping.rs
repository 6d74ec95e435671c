//! Splitting a scanned batch into release-sized groups.
//!
//! Three passes, each only seeing what the previous one rejected:
//! 1. by parent directory, with `CD1`/`Disc 2`/... sibling folders merged
//! 2. by album tag
//! 3. by (artist tag, album tag), accepted unconditionally

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::distance::levenshtein_coefficient;
use super::local::{LocalAlbumRelease, LocalTrack, count_distinct, group_by};
use crate::metadata::is_blank;

/// Album tags must agree for 75% of tracks, at most 25% distinct.
pub const ALBUM_TAG_THRESHOLD: f64 = 0.25;
/// Same for artist tags (unless the batch is various artists).
pub const ARTIST_TAG_THRESHOLD: f64 = 0.25;
/// No artist covering 25% of tracks means various artists.
pub const VARIOUS_ARTISTS_THRESHOLD: f64 = 0.75;
/// Tag values more similar than this count as the same value.
pub const TAG_FUZZ: f64 = 0.9;

/// Artist tags that mean "compilation".
pub const VARIOUS_ARTIST_TITLES: [&str; 5] = ["", "various artists", "various", "va", "unknown"];

static MULTI_DISC_START: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["dis[ck]", "cd"]
        .iter()
        .map(|marker| {
            Regex::new(&format!(r"(?i)^(?P<root>.*{}[\W_]*)\d", marker)).expect("valid regex")
        })
        .collect()
});

/// Partition `tracks` into batches that each look like one release.
pub fn group_tracks(tracks: Vec<LocalTrack>) -> Vec<LocalAlbumRelease> {
    let mut releases = Vec::new();

    // first attempt, assume grouped by folder
    let mut unprocessed = Vec::new();
    for group in group_by_directory(tracks) {
        if looks_like_single_release(&group) {
            releases.push(LocalAlbumRelease::new(group));
        } else {
            unprocessed.extend(group);
        }
    }

    // album tag picks up compilations spread over folders
    let mut unprocessed_by_album = Vec::new();
    for (_, group) in group_by(unprocessed, |t| t.file_track_info.album_title.clone()) {
        debug!("Falling back to grouping by album tag");
        if looks_like_single_release(&group) {
            releases.push(LocalAlbumRelease::new(group));
        } else {
            unprocessed_by_album.extend(group);
        }
    }

    let by_artist_and_album = group_by(unprocessed_by_album, |t| {
        (
            t.file_track_info.artist_title.clone(),
            t.file_track_info.album_title.clone(),
        )
    });
    for (_, group) in by_artist_and_album {
        debug!("Falling back to grouping by album+artist tag");
        releases.push(LocalAlbumRelease::new(group));
    }

    debug!(batches = releases.len(), "Grouped tracks");
    releases
}

/// True if a dominant value (after fuzzy merging) covers enough entries.
///
/// Fails when more than one distinct value remains and either the distinct
/// share exceeds `threshold` or the dominant share falls below
/// `1 - threshold`.
pub fn has_common_entry(values: &[Option<&str>], threshold: f64, fuzz: f64) -> bool {
    let groups = count_distinct(values.iter().copied());
    let Some(&(most_common, count)) = groups.first() else {
        return true;
    };

    let mut distinct_count = groups.len();
    let mut most_common_count = count;
    let total = values.len() as f64;

    // merge groups that are close to the most common value
    for &(value, count) in groups.iter().skip(1) {
        if let (Some(a), Some(b)) = (most_common, value)
            && !a.trim().is_empty()
            && !b.trim().is_empty()
            && levenshtein_coefficient(a, b) > fuzz
        {
            distinct_count -= 1;
            most_common_count += count;
        }
    }

    trace!(
        distinct_count,
        most_common_count,
        total_count = values.len(),
        "Tag consensus"
    );

    !(distinct_count > 1
        && (distinct_count as f64 / total > threshold
            || (most_common_count as f64) / total < 1.0 - threshold))
}

/// True if the tracks plausibly belong to one release.
pub fn looks_like_single_release(tracks: &[LocalTrack]) -> bool {
    // tagged ids must not disagree
    let distinct_ids = |id: fn(&LocalTrack) -> Option<&str>| {
        count_distinct(tracks.iter().map(id))
            .into_iter()
            .filter(|(value, _)| !is_blank(*value))
            .count()
    };
    if distinct_ids(|t| t.file_track_info.album_mbid.as_deref()) > 1
        || distinct_ids(|t| t.file_track_info.release_mbid.as_deref()) > 1
    {
        trace!("looks_like_single_release: MBIDs are not unique");
        return false;
    }

    let album_tags: Vec<Option<&str>> = tracks.iter().map(LocalTrack::album_title).collect();
    if !has_common_entry(&album_tags, ALBUM_TAG_THRESHOLD, TAG_FUZZ) {
        trace!("looks_like_single_release: No common album tag");
        return false;
    }

    if !is_various_artists(tracks) {
        let artist_tags: Vec<Option<&str>> = tracks.iter().map(LocalTrack::artist_title).collect();
        if !has_common_entry(&artist_tags, ARTIST_TAG_THRESHOLD, TAG_FUZZ) {
            trace!("looks_like_single_release: No common artist tag");
            return false;
        }
    }

    true
}

/// True if no artist dominates, or the dominant artist tag is a
/// compilation placeholder like "Various Artists".
pub fn is_various_artists(tracks: &[LocalTrack]) -> bool {
    let artist_tags: Vec<Option<&str>> = tracks.iter().map(LocalTrack::artist_title).collect();

    if !has_common_entry(&artist_tags, VARIOUS_ARTISTS_THRESHOLD, TAG_FUZZ) {
        return true;
    }

    // an untagged artist is unknown, not a compilation
    matches!(
        count_distinct(artist_tags).first(),
        Some((Some(artist), _)) if is_various_artists_title(artist)
    )
}

/// Case-insensitive match against [`VARIOUS_ARTIST_TITLES`].
pub fn is_various_artists_title(artist: &str) -> bool {
    VARIOUS_ARTIST_TITLES
        .iter()
        .any(|va| va.eq_ignore_ascii_case(artist))
}

/// Group by parent directory, merging runs of multi-disc folders such as
/// `Album/CD1`, `Album/CD2` or `Album Disc 1`, `Album Disc 2`.
fn group_by_directory(tracks: Vec<LocalTrack>) -> Vec<Vec<LocalTrack>> {
    let parent = |t: &LocalTrack| -> PathBuf {
        t.path.parent().map(Path::to_path_buf).unwrap_or_default()
    };

    let mut folders: Vec<PathBuf> = tracks.iter().map(parent).collect();
    folders.sort();
    folders.dedup();
    trace!(?folders, "Folders");

    let mut by_folder = group_by(tracks, parent);
    let mut take_folder = |folder: &Path| -> Vec<LocalTrack> {
        by_folder
            .iter_mut()
            .find(|(f, _)| f == folder)
            .map(|(_, members)| std::mem::take(members))
            .unwrap_or_default()
    };

    let mut groups = Vec::new();
    let mut output: Vec<LocalTrack> = Vec::new();
    let mut subdir_regex: Option<Regex> = None;

    for folder in &folders {
        let name = folder.to_string_lossy();

        if subdir_regex.as_ref().is_some_and(|re| re.is_match(&name)) {
            // current folder continues a multi-disc run
            output.extend(take_folder(folder));
            continue;
        }

        // finished a multi-disc run, emit it before looking at this folder
        if !output.is_empty() {
            groups.push(std::mem::take(&mut output));
        }

        output.extend(take_folder(folder));
        subdir_regex = multi_disc_regex(&name);

        if subdir_regex.is_none() {
            groups.push(std::mem::take(&mut output));
        }
    }

    if !output.is_empty() {
        groups.push(output);
    }

    groups
}

/// If `folder` looks like the first disc of a set, a regex matching its
/// sibling disc folders.
fn multi_disc_regex(folder: &str) -> Option<Regex> {
    MULTI_DISC_START.iter().find_map(|start| {
        let root = start.captures(folder)?.name("root")?.as_str();
        Regex::new(&format!(r"(?i)^{}\d+$", regex::escape(root))).ok()
    })
}
