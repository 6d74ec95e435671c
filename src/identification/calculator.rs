//! Track and release distances, and the local-to-catalog track mapping.

use chrono::{Datelike, Utc};
use tracing::trace;

use super::distance::{Distance, Factor};
use super::grouping::is_various_artists_title;
use super::local::{LocalTrack, TrackMapping, TrackMatch, most_common};
use super::munkres;
use crate::model::{AlbumRelease, Track};

/// Catalog ids of the "Various Artists" pseudo-artist.
pub const VARIOUS_ARTIST_IDS: [&str; 1] = ["89ad4ac3-39f7-470e-963a-56509c546377"];

/// Release countries in order of preference when the files don't say.
pub const PREFERRED_COUNTRIES: [&str; 4] = ["United States", "United Kingdom", "Europe", "[Worldwide]"];

/// Slack before track length differences start to count, in seconds.
const TRACK_LENGTH_GRACE: f64 = 10.0;
/// Difference (beyond the grace) that costs a full penalty, in seconds.
const TRACK_LENGTH_MAX: f64 = 30.0;

/// Position of `track` counting every track on earlier media.
pub fn total_track_number(track: &Track, all_tracks: &[Track]) -> u32 {
    let earlier = all_tracks
        .iter()
        .filter(|t| t.medium_number < track.medium_number)
        .count() as u32;
    track.absolute_track_number + earlier
}

fn track_index_incorrect(local: &LocalTrack, mb_track: &Track, total_track_number: u32) -> bool {
    let number = local.file_track_info.track_number();
    number != mb_track.absolute_track_number && number != total_track_number
}

/// Distance between one local file and one catalog track.
pub fn track_distance(
    local: &LocalTrack,
    mb_track: &Track,
    total_track_number: u32,
    include_artist: bool,
) -> Distance {
    let mut dist = Distance::new();
    let info = &local.file_track_info;

    let local_length = info.duration.as_secs_f64();
    let mb_length = mb_track.duration / 1000;
    if mb_length > 0 {
        let diff = (local_length - mb_length as f64).abs() - TRACK_LENGTH_GRACE;
        dist.add_ratio(Factor::TrackLength, diff, TRACK_LENGTH_MAX);
    }

    // catalog titles never carry featuring credits, so compare the cleaned one
    dist.add_string(
        Factor::TrackTitle,
        info.clean_title.as_deref().unwrap_or(""),
        &mb_track.title,
    );

    if include_artist
        && let Some(artist) = info.artist_title.as_deref()
        && !artist.trim().is_empty()
        && !is_various_artists_title(artist)
    {
        dist.add_string(Factor::TrackArtist, artist, &mb_track.artist_metadata.name);
    }

    if info.track_number() > 0 && mb_track.absolute_track_number > 0 {
        dist.add_bool(
            Factor::TrackIndex,
            track_index_incorrect(local, mb_track, total_track_number),
        );
    }

    if let Some(recording_id) = info.recording_mbid.as_deref()
        && !recording_id.trim().is_empty()
    {
        dist.add_bool(Factor::RecordingId, !mb_track.has_recording_id(recording_id));
    }

    // fingerprinted files
    if let Some(results) = &local.acoustid_results {
        dist.add_bool(
            Factor::RecordingId,
            !results.contains(&mb_track.foreign_recording_id),
        );
    }

    dist
}

/// Distance between a pool of local tracks and a candidate release, given
/// the track mapping between them.
pub fn album_release_distance(
    local_tracks: &[LocalTrack],
    release: &AlbumRelease,
    mapping: &TrackMapping,
) -> Distance {
    let mut dist = Distance::new();
    let album = &release.album;
    let tags = || local_tracks.iter().map(|t| &t.file_track_info);

    if !VARIOUS_ARTIST_IDS.contains(&album.artist_metadata.foreign_artist_id.as_str()) {
        let artist = most_common(tags().map(|i| i.artist_title.as_deref())).flatten().unwrap_or("");
        dist.add_string(Factor::Artist, artist, &album.artist_metadata.name);
        trace!("artist: {} vs {}; {}", artist, album.artist_metadata.name, dist);
    }

    // album title rather than release title: release titles in tags are
    // often wrong and differ between pressings
    let title = most_common(tags().map(|i| i.album_title.as_deref())).flatten().unwrap_or("");
    dist.add_string(Factor::Album, title, &album.title);
    trace!("album: {} vs {}; {}", title, album.title, dist);

    // number of discs, as tagged or the highest disc number seen
    let disc_count = match most_common(tags().map(|i| i.disc_count)).unwrap_or(0) {
        0 => tags().map(|i| i.disc_number).max().unwrap_or(0),
        n => n,
    };
    if disc_count > 0 {
        dist.add_number(Factor::MediaCount, disc_count as i64, release.media.len() as i64);
        trace!("media_count: {} vs {}; {}", disc_count, release.media.len(), dist);
    }

    if release.media.iter().any(|m| m.format == "Unknown") {
        dist.add(Factor::MediaFormat, 1.0);
    }

    let local_year = most_common(tags().map(|i| i.year)).unwrap_or(0) as i32;
    if local_year > 0 && (album.release_date.is_some() || release.release_date.is_some()) {
        let album_year = album.year().unwrap_or(0);
        let release_year = release.year().unwrap_or(0);
        if local_year == album_year || local_year == release_year {
            dist.add(Factor::Year, 0.0);
        } else {
            let remote_year = if album_year > 0 { album_year } else { release_year };
            let diff = (local_year - remote_year).abs();
            let diff_max = (Utc::now().year() - remote_year).abs();
            dist.add_ratio(Factor::Year, diff as f64, diff_max as f64);
        }
        trace!("year: {} vs {:?} or {:?}; {}", local_year, album.year(), release.year(), dist);
    }

    // a country tag on the files wins, otherwise fall back to preference
    let country = most_common(tags().map(|i| i.country.as_deref()))
        .flatten()
        .and_then(country_name);
    if release.country.is_empty() {
        // full penalty if the catalog release has no country
        dist.add(Factor::Country, 1.0);
    } else if let Some(country) = country {
        dist.add_equality(Factor::Country, country, &release.country);
        trace!("country: {} vs {}; {}", country, release.country.join(", "), dist);
    } else {
        dist.add_priority_list(Factor::Country, &release.country, &PREFERRED_COUNTRIES);
        trace!("country priority: {}; {}", release.country.join(", "), dist);
    }

    let label = most_common(tags().map(|i| i.label.as_deref())).flatten();
    if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
        dist.add_equality(Factor::Label, label, &release.label);
        trace!("label: {} vs {}; {}", label, release.label.join(", "), dist);
    }

    let disambiguation = most_common(tags().map(|i| i.disambiguation.as_deref())).flatten();
    if let Some(disambiguation) = disambiguation.filter(|d| !d.trim().is_empty()) {
        dist.add_string(Factor::AlbumDisambiguation, disambiguation, &release.disambiguation);
        trace!("album_disambiguation: {} vs {}; {}", disambiguation, release.disambiguation, dist);
    }

    let release_id = most_common(tags().map(|i| i.release_mbid.as_deref())).flatten();
    if let Some(release_id) = release_id.filter(|id| !id.trim().is_empty()) {
        dist.add_bool(Factor::AlbumId, !release.has_foreign_id(release_id));
        trace!("album_id: {} vs {}; {}", release_id, release.foreign_release_id, dist);
    }

    for pair in &mapping.mapping {
        dist.add(Factor::Tracks, pair.distance.normalized_distance());
    }
    trace!("after track mapping: {}", dist);

    for _ in mapping.mb_extra.iter().take(local_tracks.len()) {
        dist.add(Factor::MissingTracks, 1.0);
    }
    trace!("after missing tracks: {}", dist);

    let catalog_count = mapping.mapping.len() + mapping.mb_extra.len();
    for _ in mapping.local_extra.iter().take(catalog_count) {
        dist.add(Factor::UnmatchedTracks, 1.0);
    }
    trace!("after unmatched tracks: {}", dist);

    dist
}

/// Assign local tracks to catalog tracks with minimal total track distance.
/// Track artists are not compared.
pub fn map_release_tracks(local_tracks: &[LocalTrack], mb_tracks: &[Track]) -> TrackMapping {
    let mut distances: Vec<Vec<Distance>> = Vec::with_capacity(local_tracks.len());
    for local in local_tracks {
        let row = mb_tracks
            .iter()
            .map(|mb| track_distance(local, mb, total_track_number(mb, mb_tracks), false))
            .collect();
        distances.push(row);
    }
    let costs: Vec<Vec<f64>> = distances
        .iter()
        .map(|row| row.iter().map(Distance::normalized_distance).collect())
        .collect();

    let solution = munkres::solve(&costs);

    let mut local_matched = vec![false; local_tracks.len()];
    let mut mb_matched = vec![false; mb_tracks.len()];
    let mut result = TrackMapping::default();
    for (row, col) in solution {
        trace!(
            "Mapped {:?} to {}, dist: {}",
            local_tracks[row].path, mb_tracks[col], costs[row][col]
        );
        local_matched[row] = true;
        mb_matched[col] = true;
        result.mapping.push(TrackMatch {
            local_path: local_tracks[row].path.clone(),
            track: mb_tracks[col].clone(),
            distance: distances[row][col].clone(),
        });
    }

    result.local_extra = local_tracks
        .iter()
        .zip(&local_matched)
        .filter(|(_, matched)| !**matched)
        .map(|(t, _)| t.path.clone())
        .collect();
    result.mb_extra = mb_tracks
        .iter()
        .zip(&mb_matched)
        .filter(|(_, matched)| !**matched)
        .map(|(t, _)| t.clone())
        .collect();
    trace!(unmapped = ?result.local_extra, missing = result.mb_extra.len(), "Track mapping done");

    result
}

/// Catalog country name for a tagged country (ISO code or name).
pub fn country_name(tag: &str) -> Option<&'static str> {
    let tag = tag.trim();
    COUNTRIES
        .iter()
        .find(|(code, name)| code.eq_ignore_ascii_case(tag) || name.eq_ignore_ascii_case(tag))
        .map(|(_, name)| *name)
}

// MusicBrainz release country codes, including its pseudo-regions
const COUNTRIES: [(&str, &str); 40] = [
    ("XW", "[Worldwide]"),
    ("XE", "Europe"),
    ("US", "United States"),
    ("GB", "United Kingdom"),
    ("CA", "Canada"),
    ("AU", "Australia"),
    ("NZ", "New Zealand"),
    ("IE", "Ireland"),
    ("DE", "Germany"),
    ("FR", "France"),
    ("NL", "Netherlands"),
    ("BE", "Belgium"),
    ("LU", "Luxembourg"),
    ("AT", "Austria"),
    ("CH", "Switzerland"),
    ("IT", "Italy"),
    ("ES", "Spain"),
    ("PT", "Portugal"),
    ("SE", "Sweden"),
    ("NO", "Norway"),
    ("DK", "Denmark"),
    ("FI", "Finland"),
    ("IS", "Iceland"),
    ("PL", "Poland"),
    ("CZ", "Czechia"),
    ("HU", "Hungary"),
    ("GR", "Greece"),
    ("RU", "Russian Federation"),
    ("UA", "Ukraine"),
    ("TR", "Turkey"),
    ("JP", "Japan"),
    ("KR", "Korea, Republic of"),
    ("CN", "China"),
    ("TW", "Taiwan"),
    ("IN", "India"),
    ("BR", "Brazil"),
    ("AR", "Argentina"),
    ("MX", "Mexico"),
    ("ZA", "South Africa"),
    ("JM", "Jamaica"),
];
