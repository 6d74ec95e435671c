//! Test utilities and fixtures for music-matcher tests.
//!
//! Builders for catalog data and for local tracks whose tags agree with a
//! given release, so tests only spell out what they change.
//!
//! # Example
//!
//! ```ignore
//! use music_matcher::test_utils::*;
//!
//! let artist = artist_metadata(1, "artist");
//! let album = album(1, "album", &artist);
//! let release = album_release(1, &album, catalog_tracks(1, 3, &artist));
//! let mut local = local_tracks_for(&release);
//! local[0].file_track_info.track_numbers = vec![2];
//! ```

use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

use crate::identification::local::LocalTrack;
use crate::metadata::{ParsedTrackInfo, clean_track_title};
use crate::model::{Album, AlbumRelease, Artist, ArtistMetadata, Medium, Track, TrackFile};

const TITLES: [&str; 10] = [
    "Positive Vibration",
    "Roots, Rock, Reggae",
    "Johnny Was",
    "Cry to Me",
    "Want More",
    "Crazy Baldhead",
    "Who the Cap Fit",
    "Night Shift",
    "War",
    "Rat Race",
];

pub fn artist_metadata(id: i64, name: &str) -> ArtistMetadata {
    ArtistMetadata {
        id,
        foreign_artist_id: format!("artist-mbid-{}", id),
        name: name.to_string(),
    }
}

pub fn library_artist(metadata: &ArtistMetadata) -> Artist {
    Artist {
        id: metadata.id,
        artist_metadata_id: metadata.id,
        metadata: metadata.clone(),
        metadata_profile: None,
    }
}

/// `count` tracks on medium 1, numbered from 1, three minutes and change
/// each, with distinct titles and recording ids.
pub fn catalog_tracks(release_id: i64, count: usize, artist: &ArtistMetadata) -> Vec<Track> {
    (0..count)
        .map(|i| {
            let title = if i < TITLES.len() {
                TITLES[i].to_string()
            } else {
                format!("{} (Part {})", TITLES[i % TITLES.len()], i / TITLES.len() + 1)
            };
            Track {
                id: release_id * 100 + i as i64,
                album_release_id: release_id,
                foreign_track_id: format!("track-{}-{}", release_id, i),
                foreign_recording_id: format!("recording-{}-{}", release_id, i),
                old_foreign_recording_ids: Vec::new(),
                title,
                absolute_track_number: i as u32 + 1,
                medium_number: 1,
                duration: 180_000 + i as u64 * 7_000,
                artist_metadata: artist.clone(),
            }
        })
        .collect()
}

pub fn album(id: i64, title: &str, artist: &ArtistMetadata) -> Album {
    Album {
        id,
        artist_metadata_id: artist.id,
        foreign_album_id: format!("album-mbid-{}", id),
        title: title.to_string(),
        release_date: NaiveDate::from_ymd_opt(1976, 4, 30),
        artist_metadata: artist.clone(),
    }
}

/// A release of `album` carrying `tracks`, one medium per medium number
/// used, released in the United States on "label".
pub fn album_release(id: i64, album: &Album, tracks: Vec<Track>) -> AlbumRelease {
    let media_count = tracks.iter().map(|t| t.medium_number).max().unwrap_or(1);
    AlbumRelease {
        id,
        album_id: album.id,
        foreign_release_id: format!("release-mbid-{}", id),
        old_foreign_release_ids: Vec::new(),
        title: album.title.clone(),
        status: "Official".to_string(),
        disambiguation: String::new(),
        release_date: album.release_date,
        country: vec!["United States".to_string()],
        label: vec!["label".to_string()],
        media: (1..=media_count)
            .map(|number| Medium {
                number,
                name: String::new(),
                format: "CD".to_string(),
            })
            .collect(),
        track_count: tracks.len(),
        album: album.clone(),
        tracks,
    }
}

/// Tags that agree with `track` on `release` in every respect.
pub fn parsed_info_for(track: &Track, release: &AlbumRelease) -> ParsedTrackInfo {
    ParsedTrackInfo {
        title: Some(track.title.clone()),
        clean_title: Some(clean_track_title(&track.title)),
        artist_title: Some(track.artist_metadata.name.clone()),
        album_title: Some(release.title.clone()),
        artist_mbid: Some(track.artist_metadata.foreign_artist_id.clone()),
        album_mbid: Some(release.album.foreign_album_id.clone()),
        release_mbid: Some(release.foreign_release_id.clone()),
        recording_mbid: Some(track.foreign_recording_id.clone()),
        track_mbid: Some(track.foreign_track_id.clone()),
        track_numbers: vec![track.absolute_track_number],
        disc_number: track.medium_number,
        disc_count: release.media.len() as u32,
        country: Some("US".to_string()),
        year: release.album.year().unwrap_or(0) as u32,
        label: release.label.first().cloned(),
        catalog_number: None,
        disambiguation: Some(release.disambiguation.clone()).filter(|d| !d.is_empty()),
        duration: Duration::from_millis(track.duration),
    }
}

pub fn local_track_for(track: &Track, release: &AlbumRelease) -> LocalTrack {
    let path = PathBuf::from("/music/incoming")
        .join(&release.title)
        .join(format!("{:02} - {}.flac", track.absolute_track_number, track.title));
    LocalTrack {
        size: 30_000_000,
        ..LocalTrack::new(path, parsed_info_for(track, release))
    }
}

pub fn local_tracks_for(release: &AlbumRelease) -> Vec<LocalTrack> {
    release
        .tracks
        .iter()
        .map(|t| local_track_for(t, release))
        .collect()
}

pub fn track_file(id: i64, album_id: i64, path: &str) -> TrackFile {
    TrackFile {
        id,
        album_id,
        path: PathBuf::from(path),
        size: 30_000_000,
        modified: None,
    }
}
