//! Adapter layer: Convert MusicBrainz DTOs to catalog models
//!
//! This is the ONLY place where DTO types are converted to catalog types.
//! Releases fetched remotely aren't in the mirror, so every local id is 0.

use chrono::NaiveDate;

use super::dto;
use crate::identification::calculator::country_name;
use crate::model::{Album, AlbumRelease, ArtistMetadata, Medium, Track};

/// Convert a MusicBrainz release to a catalog release with its tracks.
pub fn to_album_release(release: dto::Release) -> AlbumRelease {
    let artist = release
        .artist_credit
        .as_deref()
        .or_else(|| release.release_group.as_ref().and_then(|rg| rg.artist_credit.as_deref()))
        .map(primary_artist)
        .unwrap_or_default();

    let album = match &release.release_group {
        Some(rg) => Album {
            foreign_album_id: rg.id.clone(),
            title: rg.title.clone(),
            release_date: rg.first_release_date.as_deref().and_then(parse_date),
            artist_metadata: artist.clone(),
            ..Default::default()
        },
        None => Album {
            title: release.title.clone(),
            artist_metadata: artist.clone(),
            ..Default::default()
        },
    };

    let media = release
        .media
        .iter()
        .enumerate()
        .map(|(i, m)| Medium {
            number: m.position.unwrap_or(i as u32 + 1),
            name: m.title.clone().unwrap_or_default(),
            format: m.format.clone().unwrap_or_else(|| "Unknown".to_string()),
        })
        .collect();

    let tracks: Vec<Track> = release
        .media
        .iter()
        .enumerate()
        .flat_map(|(i, m)| {
            let medium_number = m.position.unwrap_or(i as u32 + 1);
            let artist = &artist;
            m.tracks.iter().map(move |t| to_track(t, medium_number, artist))
        })
        .collect();

    AlbumRelease {
        foreign_release_id: release.id,
        title: release.title,
        status: release.status.unwrap_or_default(),
        disambiguation: release.disambiguation.unwrap_or_default(),
        release_date: release.date.as_deref().and_then(parse_date),
        country: countries(&release.release_events, release.country.as_deref()),
        label: release
            .label_info
            .iter()
            .filter_map(|li| li.label.as_ref().map(|l| l.name.clone()))
            .collect(),
        media,
        track_count: tracks.len(),
        album,
        tracks,
        ..Default::default()
    }
}

fn to_track(track: &dto::Track, medium_number: u32, release_artist: &ArtistMetadata) -> Track {
    let recording = track.recording.as_ref();
    Track {
        foreign_track_id: track.id.clone(),
        foreign_recording_id: recording.map(|r| r.id.clone()).unwrap_or_default(),
        title: track
            .title
            .clone()
            .or_else(|| recording.map(|r| r.title.clone()))
            .unwrap_or_default(),
        absolute_track_number: track.position.unwrap_or(0),
        medium_number,
        duration: track.length.or_else(|| recording.and_then(|r| r.length)).unwrap_or(0),
        artist_metadata: track
            .artist_credit
            .as_deref()
            .map(primary_artist)
            .unwrap_or_else(|| release_artist.clone()),
        ..Default::default()
    }
}

/// First credited artist; its id decides various-artists handling.
fn primary_artist(credits: &[dto::ArtistCredit]) -> ArtistMetadata {
    credits
        .first()
        .map(|c| ArtistMetadata {
            foreign_artist_id: c.artist.id.clone(),
            name: c.artist.name.clone(),
            ..Default::default()
        })
        .unwrap_or_default()
}

/// Area names from release events, else the name for the bare country code.
fn countries(events: &[dto::ReleaseEvent], code: Option<&str>) -> Vec<String> {
    let names: Vec<String> = events
        .iter()
        .filter_map(|e| e.area.as_ref().map(|a| a.name.clone()))
        .collect();
    if !names.is_empty() {
        return names;
    }
    code.and_then(country_name)
        .map(|name| vec![name.to_string()])
        .unwrap_or_default()
}

/// Parse YYYY, YYYY-MM or YYYY-MM-DD; missing parts default to 1.
fn parse_date(date: &str) -> Option<NaiveDate> {
    let mut parts = date.split('-');
    let year = parts.next()?.parse().ok()?;
    let month = parts.next().and_then(|m| m.parse().ok()).unwrap_or(1);
    let day = parts.next().and_then(|d| d.parse().ok()).unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)
}
