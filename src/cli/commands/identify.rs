//! Release identification command.

use anyhow::Context;
use futures::StreamExt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use music_matcher::augment::FilenameAugmenter;
use music_matcher::catalog::{MemoryCatalog, MusicBrainzClient};
use music_matcher::config::{self, Config, FingerprintingMode};
use music_matcher::enrichment::{AcoustIdFingerprinter, acoustid::AcoustIdClient};
use music_matcher::identification::{
    IdentificationOverrides, IdentificationService, IdentifyOptions, LocalAlbumRelease, LocalTrack,
};
use music_matcher::metadata::LoftyTagReader;
use music_matcher::scanner;

/// Options for `identify`, flags already merged with their defaults.
#[derive(Debug, Clone)]
pub struct IdentifyArgs {
    pub path: PathBuf,
    pub single_release: bool,
    pub new_download: bool,
    pub include_existing: bool,
    /// Overrides the config file when set
    pub fingerprinting: Option<FingerprintingMode>,
    pub catalog: Option<PathBuf>,
    pub api_key: Option<String>,
    pub json: bool,
}

/// Scan a path, identify its releases and print the outcome
pub fn cmd_identify(rt: &Runtime, args: &IdentifyArgs) -> anyhow::Result<()> {
    let config = config::load();

    rt.block_on(async {
        let service = build_service(&config, args)?;
        let reader = LoftyTagReader::new();

        let paths: Vec<PathBuf> = scanner::scan(args.path.clone()).collect().await;
        if paths.is_empty() {
            println!("No audio files found in {:?}", args.path);
            return Ok(());
        }

        let mut tracks: Vec<LocalTrack> = Vec::with_capacity(paths.len());
        for path in &paths {
            match scanner::local_track(path, &reader) {
                Ok(track) => tracks.push(track),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping file"),
            }
        }

        let options = IdentifyOptions {
            new_download: args.new_download,
            single_release: args.single_release,
            include_existing: args.include_existing && config.import.include_existing,
            add_new_artists: config.import.add_new_artists,
        };
        let releases = service
            .identify(tracks, &IdentificationOverrides::default(), &options)
            .await
            .context("identification failed")?;

        if args.json {
            let report: Vec<BatchReport> = releases.iter().map(BatchReport::from).collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_releases(&releases);
        }
        Ok(())
    })
}

fn build_service(config: &Config, args: &IdentifyArgs) -> anyhow::Result<IdentificationService> {
    let catalog = match args.catalog.as_ref().or(config.catalog.path.as_ref()) {
        Some(path) => {
            MemoryCatalog::load(path).with_context(|| format!("failed to load catalog {:?}", path))?
        }
        None => {
            tracing::info!("No catalog mirror configured, relying on MusicBrainz");
            MemoryCatalog::default()
        }
    };

    let remote = MusicBrainzClient::new(&config.catalog.musicbrainz_url, config.catalog.remote_search_limit)?;

    let mut fingerprinting = args.fingerprinting.unwrap_or(config.import.fingerprinting);
    let api_key = args
        .api_key
        .clone()
        .or_else(|| config.credentials.acoustid_api_key.clone());
    let fingerprinter = match api_key {
        Some(key) => AcoustIdFingerprinter::new(key)?,
        None => {
            if fingerprinting != FingerprintingMode::Never {
                tracing::warn!("No AcoustID API key, fingerprinting disabled");
                fingerprinting = FingerprintingMode::Never;
            }
            // never called with fingerprinting off
            AcoustIdFingerprinter::with_parts(AcoustIdClient::new("")?, None)
        }
    };

    Ok(IdentificationService::new(
        Arc::new(LoftyTagReader::new()),
        Arc::new(FilenameAugmenter::new()),
        Arc::new(fingerprinter),
        Arc::new(catalog),
        Arc::new(remote),
        fingerprinting,
    ))
}

fn print_releases(releases: &[LocalAlbumRelease]) {
    for (i, release) in releases.iter().enumerate() {
        if i > 0 {
            println!();
        }
        match &release.album_release {
            Some(album_release) => {
                println!(
                    "✓ {} - {} ({} tracks, distance {:.3})",
                    album_release.album.artist_metadata.name,
                    album_release.title,
                    release.track_count(),
                    release.distance.normalized_distance()
                );
                println!(
                    "  MusicBrainz: https://musicbrainz.org/release/{}",
                    album_release.foreign_release_id
                );
            }
            None => println!("✗ No match ({} tracks)", release.track_count()),
        }

        for track in &release.local_tracks {
            let name = track
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match track.tracks.first() {
                Some(matched) => println!(
                    "  {:>2}-{:<3} {}  ->  {}",
                    matched.medium_number, matched.absolute_track_number, name, matched.title
                ),
                None => println!("         {}", name),
            }
        }
    }
}

/// One batch in `--json` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchReport {
    release_id: Option<String>,
    artist: Option<String>,
    title: Option<String>,
    distance: Option<f64>,
    tracks: Vec<TrackReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackReport {
    path: PathBuf,
    existing: bool,
    recording_id: Option<String>,
    title: Option<String>,
    medium: Option<u32>,
    number: Option<u32>,
    distance: Option<f64>,
}

impl From<&LocalAlbumRelease> for BatchReport {
    fn from(release: &LocalAlbumRelease) -> Self {
        let matched = release.album_release.as_ref();
        Self {
            release_id: matched.map(|r| r.foreign_release_id.clone()),
            artist: matched.map(|r| r.album.artist_metadata.name.clone()),
            title: matched.map(|r| r.title.clone()),
            distance: matched.map(|_| release.distance.normalized_distance()),
            tracks: release
                .local_tracks
                .iter()
                .map(|t| {
                    let track = t.tracks.first();
                    TrackReport {
                        path: t.path.clone(),
                        existing: t.existing_file,
                        recording_id: track.map(|m| m.foreign_recording_id.clone()),
                        title: track.map(|m| m.title.clone()),
                        medium: track.map(|m| m.medium_number),
                        number: track.map(|m| m.absolute_track_number),
                        distance: t.distance.as_ref().map(|d| d.normalized_distance()),
                    }
                })
                .collect(),
        }
    }
}
