//! Finds audio files and turns them into local tracks.

use chrono::{DateTime, Utc};
use futures::stream::Stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::identification::local::LocalTrack;
use crate::identification::traits::TagReader;

/// Extensions treated as audio, lowercase.
pub const AUDIO_EXTENSIONS: [&str; 7] = ["mp3", "flac", "ogg", "opus", "wav", "m4a", "wma"];

/// True if the path has an audio extension (case-insensitive).
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Scans the given root recursively for audio files.
///
/// A root that is itself an audio file yields just that file. Entries
/// within a directory come out in file name order.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        let entries = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::debug!(root = %root.display(), error = %err, "Skipping unreadable entry");
                    None
                }
            });

        for entry in entries {
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                // receiver dropped, stop scanning
                if tx.blocking_send(entry.into_path()).is_err() {
                    break;
                }
            }
        }
    });

    // Convert the mpsc Receiver into a Stream
    futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|path| (path, rx)) })
}

/// Build a local track from a file's size, modification time and tags.
///
/// Unreadable tags leave the parsed info empty; a missing file is an error.
pub fn local_track(path: &Path, reader: &dyn TagReader) -> Result<LocalTrack> {
    if !path.exists() {
        return Err(Error::not_found(path));
    }
    let metadata = std::fs::metadata(path)?;
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);

    let file_track_info = match reader.read_tags(path) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read tags");
            Default::default()
        }
    };

    Ok(LocalTrack {
        size: metadata.len(),
        modified,
        ..LocalTrack::new(path, file_track_info)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identification::traits::mocks::MockTagReader;
    use crate::metadata::ParsedTrackInfo;
    use futures::StreamExt;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scan_audio_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        File::create(root.join("song.mp3")).unwrap();
        File::create(root.join("music.flac")).unwrap();
        File::create(root.join("notes.txt")).unwrap(); // Should be ignored
        File::create(root.join("cover.png")).unwrap(); // Should be ignored
        File::create(root.join("UPPERCASE.OGG")).unwrap(); // Should be found (case-insensitive)

        let subdir = root.join("CD2");
        std::fs::create_dir(&subdir).unwrap();
        File::create(subdir.join("track.opus")).unwrap();
        File::create(subdir.join("ignore.cue")).unwrap();

        let paths: Vec<PathBuf> = scan(root.to_path_buf()).collect().await;

        let file_names: Vec<&str> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(file_names.len(), 4);
        assert!(file_names.contains(&"song.mp3"));
        assert!(file_names.contains(&"music.flac"));
        assert!(file_names.contains(&"track.opus"));
        assert!(file_names.contains(&"UPPERCASE.OGG"));
    }

    #[tokio::test]
    async fn test_scan_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("01 - Intro.flac");
        File::create(&file).unwrap();

        let paths: Vec<PathBuf> = scan(file.clone()).collect().await;

        assert_eq!(paths, vec![file]);
    }

    #[tokio::test]
    async fn test_scan_missing_root_is_empty() {
        let paths: Vec<PathBuf> = scan(PathBuf::from("/nonexistent/music")).collect().await;
        assert!(paths.is_empty());
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("/a/b.FLAC")));
        assert!(is_audio_file(Path::new("b.m4a")));
        assert!(!is_audio_file(Path::new("b.jpg")));
        assert!(!is_audio_file(Path::new("flac")));
    }

    #[test]
    fn test_local_track_reads_size_and_tags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("01.flac");
        File::create(&path).unwrap().write_all(&[0u8; 128]).unwrap();
        let info = ParsedTrackInfo {
            title: Some("Intro".to_string()),
            ..Default::default()
        };
        let reader = MockTagReader::with_tags([(path.clone(), info.clone())]);

        let track = local_track(&path, &reader).unwrap();

        assert_eq!(track.size, 128);
        assert!(track.modified.is_some());
        assert_eq!(track.file_track_info, info);
        assert!(!track.existing_file);
    }

    #[test]
    fn test_local_track_with_unreadable_tags() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.mp3");
        File::create(&path).unwrap();

        let track = local_track(&path, &MockTagReader::default()).unwrap();

        assert_eq!(track.file_track_info, ParsedTrackInfo::default());
    }

    #[test]
    fn test_local_track_missing_file() {
        let result = local_track(Path::new("/nonexistent/01.mp3"), &MockTagReader::default());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
