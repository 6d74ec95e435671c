//! Fingerprinter backed by fpcalc and AcoustID
//!
//! For each track:
//! 1. Generate audio fingerprint (via fpcalc, on a blocking thread)
//! 2. Look up fingerprint on AcoustID (returns MusicBrainz recording ids)
//! 3. Keep the recording ids scoring at least the threshold

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::enrichment::{
    acoustid::AcoustIdClient,
    domain::{EnrichmentError, recording_ids_above},
    fingerprint::Fpcalc,
};
use crate::identification::local::LocalTrack;
use crate::identification::traits::Fingerprinter;

/// Fingerprints files with fpcalc and resolves them with AcoustID.
pub struct AcoustIdFingerprinter {
    acoustid: AcoustIdClient,
    fpcalc: Option<Arc<Fpcalc>>,
}

impl AcoustIdFingerprinter {
    /// Locate fpcalc and build an AcoustID client for `api_key`.
    pub fn new(api_key: impl Into<String>) -> Result<Self, EnrichmentError> {
        let fpcalc = Fpcalc::locate();
        if fpcalc.is_none() {
            warn!("fpcalc not found, fingerprinting disabled. Install Chromaprint: https://acoustid.org/chromaprint");
        }
        Ok(Self::with_parts(AcoustIdClient::new(api_key)?, fpcalc))
    }

    pub fn with_parts(acoustid: AcoustIdClient, fpcalc: Option<Fpcalc>) -> Self {
        Self {
            acoustid,
            fpcalc: fpcalc.map(Arc::new),
        }
    }

    pub fn is_available(&self) -> bool {
        self.fpcalc.is_some()
    }

    async fn recording_ids(&self, fpcalc: &Arc<Fpcalc>, track: &LocalTrack, threshold: f64) -> Result<Vec<String>, EnrichmentError> {
        let fpcalc = Arc::clone(fpcalc);
        let path = track.path.clone();
        let fingerprint = tokio::task::spawn_blocking(move || fpcalc.fingerprint(&path))
            .await
            .map_err(|e| EnrichmentError::FingerprintError(format!("fpcalc task failed: {}", e)))??;

        let matches = self.acoustid.lookup(&fingerprint).await?;
        Ok(recording_ids_above(matches, threshold))
    }
}

#[async_trait]
impl Fingerprinter for AcoustIdFingerprinter {
    async fn lookup(&self, tracks: &mut [LocalTrack], threshold: f64) -> Result<(), EnrichmentError> {
        let Some(fpcalc) = &self.fpcalc else {
            debug!(tracks = tracks.len(), "Skipping fingerprint lookup, fpcalc unavailable");
            return Ok(());
        };

        let mut resolved = 0;
        for track in tracks.iter_mut() {
            match self.recording_ids(fpcalc, track, threshold).await {
                Ok(ids) => {
                    if !ids.is_empty() {
                        resolved += 1;
                    }
                    debug!(path = %track.path.display(), recordings = ids.len(), "Fingerprint lookup done");
                    track.acoustid_results = Some(ids);
                }
                Err(EnrichmentError::FingerprintError(e)) => {
                    warn!(path = %track.path.display(), error = %e, "Fingerprinting failed, skipping file");
                }
                Err(e) if e.is_transient() => {
                    info!(path = %track.path.display(), error = %e, "AcoustID lookup failed");
                }
                Err(e) => return Err(e),
            }
        }

        debug!(tracks = tracks.len(), resolved, "Fingerprinted tracks");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ParsedTrackInfo;

    #[tokio::test]
    async fn test_lookup_without_fpcalc_leaves_tracks_untouched() {
        let fingerprinter = AcoustIdFingerprinter::with_parts(AcoustIdClient::new("key").unwrap(), None);
        let mut tracks = vec![LocalTrack::new("/music/01.flac", ParsedTrackInfo::default())];

        fingerprinter.lookup(&mut tracks, 0.5).await.unwrap();

        assert!(!fingerprinter.is_available());
        assert!(tracks[0].acoustid_results.is_none());
    }

    #[tokio::test]
    async fn test_fpcalc_failure_skips_file() {
        let fingerprinter = AcoustIdFingerprinter::with_parts(
            AcoustIdClient::with_base_url("key", "http://127.0.0.1:9").unwrap(),
            Some(Fpcalc::at("/nonexistent/fpcalc")),
        );
        let mut tracks = vec![
            LocalTrack::new("/music/01.flac", ParsedTrackInfo::default()),
            LocalTrack::new("/music/02.flac", ParsedTrackInfo::default()),
        ];

        fingerprinter.lookup(&mut tracks, 0.5).await.unwrap();

        assert!(tracks.iter().all(|t| t.acoustid_results.is_none()));
    }
}
