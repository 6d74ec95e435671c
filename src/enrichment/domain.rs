//! Internal types for fingerprint identification.
//!
//! These types are OUR types - they don't change when external APIs change.
//! AcoustID responses get converted into these via the adapter.

/// Audio fingerprint for a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFingerprint {
    /// The fingerprint string (Chromaprint format)
    pub fingerprint: String,
    /// Duration of the audio in seconds (required by AcoustID)
    pub duration_secs: u32,
}

/// A MusicBrainz recording an AcoustID fingerprint resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingMatch {
    pub recording_id: String,
    /// Score of the AcoustID result the recording came from (0.0 to 1.0)
    pub score: f64,
}

/// Errors that can occur during fingerprinting
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Failed to generate fingerprint: {0}")]
    FingerprintError(String),

    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No matches found for fingerprint")]
    NoMatches,

    #[error("Rate limited - try again later")]
    RateLimited,

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl EnrichmentError {
    /// Errors that only affect the current request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited | Self::NoMatches | Self::FingerprintError(_)
        )
    }
}

/// Recording ids scoring at least `threshold`, best first, without duplicates.
pub fn recording_ids_above(mut matches: Vec<RecordingMatch>, threshold: f64) -> Vec<String> {
    matches.retain(|m| m.score >= threshold);
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut ids: Vec<String> = Vec::with_capacity(matches.len());
    for m in matches {
        if !ids.contains(&m.recording_id) {
            ids.push(m.recording_id);
        }
    }
    ids
}
