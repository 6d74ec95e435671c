//! Adapter layer: Convert AcoustID DTOs to domain models
//!
//! This is the ONLY place where DTO types are converted to domain types.

use super::dto;
use crate::enrichment::domain::{EnrichmentError, RecordingMatch};

/// AcoustID error code for an unknown or invalid client key
const INVALID_API_KEY: i32 = 4;

/// AcoustID error code for too many requests
const RATE_LIMITED: i32 = 14;

/// Flatten a lookup response into scored recordings.
///
/// Every recording inherits the score of the result it was listed under.
pub fn to_recording_matches(response: dto::LookupResponse) -> Result<Vec<RecordingMatch>, EnrichmentError> {
    if response.status != "ok" {
        let error = response.error.unwrap_or(dto::ApiError {
            code: -1,
            message: "Unknown error".to_string(),
        });
        return Err(match error.code {
            RATE_LIMITED => EnrichmentError::RateLimited,
            INVALID_API_KEY => EnrichmentError::ApiError(format!("invalid API key: {}", error.message)),
            _ => EnrichmentError::ApiError(error.message),
        });
    }

    Ok(response
        .results
        .into_iter()
        .flat_map(|result| {
            let score = result.score;
            result.recordings.into_iter().map(move |recording| RecordingMatch {
                recording_id: recording.id,
                score,
            })
        })
        .collect())
}
