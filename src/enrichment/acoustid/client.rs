//! AcoustID HTTP client
//!
//! Handles communication with the AcoustID web service.
//! See: https://acoustid.org/webservice
//!
//! ## API Quirks
//!
//! ### URL Encoding Issue with Meta Parameter
//! The AcoustID API uses `+` as a separator in the `meta` parameter (e.g. `recordings+compress`).
//! Standard URL encoding converts `+` to `%2B`, which the API does NOT recognize as a separator,
//! so the URL is built by hand and reqwest's `.query()` is not used for `meta`.
//!
//! ### Rate Limit
//! Three requests per second per client key; requests are spaced accordingly.

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{adapter, dto};
use crate::enrichment::domain::{AudioFingerprint, EnrichmentError, RecordingMatch};

const DEFAULT_LOOKUP_URL: &str = "https://api.acoustid.org/v2/lookup";

const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(334);

/// AcoustID API client
pub struct AcoustIdClient {
    api_key: String,
    http_client: reqwest::Client,
    base_url: String,
    last_request: Mutex<Option<Instant>>,
}

impl AcoustIdClient {
    /// Create a new client with the given API key
    ///
    /// The client accepts gzip-compressed responses and identifies itself
    /// with a User-Agent header.
    pub fn new(api_key: impl Into<String>) -> Result<Self, EnrichmentError> {
        Self::with_base_url(api_key, DEFAULT_LOOKUP_URL)
    }

    /// Create a client against a different lookup endpoint
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EnrichmentError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            http_client,
            base_url: base_url.into(),
            last_request: Mutex::new(None),
        })
    }

    /// Look up a fingerprint and return every recording it resolved to
    pub async fn lookup(&self, fingerprint: &AudioFingerprint) -> Result<Vec<RecordingMatch>, EnrichmentError> {
        let response = self.send_lookup_request(fingerprint).await?;
        adapter::to_recording_matches(response)
    }

    fn lookup_url(&self, fingerprint: &AudioFingerprint) -> String {
        // literal '+' in meta, see module docs
        format!(
            "{}?client={}&duration={}&fingerprint={}&meta=recordings+compress",
            self.base_url,
            urlencoding::encode(&self.api_key),
            fingerprint.duration_secs,
            urlencoding::encode(&fingerprint.fingerprint)
        )
    }

    async fn send_lookup_request(&self, fingerprint: &AudioFingerprint) -> Result<dto::LookupResponse, EnrichmentError> {
        self.throttle().await;
        let url = self.lookup_url(fingerprint);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(EnrichmentError::RateLimited);
        }

        // AcoustID reports bad keys and parameters as 400 with an error body
        if !status.is_success() && status != reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Network(format!(
                "HTTP {}: {} - {}",
                status,
                status.canonical_reason().unwrap_or("Unknown"),
                body.chars().take(200).collect::<String>()
            )));
        }

        response
            .json::<dto::LookupResponse>()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AcoustIdClient::new("test-key").unwrap();
        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, "https://api.acoustid.org/v2/lookup");
    }

    #[test]
    fn test_lookup_url_keeps_literal_plus() {
        let client = AcoustIdClient::with_base_url("k e y", "http://localhost:8080/lookup").unwrap();
        let url = client.lookup_url(&AudioFingerprint {
            fingerprint: "AQAD+tNI/yRU".to_string(),
            duration_secs: 181,
        });

        assert_eq!(
            url,
            "http://localhost:8080/lookup?client=k%20e%20y&duration=181&fingerprint=AQAD%2BtNI%2FyRU&meta=recordings+compress"
        );
    }
}
