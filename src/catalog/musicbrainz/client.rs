//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{adapter, dto};
use crate::catalog::CatalogError;
use crate::identification::traits::RemoteCatalog;
use crate::model::AlbumRelease;

/// Default web service root
pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// User agent string - MusicBrainz requires this
const USER_AGENT: &str = concat!(
    "MusicMatcher/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/music-matcher)"
);

/// Includes needed to build a full candidate release
const RELEASE_INCLUDES: &str = "recordings+artist-credits+labels+release-groups";

const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    /// Max releases per search or browse
    limit: usize,
    last_request: Mutex<Option<Instant>>,
}

impl MusicBrainzClient {
    /// Create a new client
    pub fn new(base_url: impl Into<String>, limit: usize) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CatalogError::Provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limit: limit.max(1),
            last_request: Mutex::new(None),
        })
    }

    /// Search releases by title and artist, then fetch each hit in full.
    pub async fn search_releases(&self, album: &str, artist: &str) -> Result<Vec<AlbumRelease>, CatalogError> {
        let query = build_query(album, artist);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/release?query={}&limit={}&fmt=json",
            self.base_url,
            urlencoding::encode(&query),
            self.limit
        );
        let hits: dto::ReleaseList = self.get_json(&url).await?;
        tracing::debug!(query = %query, hits = hits.releases.len(), "MusicBrainz release search");

        let mut releases = Vec::with_capacity(hits.releases.len());
        for hit in hits.releases {
            releases.push(self.lookup_release(&hit.id).await?);
        }
        Ok(releases)
    }

    /// Fetch one release with recordings, credits, labels and release group.
    pub async fn lookup_release(&self, release_id: &str) -> Result<AlbumRelease, CatalogError> {
        let url = format!(
            "{}/release/{}?inc={}&fmt=json",
            self.base_url, release_id, RELEASE_INCLUDES
        );
        let release: dto::Release = self.get_json(&url).await?;
        Ok(adapter::to_album_release(release))
    }

    /// Browse releases linked to an entity (`release-group`, `recording`).
    pub async fn browse_releases(&self, entity: &str, id: &str) -> Result<Vec<AlbumRelease>, CatalogError> {
        let url = format!(
            "{}/release?{}={}&inc={}&limit={}&fmt=json",
            self.base_url, entity, id, RELEASE_INCLUDES, self.limit
        );
        let list: dto::ReleaseList = self.get_json(&url).await?;
        Ok(list.releases.into_iter().map(adapter::to_album_release).collect())
    }

    /// Wait out the rate limit, send the request and parse the response
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        self.throttle().await;
        tracing::trace!(url, "MusicBrainz request");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(CatalogError::RateLimited);
        }

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(CatalogError::Api(error.error));
            }
            return Err(CatalogError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
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

#[async_trait]
impl RemoteCatalog for MusicBrainzClient {
    async fn search_by_album_id(&self, album_id: &str) -> Result<Vec<AlbumRelease>, CatalogError> {
        self.browse_releases("release-group", album_id).await
    }

    async fn search_by_recording_ids(&self, recording_ids: &[String]) -> Result<Vec<AlbumRelease>, CatalogError> {
        let mut releases: Vec<AlbumRelease> = Vec::new();
        let mut seen: Vec<&String> = Vec::new();
        for id in recording_ids {
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            if seen.len() > self.limit {
                break;
            }
            for release in self.browse_releases("recording", id).await? {
                if !releases.iter().any(|r| r.foreign_release_id == release.foreign_release_id) {
                    releases.push(release);
                }
            }
        }
        Ok(releases)
    }

    async fn search(&self, album: &str, artist: &str) -> Result<Vec<AlbumRelease>, CatalogError> {
        self.search_releases(album, artist).await
    }
}

/// Lucene query on release title and artist; blank parts are left out.
fn build_query(album: &str, artist: &str) -> String {
    let mut terms = Vec::new();
    if !album.trim().is_empty() {
        terms.push(format!("release:\"{}\"", escape(album.trim())));
    }
    if !artist.trim().is_empty() {
        terms.push(format!("artist:\"{}\"", escape(artist.trim())));
    }
    terms.join(" AND ")
}

fn escape(term: &str) -> String {
    term.replace('\\', "\\\\").replace('"', "\\\"")
}
