//! Static-map HTTP client: one request, one tile.
//!
//! [`StaticMapClient`] performs a single GET against the provider, validates
//! that the answer really is an image, and persists it atomically. It never
//! retries or sleeps; that is [`RetryingDownloader`](super::RetryingDownloader)'s job.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{DEFAULT_ENDPOINT, MAP_TYPE, MAX_ERROR_BODY_CHARS, REQUEST_TIMEOUT_SECS};
use super::error::DownloadError;
use super::persist::write_atomically;
use super::request::DownloadRequest;
use crate::credential::ApiKey;

/// A source of tile images.
///
/// Implemented by [`StaticMapClient`] for the real provider; the seam lets the
/// retry and batch layers run against fakes.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetches one tile and writes it to the request's destination.
    ///
    /// Single attempt, no retries.
    ///
    /// # Errors
    ///
    /// Any [`DownloadError`] describing why the tile could not be stored.
    async fn fetch(
        &self,
        request: &DownloadRequest,
        credential: &ApiKey,
    ) -> Result<PathBuf, DownloadError>;
}

#[async_trait]
impl<S: ImageSource + ?Sized> ImageSource for &S {
    async fn fetch(
        &self,
        request: &DownloadRequest,
        credential: &ApiKey,
    ) -> Result<PathBuf, DownloadError> {
        (**self).fetch(request, credential).await
    }
}

/// HTTP client for the Google Maps Static API.
///
/// Create once and reuse for the whole batch to benefit from connection pooling.
///
/// # Example
///
/// ```no_run
/// use imagery_core::download::{Coordinate, DownloadRequest, ImageSource, StaticMapClient};
/// use imagery_core::ApiKey;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = StaticMapClient::new();
/// let key = ApiKey::from_env()?;
/// let request = DownloadRequest::new(
///     Coordinate::new(-37.8136, 144.9631),
///     19,
///     640,
///     "data/raw/crossing_001.jpg",
/// );
/// let path = client.fetch(&request, &key).await?;
/// println!("Saved {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StaticMapClient {
    client: Client,
    endpoint: Url,
}

impl Default for StaticMapClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticMapClient {
    /// Creates a client for the production endpoint with the 30 second timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
            .expect("default static map endpoint must be a valid URL")
    }

    /// Creates a client for a custom endpoint (mirrors, proxies, test servers).
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `endpoint` does not parse.
    pub fn with_endpoint(endpoint: &str) -> Result<Self, DownloadError> {
        Self::with_endpoint_and_timeout(endpoint, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Creates a client for a custom endpoint and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if `endpoint` does not parse.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the supplied timeout.
    #[allow(clippy::expect_used)]
    pub fn with_endpoint_and_timeout(
        endpoint: &str,
        timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let endpoint =
            Url::parse(endpoint).map_err(|_| DownloadError::invalid_url(endpoint.to_string()))?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Ok(Self { client, endpoint })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the full request URL, key included. Never log the result.
    fn request_url(&self, request: &DownloadRequest, credential: &ApiKey) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("center", &request.coordinate().center_param())
            .append_pair("zoom", &request.zoom().to_string())
            .append_pair("size", &request.size_param())
            .append_pair("maptype", MAP_TYPE)
            .append_pair("key", credential.expose());
        url
    }

    async fn download_bytes(
        &self,
        request: &DownloadRequest,
        credential: &ApiKey,
    ) -> Result<Vec<u8>, DownloadError> {
        let endpoint = self.endpoint.as_str();
        let response = self
            .client
            .get(self.request_url(request, credential))
            .send()
            .await
            .map_err(|e| map_transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DownloadError::http_status(
                endpoint,
                status.as_u16(),
                truncate_body(&body),
            ));
        }

        // The provider reports some failures (quota, bad key) as 200 + text.
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_image_content_type(&content_type) {
            return Err(DownloadError::invalid_response(
                endpoint,
                status.as_u16(),
                content_type,
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(endpoint, e))?;
        debug!(bytes = bytes.len(), %content_type, "tile received");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSource for StaticMapClient {
    #[instrument(
        skip(self, request, credential),
        fields(
            lat = request.coordinate().lat,
            lon = request.coordinate().lon,
            zoom = request.zoom(),
        )
    )]
    async fn fetch(
        &self,
        request: &DownloadRequest,
        credential: &ApiKey,
    ) -> Result<PathBuf, DownloadError> {
        debug!("requesting tile");
        let bytes = self.download_bytes(request, credential).await?;
        let size = bytes.len();
        let path = write_atomically(request.destination(), bytes).await?;
        info!(path = %path.display(), bytes = size, "tile saved");
        Ok(path)
    }
}

fn map_transport_error(endpoint: &str, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(endpoint)
    } else {
        DownloadError::network(endpoint, error)
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("image")
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("imagery-downloader/{version}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::Coordinate;

    fn sample_request() -> DownloadRequest {
        DownloadRequest::new(Coordinate::new(-37.8136, 144.9631), 19, 640, "tile.jpg")
    }

    #[test]
    fn test_request_url_contains_provider_parameters() {
        let client = StaticMapClient::new();
        let key = ApiKey::new("test-key").unwrap();
        let url = client.request_url(&sample_request(), &key);

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("center".to_string(), "-37.8136,144.9631".to_string()),
                ("zoom".to_string(), "19".to_string()),
                ("size".to_string(), "640x640".to_string()),
                ("maptype".to_string(), "satellite".to_string()),
                ("key".to_string(), "test-key".to_string()),
            ]
        );
        assert!(url.as_str().starts_with(DEFAULT_ENDPOINT));
    }

    #[test]
    fn test_with_endpoint_rejects_invalid_url() {
        let result = StaticMapClient::with_endpoint("not a url");
        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[test]
    fn test_endpoint_accessor_returns_configured_url() {
        let client = StaticMapClient::with_endpoint("http://127.0.0.1:9/staticmap").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:9/staticmap");
    }

    #[test]
    fn test_is_image_content_type() {
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("image/png; charset=binary"));
        assert!(is_image_content_type("IMAGE/JPEG"));
        assert!(!is_image_content_type("application/json"));
        assert!(!is_image_content_type("text/html; charset=UTF-8"));
        assert!(!is_image_content_type(""));
    }

    #[test]
    fn test_truncate_body_limits_length() {
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 100);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS + 3);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate_body("  short  "), "short");
    }

    #[test]
    fn test_default_user_agent_identifies_tool() {
        let ua = default_user_agent();
        assert!(ua.starts_with("imagery-downloader/"));
        assert!(ua.contains(env!("CARGO_PKG_VERSION")));
    }
}
