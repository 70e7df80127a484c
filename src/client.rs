//! HTTP client wrapper for metadata requests.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use tracing::debug;

use crate::error::{DecodeError, MetadataError};

/// Default timeout for metadata requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default metadata service base URL (link-local address).
pub const DEFAULT_BASE_URL: &str = "http://169.254.169.254";

/// Default namespace of the all-metadata and user-data endpoints.
pub const DEFAULT_PROVIDER: &str = "hetzner";

/// Versioned prefix of the per-attribute endpoints.
pub const META_DATA_PATH: &str = "/2009-04-04/meta-data";

/// Maximum number of body bytes quoted in an unexpected-status error.
const MAX_ERROR_CONTEXT: usize = 128;

/// Appended to error context that was cut at [`MAX_ERROR_CONTEXT`].
const ELIDED_MARKER: &str = "... (elided)";

/// Client for the instance metadata service.
///
/// Holds only immutable configuration and the shared transport, so one client
/// can be cloned or shared across tasks freely.
///
/// # Example
///
/// ```ignore
/// use hc_metadata::MetadataClient;
///
/// let client = MetadataClient::builder()
///     .base_url("http://127.0.0.1:8080")
///     .build()?;
/// let hostname = client.hostname().await?;
/// ```
#[derive(Debug, Clone)]
pub struct MetadataClient {
    inner: Client,
    base_url: Url,
    provider: String,
}

impl MetadataClient {
    /// Create a client with the default base URL, timeout and provider.
    pub fn new() -> Result<Self, MetadataError> {
        Self::builder().build()
    }

    /// Start configuring a client.
    pub fn builder() -> MetadataClientBuilder {
        MetadataClientBuilder::default()
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(base_url: &str) -> Result<Self, MetadataError> {
        Self::builder().base_url(base_url).build()
    }

    /// Get the normalized base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Namespace of the all-metadata and user-data endpoints.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Build the URL for `resource` below `namespace`.
    ///
    /// `namespace` is split on `/`; `resource` is always a single path
    /// component, so `/`, `?` and `#` inside it are percent-encoded. Empty,
    /// `.` and `..` components are dropped.
    pub fn resolve(&self, namespace: &str, resource: &str) -> Url {
        let mut url = self.base_url.clone();
        let resource = Some(resource).filter(|r| is_component(r));
        // The builder rejects base URLs that cannot carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(components(namespace))
                .extend(resource);
        }
        url
    }

    /// Issue a GET for `url` and hand the body of a `200 OK` to `decode`.
    ///
    /// Any other status becomes [`MetadataError::UnexpectedStatus`]. The body
    /// is read to the end on every path.
    pub(crate) async fn get_with<T, F>(&self, url: Url, decode: F) -> Result<T, MetadataError>
    where
        F: FnOnce(Vec<u8>) -> Result<T, DecodeError>,
    {
        debug!(url = %url, "requesting metadata");
        let response = self.inner.get(url).send().await?;

        let status = response.status();
        debug!(status = %status, "metadata response");
        if status != StatusCode::OK {
            return Err(unexpected_status(response).await);
        }

        let body = response.bytes().await.map_err(DecodeError::Body)?;
        Ok(decode(body.to_vec())?)
    }
}

fn is_component(c: &str) -> bool {
    !c.is_empty() && c != "." && c != ".."
}

/// Path components of `path`, without empty, `.` and `..` entries.
fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| is_component(c))
}

/// Drain a non-success response, keeping the head of the body as context.
async fn unexpected_status(mut response: Response) -> MetadataError {
    let status = response.status();
    let mut excerpt = Vec::with_capacity(MAX_ERROR_CONTEXT);
    let mut total = 0usize;

    while let Ok(Some(chunk)) = response.chunk().await {
        total = total.saturating_add(chunk.len());
        let room = MAX_ERROR_CONTEXT.saturating_sub(excerpt.len());
        excerpt.extend_from_slice(&chunk[..room.min(chunk.len())]);
    }

    MetadataError::UnexpectedStatus {
        status: status.as_u16(),
        context: error_context(&excerpt, total, status),
    }
}

fn error_context(excerpt: &[u8], total: usize, status: StatusCode) -> String {
    if excerpt.is_empty() {
        return status.to_string();
    }
    let mut context = String::from_utf8_lossy(excerpt).into_owned();
    if total > excerpt.len() {
        context.push_str(ELIDED_MARKER);
    }
    context
}

/// Validate a base URL and normalize its path.
fn parse_base_url(raw: &str) -> Result<Url, MetadataError> {
    let mut url =
        Url::parse(raw).map_err(|e| MetadataError::InvalidBaseUrl(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(MetadataError::InvalidBaseUrl(format!(
            "{raw}: expected an http or https url"
        )));
    }

    let path = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|c| is_component(c))
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();
    url.set_path(&format!("/{path}"));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Construction-time configuration for [`MetadataClient`].
#[derive(Debug, Default)]
pub struct MetadataClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    http_client: Option<Client>,
    provider: Option<String>,
}

impl MetadataClientBuilder {
    /// Reach the metadata service at `base_url` instead of the link-local default.
    pub fn base_url(mut self, base_url: impl AsRef<str>) -> Self {
        self.base_url = Some(base_url.as_ref().to_string());
        self
    }

    /// Request timeout used when the builder creates the transport.
    ///
    /// Ignored if [`MetadataClientBuilder::http_client`] is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use an existing reqwest client as transport.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Namespace of the all-metadata and user-data endpoints.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Finish configuration.
    pub fn build(self) -> Result<MetadataClient, MetadataError> {
        let base_url = parse_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        let inner = match self.http_client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .danger_accept_invalid_certs(false)
                .build()?,
        };

        Ok(MetadataClient {
            inner,
            base_url,
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(2));
    }

    #[test]
    fn test_client_creation() {
        let client = MetadataClient::new().unwrap();
        assert_eq!(client.base_url().as_str(), "http://169.254.169.254/");
        assert_eq!(client.provider(), "hetzner");
    }

    #[test]
    fn test_client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<MetadataClient>();
    }

    #[test]
    fn test_client_strips_trailing_slash() {
        let client = MetadataClient::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(
            client.resolve(META_DATA_PATH, "hostname").as_str(),
            "http://localhost:8080/2009-04-04/meta-data/hostname"
        );
    }

    #[test]
    fn test_resolve_default() {
        let client = MetadataClient::new().unwrap();
        assert_eq!(
            client.resolve(META_DATA_PATH, "instance-id").as_str(),
            "http://169.254.169.254/2009-04-04/meta-data/instance-id"
        );
        assert_eq!(
            client.resolve("hetzner/v1", "metadata").as_str(),
            "http://169.254.169.254/hetzner/v1/metadata"
        );
    }

    #[test]
    fn test_resolve_collapses_slashes() {
        let client = MetadataClient::with_base_url("http://localhost//prefix//").unwrap();
        assert_eq!(client.base_url().path(), "/prefix");
        assert_eq!(
            client.resolve("//2009-04-04///meta-data/", "tags").as_str(),
            "http://localhost/prefix/2009-04-04/meta-data/tags"
        );
    }

    #[test]
    fn test_resolve_keeps_resource_inside_base_path() {
        let client = MetadataClient::with_base_url("http://localhost").unwrap();
        assert_eq!(
            client.resolve(META_DATA_PATH, "../../etc").as_str(),
            "http://localhost/2009-04-04/meta-data/..%2F..%2Fetc"
        );
        assert_eq!(
            client.resolve(META_DATA_PATH, "tags?x=1#y").as_str(),
            "http://localhost/2009-04-04/meta-data/tags%3Fx=1%23y"
        );
        assert_eq!(
            client.resolve(META_DATA_PATH, "..").as_str(),
            "http://localhost/2009-04-04/meta-data"
        );
    }

    #[test]
    fn test_base_url_query_and_fragment_dropped() {
        let client = MetadataClient::with_base_url("http://localhost/base?token=1#frag").unwrap();
        assert_eq!(
            client.resolve(META_DATA_PATH, "hostname").as_str(),
            "http://localhost/base/2009-04-04/meta-data/hostname"
        );
    }

    #[test]
    fn test_invalid_base_urls() {
        for raw in ["not a url", "mailto:root@localhost", "ftp://localhost"] {
            let result = MetadataClient::with_base_url(raw);
            assert!(
                matches!(result, Err(MetadataError::InvalidBaseUrl(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_builder_options() {
        let client = MetadataClient::builder()
            .base_url(Url::parse("http://10.0.0.1:8080").unwrap())
            .timeout(Duration::from_millis(250))
            .provider("other")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://10.0.0.1:8080/");
        assert_eq!(
            client.resolve(client.provider(), "userdata").as_str(),
            "http://10.0.0.1:8080/other/userdata"
        );
    }

    #[test]
    fn test_error_context_empty_body_uses_status_line() {
        assert_eq!(
            error_context(b"", 0, StatusCode::BAD_REQUEST),
            "400 Bad Request"
        );
    }

    #[test]
    fn test_error_context_short_body() {
        assert_eq!(
            error_context(b"bad path", 8, StatusCode::NOT_FOUND),
            "bad path"
        );
    }

    #[test]
    fn test_error_context_elided() {
        let excerpt = [b'x'; MAX_ERROR_CONTEXT];
        let context = error_context(&excerpt, 500, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(context.len(), MAX_ERROR_CONTEXT + ELIDED_MARKER.len());
        assert!(context.ends_with("... (elided)"));
    }

    #[test]
    fn test_error_context_exact_limit_not_elided() {
        let excerpt = [b'x'; MAX_ERROR_CONTEXT];
        let context = error_context(&excerpt, MAX_ERROR_CONTEXT, StatusCode::NOT_FOUND);
        assert_eq!(context, "x".repeat(MAX_ERROR_CONTEXT));
    }
}
