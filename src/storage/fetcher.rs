//! Byte fetchers for archive endpoints and the primary/fallback source.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

use crate::error::{ErrorCode, GalleryError, GalleryResult};

/// Status and body of one answered request.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Reads raw bytes for a path relative to one endpoint.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Requests `path` and returns whatever status the endpoint answered.
    ///
    /// Only transport failures are errors.
    async fn get_response(&self, path: &str) -> GalleryResult<FetchResponse>;

    /// Fetches the object at `path`.
    ///
    /// A non-success response is an error carrying the upstream status.
    async fn get(&self, path: &str) -> GalleryResult<Bytes> {
        let response = self.get_response(path).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(GalleryError::upstream_status(
                &self.describe(path),
                response.status,
            ))
        }
    }

    /// Human-readable location of `path`, used in logs.
    fn describe(&self, path: &str) -> String;
}

/// Fetches over HTTP(S) relative to a base URL.
pub struct HttpFetcher {
    client: reqwest::Client,
    base: String,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    /// Fetcher for absolute URLs.
    pub fn absolute(client: reqwest::Client) -> Self {
        Self::new(client, "")
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_response(&self, path: &str) -> GalleryResult<FetchResponse> {
        let url = self.describe(path);
        let response = self.client.get(&url).send().await?;
        let status = response.status().as_u16();
        Ok(FetchResponse {
            status,
            body: response.bytes().await?,
        })
    }

    fn describe(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Reads files under a local directory.
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> GalleryResult<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(GalleryError::with_message(
                ErrorCode::InvalidQueryParameterValue,
                format!("Refusing to read outside the archive: {}", path),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Fetcher for FsFetcher {
    async fn get_response(&self, path: &str) -> GalleryResult<FetchResponse> {
        let full = self.resolve(path)?;
        match fs::read(&full).await {
            Ok(data) => Ok(FetchResponse::ok(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse {
                status: 404,
                body: Bytes::new(),
            }),
            Err(e) => Err(GalleryError::with_message(
                ErrorCode::UpstreamUnreachable,
                format!("Failed to read {}: {}", full.display(), e),
            )),
        }
    }

    fn describe(&self, path: &str) -> String {
        self.root.join(path).display().to_string()
    }
}

/// In-memory fetcher that counts requests per path.
#[derive(Default)]
pub struct MemoryFetcher {
    objects: DashMap<String, Bytes>,
    statuses: DashMap<String, u16>,
    requests: DashMap<String, usize>,
    total: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an object.
    pub fn insert(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.objects.insert(path.into(), data.into());
    }

    /// Stores `value` serialized as JSON.
    pub fn insert_json<T: serde::Serialize>(&self, path: impl Into<String>, value: &T) {
        let data = serde_json::to_vec(value).unwrap_or_default();
        self.insert(path, data);
    }

    /// Makes `path` answer with the given status, keeping any stored body.
    pub fn fail_with(&self, path: impl Into<String>, status: u16) {
        self.statuses.insert(path.into(), status);
    }

    /// Number of requests made for `path`.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests.get(path).map(|c| *c).unwrap_or(0)
    }

    /// Number of requests made for any path.
    pub fn total_requests(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn get_response(&self, path: &str) -> GalleryResult<FetchResponse> {
        *self.requests.entry(path.to_string()).or_insert(0) += 1;
        self.total.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave like a real network request would.
        tokio::task::yield_now().await;

        let body = self.objects.get(path).map(|data| data.value().clone());
        let status = match (self.statuses.get(path), &body) {
            (Some(status), _) => *status,
            (None, Some(_)) => 200,
            (None, None) => 404,
        };
        Ok(FetchResponse {
            status,
            body: body.unwrap_or_default(),
        })
    }

    fn describe(&self, path: &str) -> String {
        format!("memory:{}", path)
    }
}

/// Picks an HTTP or filesystem fetcher for an archive base.
pub fn fetcher_for_base(base: &str, client: &reqwest::Client) -> Arc<dyn Fetcher> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Arc::new(HttpFetcher::new(client.clone(), base))
    } else {
        Arc::new(FsFetcher::new(base))
    }
}

/// A primary endpoint backed by an optional fallback mirror.
#[derive(Clone)]
pub struct MirroredSource {
    primary: Arc<dyn Fetcher>,
    fallback: Option<Arc<dyn Fetcher>>,
}

impl MirroredSource {
    pub fn new(primary: Arc<dyn Fetcher>, fallback: Option<Arc<dyn Fetcher>>) -> Self {
        Self { primary, fallback }
    }

    /// Fetches `path` from the primary endpoint, or else from the fallback.
    ///
    /// When both fail, the fallback's error is returned.
    pub async fn get(&self, path: &str) -> GalleryResult<Bytes> {
        match self.primary.get(path).await {
            Ok(data) => Ok(data),
            Err(primary_err) => match &self.fallback {
                Some(fallback) => {
                    debug!(
                        "Primary failed for {} ({}), trying {}",
                        self.primary.describe(path),
                        primary_err,
                        fallback.describe(path)
                    );
                    fallback.get(path).await
                }
                None => Err(primary_err),
            },
        }
    }

    /// Fetches `path` and parses it as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GalleryResult<T> {
        let data = self.get(path).await?;
        serde_json::from_slice(&data).map_err(|e| {
            GalleryError::with_message(
                ErrorCode::InvalidJson,
                format!("Invalid JSON in {}: {}", path, e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fallback_used_on_primary_status() {
        let primary = Arc::new(MemoryFetcher::new());
        primary.fail_with("a.json", 500);
        let fallback = Arc::new(MemoryFetcher::new());
        fallback.insert("a.json", "[1]");

        let source = MirroredSource::new(primary.clone(), Some(fallback.clone()));
        let value: Vec<u8> = source.get_json("a.json").await.unwrap();
        assert_eq!(value, vec![1]);
        assert_eq!(primary.request_count("a.json"), 1);
        assert_eq!(fallback.request_count("a.json"), 1);
    }

    #[tokio::test]
    async fn test_fallback_not_used_when_primary_succeeds() {
        let primary = Arc::new(MemoryFetcher::new());
        primary.insert("a.json", "[]");
        let fallback = Arc::new(MemoryFetcher::new());

        let source = MirroredSource::new(primary, Some(fallback.clone()));
        source.get("a.json").await.unwrap();
        assert_eq!(fallback.total_requests(), 0);
    }

    #[tokio::test]
    async fn test_both_failing_returns_fallback_error() {
        let primary = Arc::new(MemoryFetcher::new());
        let fallback = Arc::new(MemoryFetcher::new());
        fallback.fail_with("a.json", 503);

        let source = MirroredSource::new(primary, Some(fallback));
        let err = source.get("a.json").await.unwrap_err();
        assert_eq!(err.upstream_status, Some(503));
    }

    #[tokio::test]
    async fn test_invalid_json_is_an_error() {
        let primary = Arc::new(MemoryFetcher::new());
        primary.insert("a.json", "not json");
        let source = MirroredSource::new(primary, None);
        let err = source.get_json::<Vec<u8>>("a.json").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidJson);
    }

    #[tokio::test]
    async fn test_fs_fetcher_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("2024")).unwrap();
        std::fs::write(dir.path().join("2024/bing_ROW.json"), "[]").unwrap();

        let fetcher = FsFetcher::new(dir.path());
        assert_eq!(&fetcher.get("2024/bing_ROW.json").await.unwrap()[..], b"[]");
        let err = fetcher.get("2023/bing_ROW.json").await.unwrap_err();
        assert_eq!(err.upstream_status, Some(404));
        assert!(fetcher.get("../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_get_accepts_any_success_status() {
        let fetcher = MemoryFetcher::new();
        fetcher.insert("a.json", "[]");
        fetcher.fail_with("a.json", 203);

        let response = fetcher.get_response("a.json").await.unwrap();
        assert_eq!(response.status, 203);
        assert_eq!(&fetcher.get("a.json").await.unwrap()[..], b"[]");

        let missing = fetcher.get_response("b.json").await.unwrap();
        assert_eq!(missing.status, 404);
        assert!(missing.body.is_empty());
    }
}
