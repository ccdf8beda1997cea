//! Where package metadata comes from: the npm registry over HTTP, or memory.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{PackageMetadata, RegistryError};

/// Default npm registry URL
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Default per-request timeout (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A provider of package metadata
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError>;
}

/// Fetches packuments from an npm-compatible registry
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RegistryError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stackmate/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Registry URL for a package. Scoped names keep their `@` but encode the `/`.
    pub fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name.replace('/', "%2F"))
    }
}

#[async_trait]
impl MetadataSource for HttpSource {
    async fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        let response = self
            .http
            .get(self.package_url(name))
            .header("Accept", "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(RegistryError::NotFound(name.to_string())),
            status => {
                return Err(RegistryError::Status {
                    package: name.to_string(),
                    status: status.as_u16(),
                })
            }
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| RegistryError::Decode {
            package: name.to_string(),
            source,
        })
    }
}

/// In-memory metadata, for embedding without network access and for tests.
/// Counts every fetch so callers can observe caching.
#[derive(Debug, Default)]
pub struct StaticSource {
    packages: Mutex<HashMap<String, PackageMetadata>>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(self, name: &str, metadata: PackageMetadata) -> Self {
        self.insert(name, metadata);
        self
    }

    pub fn insert(&self, name: &str, metadata: PackageMetadata) {
        self.packages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), metadata);
    }

    /// Total number of fetches served, including misses
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for StaticSource {
    async fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.packages
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }
}

/// Knows no packages. Every specifier passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

#[async_trait]
impl MetadataSource for OfflineSource {
    async fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        Err(RegistryError::NotFound(name.to_string()))
    }
}
