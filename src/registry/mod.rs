//! npm registry client with caching and request coalescing.
//!
//! Every failure (unknown package, bad status, network error, undecodable body)
//! is logged and reported to callers as "absent" metadata.

pub mod cache;
pub mod inflight;
pub mod metadata;
pub mod source;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub use cache::{MetadataCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use inflight::RequestCoalescer;
pub use metadata::{PackageMetadata, PeerRequirement, VersionManifest};
pub use source::{
    HttpSource, MetadataSource, OfflineSource, StaticSource, DEFAULT_REGISTRY,
    DEFAULT_REQUEST_TIMEOUT,
};

/// Environment variable overriding the registry URL
pub const REGISTRY_ENV: &str = "STACKMATE_REGISTRY";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("package '{0}' not found in registry")]
    NotFound(String),

    #[error("registry returned status {status} for '{package}'")]
    Status { package: String, status: u16 },

    #[error("request to registry failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to parse registry metadata for '{package}': {source}")]
    Decode {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid registry URL '{0}'")]
    InvalidUrl(String),
}

/// Cached, deduplicating front for a [`MetadataSource`]
pub struct RegistryClient {
    source: Arc<dyn MetadataSource>,
    cache: MetadataCache,
    inflight: RequestCoalescer,
}

impl RegistryClient {
    pub fn new(source: Arc<dyn MetadataSource>, cache: MetadataCache) -> Self {
        Self {
            source,
            cache,
            inflight: RequestCoalescer::new(),
        }
    }

    /// Client for an HTTP registry
    pub fn http(base_url: &str, timeout: Duration, cache: MetadataCache) -> Result<Self, RegistryError> {
        let source = HttpSource::new(base_url, timeout)?;
        Ok(Self::new(Arc::new(source), cache))
    }

    /// Client for the public npm registry with default settings
    pub fn npm() -> Result<Self, RegistryError> {
        Self::http(DEFAULT_REGISTRY, DEFAULT_REQUEST_TIMEOUT, MetadataCache::default())
    }

    /// Client that never resolves anything
    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineSource), MetadataCache::default())
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Fetch metadata for a package, served from cache while fresh.
    /// Returns `None` when the package cannot be retrieved for any reason.
    pub async fn fetch(&self, name: &str) -> Option<Arc<PackageMetadata>> {
        if let Some(hit) = self.cache.get(name) {
            debug!(package = name, "registry cache hit");
            return Some(hit);
        }

        let source = Arc::clone(&self.source);
        let fetched = self
            .inflight
            .coalesce(name, || async move {
                match source.fetch(name).await {
                    Ok(metadata) => Some(Arc::new(metadata)),
                    Err(RegistryError::NotFound(_)) => {
                        debug!(package = name, "package not found in registry");
                        None
                    }
                    Err(e) => {
                        warn!(package = name, error = %e, "registry fetch failed");
                        None
                    }
                }
            })
            .await;

        if let Some(metadata) = &fetched {
            self.cache.insert(name, Arc::clone(metadata));
        }
        fetched
    }
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("cached", &self.cache.len())
            .field("ttl", &self.cache.ttl())
            .finish()
    }
}
