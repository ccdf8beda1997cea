//! Version resolution: turn a specifier into the best concrete version the
//! registry offers.

pub mod range;

use semver::Version;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::registry::{PackageMetadata, RegistryClient};

pub use range::{max_satisfying, strip_prefix, RangeError, VersionRange, VersionSpecifier};

/// Why a specifier was left as written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedReason {
    /// The registry had no metadata for the package
    PackageUnavailable,
    /// No listed version satisfies the specifier
    NoMatchingVersion,
    /// An exact version that the registry lists
    ExactPin,
}

impl fmt::Display for UnchangedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnchangedReason::PackageUnavailable => write!(f, "package unavailable"),
            UnchangedReason::NoMatchingVersion => write!(f, "no matching version"),
            UnchangedReason::ExactPin => write!(f, "exact pin"),
        }
    }
}

/// Outcome of resolving one specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// Best matching version, written as `^{version}`
    Resolved { specifier: String, version: String },
    /// The input specifier is kept
    Unchanged {
        specifier: String,
        reason: UnchangedReason,
    },
    /// The input specifier could not be read as a version or range
    Unparseable { specifier: String },
}

impl Resolution {
    fn resolved(version: &Version) -> Self {
        Resolution::Resolved {
            specifier: format!("^{}", version),
            version: version.to_string(),
        }
    }

    fn unchanged(spec: &str, reason: UnchangedReason) -> Self {
        Resolution::Unchanged {
            specifier: spec.to_string(),
            reason,
        }
    }

    /// The specifier to commit to. Falls back to the input on every failure path.
    pub fn specifier(&self) -> &str {
        match self {
            Resolution::Resolved { specifier, .. }
            | Resolution::Unchanged { specifier, .. }
            | Resolution::Unparseable { specifier } => specifier,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved { .. })
    }
}

/// Resolve a specifier against already-fetched metadata
pub fn resolve_against(metadata: &PackageMetadata, spec: &str) -> Resolution {
    let specifier = VersionSpecifier::parse(spec);

    let range = match specifier.range() {
        Some(range) => range,
        None => return Resolution::Unparseable {
            specifier: spec.to_string(),
        },
    };

    let versions = metadata.versions();
    match max_satisfying(&versions, &range) {
        // Exact pins are never rewritten
        Some(_) if matches!(specifier, VersionSpecifier::Exact(_)) => {
            Resolution::unchanged(spec, UnchangedReason::ExactPin)
        }
        Some(best) => Resolution::resolved(&best),
        None => Resolution::unchanged(spec, UnchangedReason::NoMatchingVersion),
    }
}

/// Resolves specifiers using registry metadata
#[derive(Debug, Clone)]
pub struct VersionResolver {
    registry: Arc<RegistryClient>,
}

impl VersionResolver {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RegistryClient> {
        &self.registry
    }

    /// Resolve `spec` for `package`. Never fails: unknown packages and
    /// unreadable specifiers come back unchanged.
    pub async fn resolve(&self, package: &str, spec: &str) -> Resolution {
        let metadata = match self.registry.fetch(package).await {
            Some(metadata) => metadata,
            None => return Resolution::unchanged(spec, UnchangedReason::PackageUnavailable),
        };

        let resolution = resolve_against(&metadata, spec);
        debug!(package, spec, resolved = resolution.specifier(), "resolved version");
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MetadataCache, StaticSource};

    fn metadata() -> PackageMetadata {
        PackageMetadata::new("prisma")
            .with_version("5.8.0")
            .with_version("5.8.5")
            .with_version("5.9.0")
            .with_version("6.0.0")
    }

    #[test]
    fn test_caret_resolution() {
        let resolution = resolve_against(&metadata(), "^5.8.0");
        assert_eq!(resolution.specifier(), "^5.9.0");
        assert!(resolution.is_resolved());
    }

    #[test]
    fn test_tilde_resolution() {
        assert_eq!(resolve_against(&metadata(), "~5.8.0").specifier(), "^5.8.5");
    }

    #[test]
    fn test_exact_pin_kept_verbatim() {
        let resolution = resolve_against(&metadata(), "5.8.0");
        assert_eq!(
            resolution,
            Resolution::Unchanged {
                specifier: "5.8.0".to_string(),
                reason: UnchangedReason::ExactPin,
            }
        );
    }

    #[test]
    fn test_exact_pin_missing_from_registry() {
        let resolution = resolve_against(&metadata(), "5.7.0");
        assert_eq!(resolution.specifier(), "5.7.0");
        assert!(matches!(
            resolution,
            Resolution::Unchanged {
                reason: UnchangedReason::NoMatchingVersion,
                ..
            }
        ));
    }

    #[test]
    fn test_literal_range() {
        assert_eq!(resolve_against(&metadata(), ">=5.8.1 <6").specifier(), "^5.9.0");
    }

    #[test]
    fn test_no_match() {
        assert_eq!(resolve_against(&metadata(), "^7.0.0").specifier(), "^7.0.0");
    }

    #[test]
    fn test_unparseable() {
        for spec in ["^5.8", "~x.y.z", "latest", "github:user/repo"] {
            let resolution = resolve_against(&metadata(), spec);
            assert_eq!(
                resolution,
                Resolution::Unparseable {
                    specifier: spec.to_string()
                }
            );
        }
    }

    #[test]
    fn test_overflowing_bounds_are_unparseable() {
        for spec in ["^18446744073709551615.0.0", "~1.18446744073709551615.0"] {
            assert_eq!(
                resolve_against(&metadata(), spec),
                Resolution::Unparseable {
                    specifier: spec.to_string()
                }
            );
        }
    }

    #[test]
    fn test_malformed_registry_versions_skipped() {
        let meta = metadata().with_version("garbage").with_version("5.10");
        assert_eq!(resolve_against(&meta, "^5.8.0").specifier(), "^5.9.0");
    }

    #[tokio::test]
    async fn test_unknown_package_fails_open() {
        let registry = RegistryClient::new(Arc::new(StaticSource::new()), MetadataCache::default());
        let resolver = VersionResolver::new(Arc::new(registry));

        for spec in ["^1.0.0", "~2.3.4", "1.0.0", "not a version", ""] {
            let resolution = resolver.resolve("left-pad", spec).await;
            assert_eq!(resolution.specifier(), spec);
            assert!(matches!(
                resolution,
                Resolution::Unchanged {
                    reason: UnchangedReason::PackageUnavailable,
                    ..
                }
            ));
        }
    }
}
