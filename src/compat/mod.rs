//! Compatibility checking across a whole dependency map.
//!
//! Pass 1 resolves every entry. Pass 2 walks the resolved map in name order and
//! bumps co-installed packages whose version violates a declared peer
//! requirement. When several packages constrain the same peer, the last
//! adjustment wins.

use futures::future::join_all;
use semver::Version;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::registry::{PackageMetadata, RegistryClient};
use crate::resolver::{
    max_satisfying, strip_prefix, RangeError, Resolution, VersionRange, VersionResolver,
};

/// Package name to version specifier
pub type DependencyMap = BTreeMap<String, String>;

/// What a resolution warning reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Pass 1 chose a different version than requested
    VersionUpdated,
    /// The resolved version is unknown to the registry; a nearby one was substituted
    ClosestVersion,
    /// A peer was bumped to satisfy another package's requirement
    PeerAdjusted,
    /// A peer requirement could not be evaluated
    Unverified,
}

impl WarningKind {
    pub fn is_compatibility(&self) -> bool {
        matches!(self, WarningKind::Unverified)
    }

    pub fn is_version_update(&self) -> bool {
        !self.is_compatibility()
    }
}

/// One resolution decision, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionWarning {
    pub kind: WarningKind,
    pub package: String,
    pub message: String,
}

impl ResolutionWarning {
    fn version_updated(package: &str, old: &str, new: &str) -> Self {
        Self {
            kind: WarningKind::VersionUpdated,
            package: package.to_string(),
            message: format!(
                "Updated {} from {} to {} for better compatibility",
                package, old, new
            ),
        }
    }

    fn closest_version(package: &str, version: &Version) -> Self {
        Self {
            kind: WarningKind::ClosestVersion,
            package: package.to_string(),
            message: format!(
                "Updated {} to closest available version: {}",
                package, version
            ),
        }
    }

    fn peer_adjusted(peer: &str, version: &Version, package: &str, required: &str) -> Self {
        Self {
            kind: WarningKind::PeerAdjusted,
            package: peer.to_string(),
            message: format!(
                "Updated {} to {} to satisfy peer dependency requirement from {} ({})",
                peer, version, package, required
            ),
        }
    }

    fn unverified(package: &str, peer: &str) -> Self {
        Self {
            kind: WarningKind::Unverified,
            package: package.to_string(),
            message: format!(
                "Could not verify compatibility between {} and {}",
                package, peer
            ),
        }
    }
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a compatibility check
#[derive(Debug, Clone, Default)]
pub struct CompatibilityCheck {
    /// The resolved dependency map
    pub dependencies: DependencyMap,
    /// Pass 1 warnings followed by pass 2 warnings
    pub warnings: Vec<ResolutionWarning>,
    /// How each input specifier was resolved in pass 1
    pub resolutions: BTreeMap<String, Resolution>,
}

/// Why a peer requirement could not be evaluated
#[derive(Debug, Error)]
enum PeerCheckError {
    #[error("peer requirement is not a string")]
    MissingSpecifier,

    #[error("resolved version '{0}' is not a concrete version")]
    InstalledVersion(String),

    #[error(transparent)]
    Requirement(#[from] RangeError),
}

/// Resolves a dependency map and reconciles peer requirements
#[derive(Debug, Clone)]
pub struct CompatibilityChecker {
    registry: Arc<RegistryClient>,
    resolver: VersionResolver,
}

impl CompatibilityChecker {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self {
            resolver: VersionResolver::new(Arc::clone(&registry)),
            registry,
        }
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    pub async fn check(&self, dependencies: &DependencyMap) -> CompatibilityCheck {
        let mut check = self.resolve_all(dependencies).await;
        self.reconcile_peers(&mut check).await;
        check
    }

    /// Pass 1: resolve every entry. Fetches run concurrently; results are
    /// applied in map order.
    async fn resolve_all(&self, dependencies: &DependencyMap) -> CompatibilityCheck {
        let resolutions = join_all(
            dependencies
                .iter()
                .map(|(name, spec)| self.resolver.resolve(name, spec)),
        )
        .await;

        let mut check = CompatibilityCheck::default();
        for ((name, spec), resolution) in dependencies.iter().zip(resolutions) {
            let resolved = resolution.specifier().to_string();
            if resolved != *spec {
                info!(package = %name, from = %spec, to = %resolved, "updated dependency");
                check
                    .warnings
                    .push(ResolutionWarning::version_updated(name, spec, &resolved));
            }
            check.dependencies.insert(name.clone(), resolved);
            check.resolutions.insert(name.clone(), resolution);
        }
        check
    }

    /// Pass 2: reconcile declared peer requirements between resolved packages
    async fn reconcile_peers(&self, check: &mut CompatibilityCheck) {
        let packages: Vec<String> = check.dependencies.keys().cloned().collect();

        for package in packages {
            let metadata = match self.registry.fetch(&package).await {
                Some(metadata) => metadata,
                None => continue,
            };

            let current = check.dependencies[&package].clone();
            let version = match self.installed_version(&package, &current, &metadata, check) {
                Some(version) => version,
                None => continue,
            };

            let manifest = match metadata.manifest(&version) {
                Some(manifest) => manifest,
                None => continue,
            };

            for peer in manifest.peer_dependencies() {
                let peer_current = match check.dependencies.get(peer.name) {
                    Some(spec) => spec.clone(),
                    None => continue,
                };

                match satisfies(&peer_current, peer.specifier) {
                    Ok(true) => {}
                    Ok(false) => {
                        // specifier is present when the check parsed it
                        let required = peer.specifier.unwrap_or_default();
                        self.adjust_peer(check, &package, peer.name, required).await;
                    }
                    Err(e) => {
                        warn!(package = %package, peer = peer.name, error = %e, "could not verify peer requirement");
                        check
                            .warnings
                            .push(ResolutionWarning::unverified(&package, peer.name));
                    }
                }
            }
        }
    }

    /// Registry key of the version `package` is resolved to. When the
    /// registry does not list it, substitute the available version `>=` it
    /// whose major is closest.
    fn installed_version(
        &self,
        package: &str,
        current: &str,
        metadata: &PackageMetadata,
        check: &mut CompatibilityCheck,
    ) -> Option<String> {
        let key = strip_prefix(current);
        if metadata.has_version(key) {
            return Some(key.to_string());
        }

        let wanted = Version::parse(key).ok()?;
        let closest = closest_available(metadata, &wanted)?;
        debug!(package, wanted = %wanted, closest = %closest, "substituting closest version");

        check
            .dependencies
            .insert(package.to_string(), format!("^{}", closest));
        check
            .warnings
            .push(ResolutionWarning::closest_version(package, &closest));

        let closest = closest.to_string();
        metadata.has_version(&closest).then_some(closest)
    }

    async fn adjust_peer(
        &self,
        check: &mut CompatibilityCheck,
        package: &str,
        peer: &str,
        required: &str,
    ) {
        let metadata = match self.registry.fetch(peer).await {
            Some(metadata) => metadata,
            None => return,
        };

        // `satisfies` already parsed this requirement
        let range = match VersionRange::parse(required) {
            Ok(range) => range,
            Err(_) => return,
        };

        match max_satisfying(&metadata.versions(), &range) {
            Some(best) => {
                info!(peer, version = %best, required_by = package, "adjusted peer dependency");
                check
                    .dependencies
                    .insert(peer.to_string(), format!("^{}", best));
                check
                    .warnings
                    .push(ResolutionWarning::peer_adjusted(peer, &best, package, required));
            }
            None => {
                warn!(
                    peer,
                    required,
                    required_by = package,
                    "no published version satisfies peer requirement"
                );
            }
        }
    }
}

/// Does the version a peer is resolved to satisfy `required`?
fn satisfies(current: &str, required: Option<&str>) -> Result<bool, PeerCheckError> {
    let required = required.ok_or(PeerCheckError::MissingSpecifier)?;
    let installed = Version::parse(strip_prefix(current))
        .map_err(|_| PeerCheckError::InstalledVersion(current.to_string()))?;
    let range = VersionRange::parse(required)?;
    Ok(range.matches(&installed))
}

/// Among versions `>= wanted`, the one whose major is numerically closest to
/// `wanted.major`. Ties go to the lowest version.
fn closest_available(metadata: &PackageMetadata, wanted: &Version) -> Option<Version> {
    let at_least = VersionRange::at_least(wanted);
    let mut candidates: Vec<Version> = metadata
        .versions()
        .into_iter()
        .filter(|v| at_least.matches(v))
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .min_by_key(|v| v.major.abs_diff(wanted.major))
}
