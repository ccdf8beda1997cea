//! Package metadata as reported by the npm registry (the "packument").

use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registry description of one package: every published version and its manifest.
///
/// Only the fields the resolver needs are modelled. Unknown top-level fields
/// (`dist-tags`, `time`, `maintainers`, ...) are ignored, but `versions` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub versions: BTreeMap<String, VersionManifest>,
}

/// Manifest of a single published version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionManifest {
    /// Peer requirements in registry listing order. `null` is treated as empty.
    #[serde(
        rename = "peerDependencies",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub peer_dependencies: Option<serde_json::Map<String, serde_json::Value>>,
}

/// One declared peer requirement. `specifier` is `None` when the registry
/// listed something other than a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRequirement<'a> {
    pub name: &'a str,
    pub specifier: Option<&'a str>,
}

impl PackageMetadata {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            versions: BTreeMap::new(),
        }
    }

    /// Add a version without peer dependencies
    pub fn with_version(mut self, version: &str) -> Self {
        self.versions
            .insert(version.to_string(), VersionManifest::default());
        self
    }

    /// Add a version declaring the given peer dependencies
    pub fn with_peer_version(mut self, version: &str, peers: &[(&str, &str)]) -> Self {
        let peers = peers
            .iter()
            .map(|(name, spec)| (name.to_string(), serde_json::Value::from(*spec)))
            .collect();
        self.versions.insert(
            version.to_string(),
            VersionManifest {
                peer_dependencies: Some(peers),
            },
        );
        self
    }

    /// Check whether the registry lists this exact version string
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }

    pub fn manifest(&self, version: &str) -> Option<&VersionManifest> {
        self.versions.get(version)
    }

    /// All listed versions that parse as semver. Malformed entries are skipped.
    pub fn versions(&self) -> Vec<Version> {
        self.versions
            .keys()
            .filter_map(|v| Version::parse(v).ok())
            .collect()
    }
}

impl VersionManifest {
    pub fn peer_dependencies(&self) -> Vec<PeerRequirement<'_>> {
        self.peer_dependencies
            .iter()
            .flat_map(|peers| peers.iter())
            .map(|(name, spec)| PeerRequirement {
                name: name.as_str(),
                specifier: spec.as_str(),
            })
            .collect()
    }
}
