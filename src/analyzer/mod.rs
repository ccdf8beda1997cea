//! Dependency analysis: the public entry point of the resolution engine.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::compat::{CompatibilityChecker, DependencyMap};
use crate::config::StackmateConfig;
use crate::registry::RegistryClient;

/// Maps with more entries than this get a monorepo recommendation
pub const DEFAULT_MONOREPO_THRESHOLD: usize = 10;

pub const MONOREPO_RECOMMENDATION: &str =
    "Consider using a monorepo setup with tools like Turborepo for better dependency management";

pub const TYPES_RECOMMENDATION: &str =
    "Add corresponding DefinitelyTyped packages (@types/*) for better TypeScript support";

/// Outcome of analyzing a dependency map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub updated_dependencies: DependencyMap,
    pub compatibility_warnings: Vec<String>,
    pub version_updates: Vec<String>,
    /// Always empty: no security advisory source is consulted
    pub security_warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

impl AnalysisReport {
    /// True if any specifier differs from the input
    pub fn has_changes(&self, input: &DependencyMap) -> bool {
        self.updated_dependencies != *input
    }

    pub fn warning_count(&self) -> usize {
        self.compatibility_warnings.len() + self.version_updates.len()
    }
}

#[derive(Debug, Clone)]
pub struct DependencyAnalyzer {
    checker: CompatibilityChecker,
    monorepo_threshold: usize,
}

impl DependencyAnalyzer {
    pub fn new(registry: Arc<RegistryClient>) -> Self {
        Self {
            checker: CompatibilityChecker::new(registry),
            monorepo_threshold: DEFAULT_MONOREPO_THRESHOLD,
        }
    }

    /// Analyzer talking to the registry described by `config`
    pub fn from_config(config: &StackmateConfig) -> anyhow::Result<Self> {
        let registry = config.registry_client()?;
        Ok(Self::new(Arc::new(registry))
            .with_monorepo_threshold(config.analysis.monorepo_threshold))
    }

    /// Analyzer without registry access. Specifiers pass through unchanged;
    /// only recommendations are produced.
    pub fn offline() -> Self {
        Self::new(Arc::new(RegistryClient::offline()))
    }

    pub fn with_monorepo_threshold(mut self, threshold: usize) -> Self {
        self.monorepo_threshold = threshold;
        self
    }

    pub fn checker(&self) -> &CompatibilityChecker {
        &self.checker
    }

    pub async fn analyze(&self, dependencies: &DependencyMap) -> AnalysisReport {
        let check = self.checker.check(dependencies).await;

        let compatibility_warnings = check
            .warnings
            .iter()
            .filter(|w| w.kind.is_compatibility())
            .map(|w| w.message.clone())
            .collect();
        let version_updates = check
            .warnings
            .iter()
            .filter(|w| w.kind.is_version_update())
            .map(|w| w.message.clone())
            .collect();

        let recommendations =
            recommendations(dependencies, &check.dependencies, self.monorepo_threshold);

        info!(
            packages = dependencies.len(),
            warnings = check.warnings.len(),
            "dependency analysis complete"
        );

        AnalysisReport {
            updated_dependencies: check.dependencies,
            compatibility_warnings,
            version_updates,
            security_warnings: Vec::new(),
            recommendations,
        }
    }
}

/// General recommendations for a dependency set
pub fn recommendations(
    input: &DependencyMap,
    resolved: &DependencyMap,
    monorepo_threshold: usize,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if resolved.len() > monorepo_threshold {
        recommendations.push(MONOREPO_RECOMMENDATION.to_string());
    }

    let has_types = input.keys().any(|name| name.starts_with("@types/"));
    if input.contains_key("typescript") && !has_types {
        recommendations.push(TYPES_RECOMMENDATION.to_string());
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(entries: &[(&str, &str)]) -> DependencyMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn many(n: usize) -> DependencyMap {
        (0..n).map(|i| (format!("pkg-{}", i), "^1.0.0".to_string())).collect()
    }

    #[test]
    fn test_monorepo_threshold() {
        let eleven = many(11);
        assert_eq!(
            recommendations(&eleven, &eleven, DEFAULT_MONOREPO_THRESHOLD),
            vec![MONOREPO_RECOMMENDATION.to_string()]
        );

        let ten = many(10);
        assert!(recommendations(&ten, &ten, DEFAULT_MONOREPO_THRESHOLD).is_empty());
    }

    #[test]
    fn test_typescript_without_types() {
        let input = deps(&[("typescript", "^5.0.0")]);
        assert_eq!(
            recommendations(&input, &input, DEFAULT_MONOREPO_THRESHOLD),
            vec![TYPES_RECOMMENDATION.to_string()]
        );
    }

    #[test]
    fn test_typescript_with_types() {
        let input = deps(&[("typescript", "^5.0.0"), ("@types/node", "^20.0.0")]);
        assert!(recommendations(&input, &input, DEFAULT_MONOREPO_THRESHOLD).is_empty());
    }

    #[test]
    fn test_types_prefix_is_literal() {
        // "@typescript-eslint/parser" does not count as a type-declaration package
        let input = deps(&[("typescript", "^5.0.0"), ("@typescript-eslint/parser", "^6.0.0")]);
        assert_eq!(
            recommendations(&input, &input, DEFAULT_MONOREPO_THRESHOLD),
            vec![TYPES_RECOMMENDATION.to_string()]
        );
    }

    #[tokio::test]
    async fn test_offline_analysis_passes_through() {
        let input = deps(&[("next", "^14.0.0"), ("typescript", "^5.0.0")]);
        let report = DependencyAnalyzer::offline().analyze(&input).await;

        assert_eq!(report.updated_dependencies, input);
        assert!(!report.has_changes(&input));
        assert_eq!(report.warning_count(), 0);
        assert!(report.security_warnings.is_empty());
        assert_eq!(report.recommendations, vec![TYPES_RECOMMENDATION.to_string()]);
    }
}
