//! Resolution engine tests for Stackmate
//!
//! Drives the analyzer end to end against in-memory registry metadata.

use std::sync::Arc;
use std::time::Duration;

use stackmate::analyzer::{MONOREPO_RECOMMENDATION, TYPES_RECOMMENDATION};
use stackmate::registry::StaticSource;
use stackmate::{
    DependencyAnalyzer, DependencyMap, MetadataCache, PackageMetadata, RegistryClient, Resolution,
    UnchangedReason, VersionResolver, WarningKind,
};

/// Helper to build a dependency map
fn deps(entries: &[(&str, &str)]) -> DependencyMap {
    entries
        .iter()
        .map(|(name, spec)| (name.to_string(), spec.to_string()))
        .collect()
}

/// Helper to build package metadata listing plain versions
fn package(name: &str, versions: &[&str]) -> PackageMetadata {
    versions
        .iter()
        .fold(PackageMetadata::new(name), |meta, v| meta.with_version(v))
}

fn analyzer_for(source: Arc<StaticSource>) -> DependencyAnalyzer {
    DependencyAnalyzer::new(Arc::new(RegistryClient::new(source, MetadataCache::default())))
}

fn resolver_for(source: Arc<StaticSource>) -> VersionResolver {
    VersionResolver::new(Arc::new(RegistryClient::new(source, MetadataCache::default())))
}

// ============================================================================
// Single Specifier Resolution
// ============================================================================

#[tokio::test]
async fn test_caret_selects_highest_in_major() {
    let source = Arc::new(StaticSource::new().with_package(
        "typescript",
        package("typescript", &["5.8.0", "5.8.5", "5.9.0", "6.0.0"]),
    ));
    let resolver = resolver_for(source);

    let resolution = resolver.resolve("typescript", "^5.8.0").await;
    assert!(resolution.is_resolved());
    assert_eq!(resolution.specifier(), "^5.9.0");
}

#[tokio::test]
async fn test_tilde_selects_highest_in_minor() {
    let source = Arc::new(StaticSource::new().with_package(
        "typescript",
        package("typescript", &["5.8.0", "5.8.5", "5.9.0", "6.0.0"]),
    ));
    let resolver = resolver_for(source);

    let resolution = resolver.resolve("typescript", "~5.8.0").await;
    assert_eq!(resolution.specifier(), "^5.8.5");
}

#[tokio::test]
async fn test_unknown_package_fails_open() {
    let resolver = resolver_for(Arc::new(StaticSource::new()));

    for spec in ["^1.0.0", "~2.3.4", ">=1.0.0 <2.0.0", "1.2.3", "latest", "", "^not.a.version"] {
        let resolution = resolver.resolve("ghost", spec).await;
        assert_eq!(resolution.specifier(), spec);
        assert!(!resolution.is_resolved());
    }
}

#[tokio::test]
async fn test_unparseable_specifier_kept() {
    let source = Arc::new(
        StaticSource::new().with_package("react", package("react", &["18.2.0"])),
    );
    let resolver = resolver_for(source);

    let resolution = resolver.resolve("react", "github:facebook/react").await;
    assert_eq!(
        resolution,
        Resolution::Unparseable {
            specifier: "github:facebook/react".to_string()
        }
    );
}

#[tokio::test]
async fn test_no_matching_version_kept() {
    let source = Arc::new(
        StaticSource::new().with_package("react", package("react", &["17.0.2", "18.2.0"])),
    );
    let resolver = resolver_for(source);

    let resolution = resolver.resolve("react", "^19.0.0").await;
    assert_eq!(
        resolution,
        Resolution::Unchanged {
            specifier: "^19.0.0".to_string(),
            reason: UnchangedReason::NoMatchingVersion,
        }
    );
}

// ============================================================================
// Whole-Map Analysis
// ============================================================================

#[tokio::test]
async fn test_next_react_scenario() {
    let source = Arc::new(
        StaticSource::new()
            .with_package("next", package("next", &["14.0.0", "14.1.0"]))
            .with_package("react", package("react", &["18.2.0"])),
    );
    let analyzer = analyzer_for(source);

    let input = deps(&[("next", "^14.0.0"), ("react", "^18.2.0")]);
    let report = analyzer.analyze(&input).await;

    assert_eq!(
        report.updated_dependencies,
        deps(&[("next", "^14.1.0"), ("react", "^18.2.0")])
    );
    assert_eq!(report.version_updates.len(), 1);
    assert!(report.version_updates[0].contains("next"));
    assert!(report.compatibility_warnings.is_empty());
    assert!(report.security_warnings.is_empty());
}

#[tokio::test]
async fn test_exact_versions_are_idempotent() {
    let source = Arc::new(
        StaticSource::new()
            .with_package("react", package("react", &["18.2.0", "18.3.1"]))
            .with_package(
                "react-dom",
                PackageMetadata::new("react-dom")
                    .with_peer_version("18.2.0", &[("react", "^18.2.0")])
                    .with_version("18.3.1"),
            ),
    );
    let analyzer = analyzer_for(source);

    let input = deps(&[("react", "18.2.0"), ("react-dom", "18.2.0")]);
    let report = analyzer.analyze(&input).await;

    assert_eq!(report.updated_dependencies, input);
    assert_eq!(report.warning_count(), 0);
    assert!(!report.has_changes(&input));
}

#[tokio::test]
async fn test_peer_requirement_bumps_peer() {
    let source = Arc::new(
        StaticSource::new()
            .with_package(
                "pkg-a",
                PackageMetadata::new("pkg-a").with_peer_version("1.0.0", &[("pkg-b", ">=2.0.0")]),
            )
            .with_package("pkg-b", package("pkg-b", &["1.0.0", "2.0.0", "2.1.0"])),
    );
    let analyzer = analyzer_for(source);

    let input = deps(&[("pkg-a", "^1.0.0"), ("pkg-b", "1.0.0")]);
    let report = analyzer.analyze(&input).await;

    assert_eq!(report.updated_dependencies["pkg-b"], "^2.1.0");
    assert_eq!(
        report.version_updates,
        vec![
            "Updated pkg-b to 2.1.0 to satisfy peer dependency requirement from pkg-a (>=2.0.0)"
                .to_string()
        ]
    );
    assert!(report.compatibility_warnings.is_empty());
}

#[tokio::test]
async fn test_last_peer_constraint_wins() {
    let source = Arc::new(
        StaticSource::new()
            .with_package(
                "a-lib",
                PackageMetadata::new("a-lib").with_peer_version("1.0.0", &[("shared", ">=2.0.0")]),
            )
            .with_package(
                "z-lib",
                PackageMetadata::new("z-lib")
                    .with_peer_version("1.0.0", &[("shared", ">=1.5.0 <2.0.0")]),
            )
            .with_package("shared", package("shared", &["1.0.0", "1.5.0", "2.0.0"])),
    );
    let analyzer = analyzer_for(source);

    let input = deps(&[("a-lib", "1.0.0"), ("shared", "1.0.0"), ("z-lib", "1.0.0")]);
    let check = analyzer.checker().check(&input).await;

    assert_eq!(check.dependencies["shared"], "^1.5.0");
    let adjusted: Vec<_> = check
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::PeerAdjusted)
        .map(|w| w.package.as_str())
        .collect();
    assert_eq!(adjusted, vec!["shared", "shared"]);
}

#[tokio::test]
async fn test_unverifiable_peer_is_compatibility_warning() {
    let source = Arc::new(
        StaticSource::new()
            .with_package(
                "plugin",
                PackageMetadata::new("plugin").with_peer_version("1.0.0", &[("host", "^2.0.0")]),
            )
            .with_package("host", package("host", &["2.0.0"])),
    );
    let analyzer = analyzer_for(source);

    let input = deps(&[("host", "latest"), ("plugin", "1.0.0")]);
    let report = analyzer.analyze(&input).await;

    assert_eq!(report.updated_dependencies["host"], "latest");
    assert_eq!(
        report.compatibility_warnings,
        vec!["Could not verify compatibility between plugin and host".to_string()]
    );
}

#[tokio::test]
async fn test_missing_version_uses_closest_major() {
    let source = Arc::new(
        StaticSource::new().with_package("legacy", package("legacy", &["0.9.0", "2.0.0", "3.0.0"])),
    );
    let analyzer = analyzer_for(source);

    let input = deps(&[("legacy", "^1.0.0")]);
    let report = analyzer.analyze(&input).await;

    assert_eq!(report.updated_dependencies["legacy"], "^2.0.0");
    assert_eq!(
        report.version_updates,
        vec!["Updated legacy to closest available version: 2.0.0".to_string()]
    );
}

#[tokio::test]
async fn test_closest_version_peers_are_reconciled() {
    let source = Arc::new(
        StaticSource::new()
            .with_package(
                "legacy",
                PackageMetadata::new("legacy")
                    .with_peer_version("2.0.0", &[("react", ">=18.0.0")])
                    .with_version("3.0.0"),
            )
            .with_package("react", package("react", &["17.0.2", "18.2.0"])),
    );
    let analyzer = analyzer_for(source);

    let input = deps(&[("legacy", "^1.0.0"), ("react", "17.0.2")]);
    let check = analyzer.checker().check(&input).await;

    assert_eq!(check.dependencies["legacy"], "^2.0.0");
    assert_eq!(check.dependencies["react"], "^18.2.0");
    let kinds: Vec<_> = check.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::ClosestVersion, WarningKind::PeerAdjusted]);
    assert!(check.warnings[1].message.contains("from legacy (>=18.0.0)"));
}

#[tokio::test]
async fn test_offline_analysis_passes_through() {
    let analyzer = DependencyAnalyzer::offline();
    let input = deps(&[("next", "^14.0.0"), ("react", "^18.2.0")]);

    let report = analyzer.analyze(&input).await;
    assert_eq!(report.updated_dependencies, input);
    assert_eq!(report.warning_count(), 0);
}

// ============================================================================
// Recommendation Tests
// ============================================================================

#[tokio::test]
async fn test_monorepo_recommendation_threshold() {
    let analyzer = DependencyAnalyzer::offline();

    let names: Vec<String> = (0..11).map(|i| format!("pkg-{}", i)).collect();
    let eleven: DependencyMap = names.iter().map(|n| (n.clone(), "^1.0.0".to_string())).collect();
    let ten: DependencyMap = eleven.clone().into_iter().take(10).collect();

    let report = analyzer.analyze(&eleven).await;
    assert!(report
        .recommendations
        .iter()
        .any(|r| r == MONOREPO_RECOMMENDATION));

    let report = analyzer.analyze(&ten).await;
    assert!(report.recommendations.is_empty());
}

#[tokio::test]
async fn test_typescript_types_recommendation() {
    let analyzer = DependencyAnalyzer::offline();

    let report = analyzer
        .analyze(&deps(&[("typescript", "^5.0.0"), ("react", "^18.2.0")]))
        .await;
    assert_eq!(report.recommendations, vec![TYPES_RECOMMENDATION.to_string()]);

    let report = analyzer
        .analyze(&deps(&[("typescript", "^5.0.0"), ("@types/react", "^18.2.0")]))
        .await;
    assert!(report.recommendations.is_empty());
}

// ============================================================================
// Registry Caching Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cache_ttl_boundary() {
    let source = Arc::new(
        StaticSource::new().with_package("react", package("react", &["18.2.0"])),
    );
    let client = RegistryClient::new(
        source.clone(),
        MetadataCache::new(16, Duration::from_secs(3600)),
    );

    assert!(client.fetch("react").await.is_some());
    tokio::time::advance(Duration::from_secs(1800)).await;
    assert!(client.fetch("react").await.is_some());
    assert_eq!(source.fetch_count(), 1);

    tokio::time::advance(Duration::from_secs(1801)).await;
    assert!(client.fetch("react").await.is_some());
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_analysis_fetches_each_package_once_per_pass() {
    let source = Arc::new(
        StaticSource::new()
            .with_package("next", package("next", &["14.0.0", "14.1.0"]))
            .with_package("react", package("react", &["18.2.0"])),
    );
    let analyzer = analyzer_for(Arc::clone(&source));

    let input = deps(&[("next", "^14.0.0"), ("react", "^18.2.0")]);
    analyzer.analyze(&input).await;
    analyzer.analyze(&input).await;

    // Both passes and the second analysis are served from cache
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_concurrent_resolves_share_fetch() {
    let source = Arc::new(
        StaticSource::new().with_package("react", package("react", &["18.2.0", "18.3.1"])),
    );
    let resolver = resolver_for(Arc::clone(&source));

    let resolutions =
        futures::future::join_all((0..5).map(|_| resolver.resolve("react", "^18.0.0"))).await;

    assert!(resolutions.iter().all(|r| r.specifier() == "^18.3.1"));
    assert_eq!(source.fetch_count(), 1);
}
