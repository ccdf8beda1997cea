//! Resolve a single package specifier against the registry

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use stackmate::config::StackmateConfig;
use stackmate::output::{OutputFormat, StackmateOutput};
use stackmate::registry::RegistryClient;
use stackmate::resolver::{Resolution, VersionResolver, VersionSpecifier};

pub async fn run(
    package: &str,
    specifier: &str,
    limit: usize,
    offline: bool,
    config: &StackmateConfig,
    format: OutputFormat,
) -> Result<()> {
    if format != OutputFormat::Json {
        println!("Resolving {}@{}...", package.cyan(), specifier);
        println!();
    }

    let registry = if offline {
        RegistryClient::offline()
    } else {
        config.registry_client()?
    };
    let resolver = VersionResolver::new(Arc::new(registry));
    let resolution = resolver.resolve(package, specifier).await;

    // Candidate versions within the specifier's range, newest first
    let mut candidates = Vec::new();
    if let (Some(metadata), Some(range)) = (
        resolver.registry().fetch(package).await,
        VersionSpecifier::parse(specifier).range(),
    ) {
        candidates = metadata
            .versions()
            .into_iter()
            .filter(|v| range.matches(v))
            .collect();
        candidates.sort_by(|a, b| b.cmp(a));
        candidates.truncate(limit);
    }

    if format == OutputFormat::Json {
        let output = StackmateOutput::new("resolve")
            .with_success(true)
            .with_data(serde_json::json!({
                "package": package,
                "specifier": specifier,
                "resolution": resolution,
                "candidates": candidates.iter().map(|v| v.to_string()).collect::<Vec<_>>()
            }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    match &resolution {
        Resolution::Resolved { specifier: resolved, .. } => {
            println!("{} {} → {}", "✓".green(), specifier.dimmed(), resolved.green().bold());
        }
        Resolution::Unchanged { reason, .. } => {
            println!("{} {} kept ({})", "→".yellow(), specifier, reason);
        }
        Resolution::Unparseable { .. } => {
            println!(
                "{} '{}' is not a version or range; kept as written",
                "⚠".yellow(),
                specifier
            );
        }
    }

    if !candidates.is_empty() {
        println!();
        println!("{}", "Matching Versions:".bold());
        for version in &candidates {
            println!("  {}", version);
        }
    }

    Ok(())
}
