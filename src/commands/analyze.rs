//! Analyze a dependency set against the registry

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use stackmate::config::StackmateConfig;
use stackmate::output::{OutputFormat, StackmateOutput};
use stackmate::utils::{parse_dependency_args, read_manifest_dependencies, DependencyKind};
use stackmate::{presets, AnalysisReport, DependencyAnalyzer, DependencyMap};

/// Where the dependencies to analyze come from
#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub packages: Vec<String>,
    pub manifest: Option<String>,
    pub dev: bool,
    pub preset: Option<String>,
}

pub async fn run(
    input: AnalyzeInput,
    offline: bool,
    config: &StackmateConfig,
    format: OutputFormat,
) -> Result<()> {
    let dependencies = collect_dependencies(&input)?;

    if dependencies.is_empty() {
        anyhow::bail!("No dependencies to analyze. Pass name@version arguments, --manifest or --preset");
    }

    if format != OutputFormat::Json {
        println!(
            "Analyzing {} dependencies{}...",
            dependencies.len().to_string().bold(),
            if offline { " (offline)" } else { "" }
        );
        println!();
    }

    let analyzer = if offline {
        DependencyAnalyzer::offline().with_monorepo_threshold(config.analysis.monorepo_threshold)
    } else {
        DependencyAnalyzer::from_config(config)?
    };

    let report = analyzer.analyze(&dependencies).await;

    if format == OutputFormat::Json {
        let output = StackmateOutput::new("analyze")
            .with_success(true)
            .with_data(serde_json::json!({
                "offline": offline,
                "input": dependencies,
                "report": report
            }));
        println!("{}", output.to_json()?);
    } else {
        print_report(&dependencies, &report);
    }

    Ok(())
}

fn collect_dependencies(input: &AnalyzeInput) -> Result<DependencyMap> {
    let mut dependencies = DependencyMap::new();

    if let Some(name) = &input.preset {
        let preset = presets::preset(name).with_context(|| {
            format!(
                "Unknown preset '{}'. Available: {}",
                name,
                presets::names().join(", ")
            )
        })?;
        dependencies.extend(preset);
    }

    if let Some(manifest) = &input.manifest {
        let kind = if input.dev {
            DependencyKind::DevDependencies
        } else {
            DependencyKind::Dependencies
        };
        dependencies.extend(read_manifest_dependencies(Path::new(manifest), kind)?);
    }

    // Explicit arguments win over manifest and preset entries
    dependencies.extend(parse_dependency_args(&input.packages)?);

    Ok(dependencies)
}

fn print_report(input: &DependencyMap, report: &AnalysisReport) {
    println!("{}", "Resolved Dependencies".bold().cyan());
    println!("{}", "═".repeat(60).dimmed());

    let width = report
        .updated_dependencies
        .keys()
        .map(|k| k.len())
        .max()
        .unwrap_or(0);

    for (name, resolved) in &report.updated_dependencies {
        match input.get(name) {
            Some(original) if original != resolved => {
                println!(
                    "  {}  {} → {}",
                    format!("{:width$}", name, width = width).cyan(),
                    original.dimmed(),
                    resolved.green()
                );
            }
            _ => println!(
                "  {}  {}",
                format!("{:width$}", name, width = width).cyan(),
                resolved
            ),
        }
    }
    println!();

    if !report.version_updates.is_empty() {
        println!("{}", "Version Updates".bold());
        for update in &report.version_updates {
            println!("  {} {}", "→".green(), update);
        }
        println!();
    }

    if !report.compatibility_warnings.is_empty() {
        println!("{}", "Compatibility Warnings".bold());
        for warning in &report.compatibility_warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
        println!();
    }

    if !report.recommendations.is_empty() {
        println!("{}", "Recommendations".bold());
        for recommendation in &report.recommendations {
            println!("  {} {}", "•".cyan(), recommendation);
        }
        println!();
    }

    if report.has_changes(input) {
        println!(
            "{} {} warning(s) while resolving",
            "✓".green(),
            report.warning_count()
        );
    } else {
        println!("{} All dependencies already resolved", "✓".green());
    }
}
