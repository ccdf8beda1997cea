//! List the built-in dependency presets

use anyhow::Result;
use colored::Colorize;

use stackmate::output::{OutputFormat, StackmateOutput};
use stackmate::presets::PRESETS;

pub fn run(format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        let presets: Vec<_> = PRESETS
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name,
                    "description": p.description,
                    "dependencies": p.dependency_map()
                })
            })
            .collect();

        let output = StackmateOutput::new("presets")
            .with_success(true)
            .with_data(serde_json::json!({ "presets": presets }));
        println!("{}", output.to_json()?);
        return Ok(());
    }

    println!("{}", "Available Presets".bold().cyan());
    println!("{}", "═".repeat(60).dimmed());
    for preset in PRESETS {
        println!(
            "  {} {} ({} packages)",
            preset.name.cyan(),
            preset.description.dimmed(),
            preset.dependencies.len()
        );
    }
    println!();
    println!("{}", "Usage:".dimmed());
    println!("  stackmate analyze --preset <name>");

    Ok(())
}
