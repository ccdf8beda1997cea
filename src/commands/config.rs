//! Configuration commands for Stackmate
//! Provides `stackmate config init` and `stackmate config validate` subcommands.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use stackmate::config::StackmateConfig;
use stackmate::output::{OutputFormat, StackmateOutput};

/// Config subcommand action
#[derive(Debug, Clone)]
pub enum ConfigAction {
    Init { force: bool },
    Validate,
}

/// Run the config command
pub fn run(action: ConfigAction, path: &Path, format: OutputFormat) -> Result<()> {
    match action {
        ConfigAction::Init { force } => run_init(path, force, format),
        ConfigAction::Validate => run_validate(path, format),
    }
}

/// Create a default configuration file
fn run_init(path: &Path, force: bool, format: OutputFormat) -> Result<()> {
    let display = path.display().to_string();

    if path.exists() && !force {
        if format == OutputFormat::Json {
            let output = StackmateOutput::new("config init")
                .with_success(false)
                .with_data(serde_json::json!({
                    "error": "Config file already exists",
                    "path": display,
                    "hint": "Use --force to overwrite"
                }));
            println!("{}", output.to_json()?);
        } else {
            println!("{} {} already exists", "Error:".red().bold(), display.cyan());
            println!("Use {} to overwrite.", "--force".cyan());
        }
        return Ok(());
    }

    let config = StackmateConfig::create_default(path)?;

    if format == OutputFormat::Json {
        let output = StackmateOutput::new("config init")
            .with_success(true)
            .with_data(serde_json::json!({
                "path": display,
                "created": true,
                "config": config
            }));
        println!("{}", output.to_json()?);
    } else {
        println!("{} Created {}", "✓".green().bold(), display.cyan());
        println!();
        println!("You can customize:");
        println!("  • {} - Registry URL, timeout and cache", "[registry]".cyan());
        println!("  • {} - Recommendation thresholds", "[analysis]".cyan());
    }

    Ok(())
}

/// Validate the configuration file
fn run_validate(path: &Path, format: OutputFormat) -> Result<()> {
    let display = path.display().to_string();

    if !path.exists() {
        if format == OutputFormat::Json {
            let output = StackmateOutput::new("config validate")
                .with_success(false)
                .with_data(serde_json::json!({
                    "error": "Config file not found",
                    "path": display,
                    "hint": "Run `stackmate config init` to create one"
                }));
            println!("{}", output.to_json()?);
        } else {
            println!("{} {} not found", "Error:".red().bold(), display.cyan());
            println!("Run {} to create one.", "stackmate config init".cyan());
        }
        return Ok(());
    }

    let result = StackmateConfig::load_from(path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match result {
        Ok(config) => {
            if format == OutputFormat::Json {
                let output = StackmateOutput::new("config validate")
                    .with_success(true)
                    .with_data(serde_json::json!({
                        "path": display,
                        "valid": true,
                        "registry": config.registry.url
                    }));
                println!("{}", output.to_json()?);
            } else {
                println!("{} {} is valid", "✓".green().bold(), display.cyan());
                println!();
                println!("  {} Registry: {}", "→".cyan(), config.registry.url);
                println!(
                    "  {} Cache: {} packages, {}s TTL",
                    "→".cyan(),
                    config.registry.cache_capacity,
                    config.registry.cache_ttl_seconds
                );
            }
        }
        Err(e) => {
            if format == OutputFormat::Json {
                let output = StackmateOutput::new("config validate")
                    .with_success(false)
                    .with_data(serde_json::json!({
                        "path": display,
                        "valid": false,
                        "error": format!("{:#}", e)
                    }));
                println!("{}", output.to_json()?);
            } else {
                println!("{} {} is invalid", "✗".red().bold(), display.cyan());
                println!("  {:#}", e);
            }
        }
    }

    Ok(())
}
