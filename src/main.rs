use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

use commands::analyze::AnalyzeInput;
use commands::config::ConfigAction;
use stackmate::config::{StackmateConfig, CONFIG_FILE};
use stackmate::output::OutputFormat;

/// Stackmate - npm dependency resolution & compatibility engine
/// Resolves version ranges against the registry and reconciles peer dependencies.
#[derive(Parser)]
#[command(name = "stackmate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Path to the configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and reconcile a set of dependencies
    Analyze {
        /// Dependencies as name@version (e.g. "next@^14.0.0", "@types/node@^20.0.0")
        packages: Vec<String>,

        /// Read dependencies from a package.json
        #[arg(short, long)]
        manifest: Option<String>,

        /// Read devDependencies instead of dependencies from the manifest
        #[arg(long, requires = "manifest")]
        dev: bool,

        /// Start from a built-in dependency preset
        #[arg(short, long)]
        preset: Option<String>,

        /// Skip the registry; specifiers pass through unchanged
        #[arg(long)]
        offline: bool,
    },

    /// Resolve one package specifier to the best available version
    Resolve {
        /// Package name (e.g. "react", "@types/node")
        package: String,

        /// Version specifier (e.g. "^18.0.0", "~5.8.0", ">=2.0.0")
        specifier: String,

        /// Number of matching versions to list
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Skip the registry
        #[arg(long)]
        offline: bool,
    },

    /// List built-in dependency presets
    Presets,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Create default stackmate.toml configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = OutputFormat::from_str(&cli.format);
    let is_json = format == OutputFormat::Json;

    stackmate::logging::init(cli.verbose);

    let result = run(cli, format).await;

    if let Err(e) = result {
        if is_json {
            let error_output = serde_json::json!({
                "success": false,
                "error": format!("{:#}", e),
                "timestamp": chrono::Utc::now().to_rfc3339()
            });
            eprintln!("{}", serde_json::to_string_pretty(&error_output).unwrap_or_default());
        } else {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, format: OutputFormat) -> anyhow::Result<()> {
    let command = match cli.command {
        Commands::Config { action } => {
            let config_action = match action {
                ConfigCommands::Init { force } => ConfigAction::Init { force },
                ConfigCommands::Validate => ConfigAction::Validate,
            };
            return commands::config::run(config_action, &cli.config, format);
        }
        other => other,
    };

    let config = StackmateConfig::load_from(&cli.config)?.with_env_overrides();

    if format != OutputFormat::Json {
        println!("{}", "⚡ Stackmate".bold().cyan());
        println!("{}", "Dependency resolution & compatibility".dimmed());
        println!();
    }

    match command {
        Commands::Analyze {
            packages,
            manifest,
            dev,
            preset,
            offline,
        } => {
            let input = AnalyzeInput {
                packages,
                manifest,
                dev,
                preset,
            };
            commands::analyze::run(input, offline, &config, format).await
        }
        Commands::Resolve {
            package,
            specifier,
            limit,
            offline,
        } => commands::resolve::run(&package, &specifier, limit, offline, &config, format).await,
        Commands::Presets => commands::presets::run(format),
        Commands::Config { .. } => Ok(()),
    }
}
