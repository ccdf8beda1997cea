//! Stackmate - npm dependency resolution & compatibility engine
//! Resolves version specifiers against an npm registry, reconciles peer
//! dependencies across a dependency set and reports what changed.
//!
//! ```no_run
//! use stackmate::{DependencyAnalyzer, DependencyMap};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let analyzer = DependencyAnalyzer::from_config(&Default::default())?;
//! let mut deps = DependencyMap::new();
//! deps.insert("next".to_string(), "^14.0.0".to_string());
//! deps.insert("react".to_string(), "^18.2.0".to_string());
//!
//! let report = analyzer.analyze(&deps).await;
//! for update in &report.version_updates {
//!     println!("{}", update);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod compat;
pub mod config;
pub mod logging;
pub mod output;
pub mod presets;
pub mod registry;
pub mod resolver;
pub mod utils;

// Re-export main types for convenience
pub use analyzer::{AnalysisReport, DependencyAnalyzer};
pub use compat::{
    CompatibilityCheck, CompatibilityChecker, DependencyMap, ResolutionWarning, WarningKind,
};
pub use config::StackmateConfig;
pub use registry::{MetadataCache, MetadataSource, PackageMetadata, RegistryClient, RegistryError};
pub use resolver::{Resolution, UnchangedReason, VersionResolver};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
