//! Utility functions for Stackmate
//! Reading dependency maps from `package.json` and from command-line arguments.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::compat::DependencyMap;

/// Which dependency table of a manifest to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Dependencies,
    DevDependencies,
}

impl DependencyKind {
    pub fn field(&self) -> &'static str {
        match self {
            DependencyKind::Dependencies => "dependencies",
            DependencyKind::DevDependencies => "devDependencies",
        }
    }
}

/// Read one dependency table from a `package.json`.
/// Entries whose value is not a string are skipped.
pub fn read_manifest_dependencies(path: &Path, kind: DependencyKind) -> Result<DependencyMap> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let deps = manifest
        .get(kind.field())
        .and_then(|v| v.as_object())
        .map(|table| {
            table
                .iter()
                .filter_map(|(name, spec)| spec.as_str().map(|s| (name.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(deps)
}

/// Split `name@spec` into its parts. Scoped names keep their leading `@`;
/// a missing spec means `*`.
pub fn parse_dependency_arg(arg: &str) -> Result<(String, String)> {
    let arg = arg.trim();
    let (scope_prefix, rest) = match arg.strip_prefix('@') {
        Some(rest) => ("@", rest),
        None => ("", arg),
    };

    let (name, spec) = match rest.split_once('@') {
        Some((name, spec)) => (name, spec),
        None => (rest, "*"),
    };

    if name.is_empty() || (scope_prefix == "@" && !name.contains('/')) {
        anyhow::bail!("Invalid dependency '{}': expected name@version", arg);
    }

    let spec = if spec.is_empty() { "*" } else { spec };
    Ok((format!("{}{}", scope_prefix, name), spec.to_string()))
}

/// Collect `name@spec` arguments into a dependency map
pub fn parse_dependency_args<S: AsRef<str>>(args: &[S]) -> Result<DependencyMap> {
    args.iter()
        .map(|arg| parse_dependency_arg(arg.as_ref()))
        .collect()
}
