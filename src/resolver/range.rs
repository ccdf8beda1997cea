//! Version specifiers and npm-style version ranges.

use semver::{Comparator, Op, Version, VersionReq};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("empty comparator in range '{0}'")]
    Empty(String),

    #[error("invalid comparator '{comparator}' in range '{range}': {reason}")]
    InvalidComparator {
        range: String,
        comparator: String,
        reason: String,
    },
}

/// A desired version as written in a dependency map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpecifier {
    /// `^X.Y.Z`: `>=X.Y.Z <(X+1).0.0`
    Caret(Version),
    /// `~X.Y.Z`: `>=X.Y.Z <X.(Y+1).0`
    Tilde(Version),
    /// A bare, fully specified version
    Exact(Version),
    /// Anything else that reads as a range (`>=1.2.0`, `1.x || 2.x`, ...)
    Range(VersionRange),
    /// Neither of the above (`latest`, `^5.8`, `workspace:*`, ...)
    Unparseable,
}

impl VersionSpecifier {
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();

        if let Some(rest) = spec.strip_prefix('^') {
            return Version::parse(rest.trim())
                .map(Self::Caret)
                .unwrap_or(Self::Unparseable);
        }
        if let Some(rest) = spec.strip_prefix('~') {
            return Version::parse(rest.trim())
                .map(Self::Tilde)
                .unwrap_or(Self::Unparseable);
        }
        if let Ok(version) = Version::parse(spec) {
            return Self::Exact(version);
        }

        VersionRange::parse(spec)
            .map(Self::Range)
            .unwrap_or(Self::Unparseable)
    }

    /// The range of versions this specifier accepts during resolution.
    /// `None` when the specifier is unparseable or its upper bound overflows.
    pub fn range(&self) -> Option<VersionRange> {
        match self {
            Self::Caret(v) => VersionRange::caret(v),
            Self::Tilde(v) => VersionRange::tilde(v),
            Self::Exact(v) => Some(VersionRange::exact(v)),
            Self::Range(r) => Some(r.clone()),
            Self::Unparseable => None,
        }
    }
}

/// Union (`||`) of comparator intersections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    sets: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse an npm range expression
    pub fn parse(input: &str) -> Result<Self, RangeError> {
        let sets = input
            .split("||")
            .map(|set| parse_set(input, set.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sets })
    }

    pub fn exact(version: &Version) -> Self {
        Self::single(vec![bound(Op::Exact, version)])
    }

    pub fn at_least(version: &Version) -> Self {
        Self::single(vec![bound(Op::GreaterEq, version)])
    }

    /// `>=X.Y.Z <(X+1).0.0`, including when `X` is 0.
    /// `None` if `X + 1` does not fit.
    pub fn caret(version: &Version) -> Option<Self> {
        let upper = Version::new(version.major.checked_add(1)?, 0, 0);
        Some(Self::single(vec![
            bound(Op::GreaterEq, version),
            bound(Op::Less, &upper),
        ]))
    }

    /// `>=X.Y.Z <X.(Y+1).0`. `None` if `Y + 1` does not fit.
    pub fn tilde(version: &Version) -> Option<Self> {
        let upper = Version::new(version.major, version.minor.checked_add(1)?, 0);
        Some(Self::single(vec![
            bound(Op::GreaterEq, version),
            bound(Op::Less, &upper),
        ]))
    }

    fn single(comparators: Vec<Comparator>) -> Self {
        Self {
            sets: vec![VersionReq { comparators }],
        }
    }

    /// Pre-release versions only match a set that names the same
    /// `major.minor.patch` with a pre-release tag.
    pub fn matches(&self, version: &Version) -> bool {
        self.sets.iter().any(|set| set.matches(version))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sets: Vec<String> = self.sets.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", sets.join(" || "))
    }
}

fn bound(op: Op, version: &Version) -> Comparator {
    Comparator {
        op,
        major: version.major,
        minor: Some(version.minor),
        patch: Some(version.patch),
        pre: version.pre.clone(),
    }
}

fn is_wildcard(token: &str) -> bool {
    matches!(token, "*" | "x" | "X")
}

fn parse_set(range: &str, set: &str) -> Result<VersionReq, RangeError> {
    if set.is_empty() || is_wildcard(set) {
        return Ok(VersionReq::STAR);
    }

    // Hyphen range: `A - B` is `>=A <=B`
    if let Some((low, high)) = set.split_once(" - ") {
        let comparators = vec![
            parse_comparator(range, &format!(">={}", low.trim()))?,
            parse_comparator(range, &format!("<={}", high.trim()))?,
        ];
        return Ok(VersionReq { comparators });
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in set.split_whitespace() {
        // `>= 1.2.3` is written with a space after the operator
        if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '^' | '~')) {
            pending_op = Some(token);
            continue;
        }
        let token = match pending_op.take() {
            Some(op) => format!("{}{}", op, token),
            None => token.to_string(),
        };
        if is_wildcard(&token) {
            continue;
        }
        comparators.push(parse_comparator(range, &token)?);
    }

    if let Some(op) = pending_op {
        return Err(RangeError::InvalidComparator {
            range: range.to_string(),
            comparator: op.to_string(),
            reason: "operator without version".to_string(),
        });
    }

    Ok(VersionReq { comparators })
}

fn parse_comparator(range: &str, token: &str) -> Result<Comparator, RangeError> {
    if token.is_empty() {
        return Err(RangeError::Empty(range.to_string()));
    }

    let split = token
        .find(|c: char| !matches!(c, '<' | '>' | '=' | '^' | '~'))
        .unwrap_or(token.len());
    let (op, version) = token.split_at(split);
    let version = version.strip_prefix(['v', 'V']).unwrap_or(version);

    // npm reads a bare version as an exact match; semver would read it as caret
    let has_wildcard = version.split('.').any(is_wildcard);
    let op = if op.is_empty() && !has_wildcard { "=" } else { op };

    let normalized = format!("{}{}", op, version);
    Comparator::parse(&normalized).map_err(|e| RangeError::InvalidComparator {
        range: range.to_string(),
        comparator: token.to_string(),
        reason: e.to_string(),
    })
}

/// Strip a leading `^` or `~` from a resolved specifier
pub fn strip_prefix(spec: &str) -> &str {
    spec.trim().trim_start_matches(['^', '~'])
}

/// Highest version in `versions` accepted by `range`
pub fn max_satisfying<'a, I>(versions: I, range: &VersionRange) -> Option<Version>
where
    I: IntoIterator<Item = &'a Version>,
{
    versions
        .into_iter()
        .filter(|v| range.matches(v))
        .max()
        .cloned()
}
