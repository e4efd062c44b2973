//! Semantic version helpers.
//!
//! Bundle versions follow npm conventions: a leading `v` or `=` is accepted
//! and ranges use the npm syntax (`^1.2.0`, `1.x`, `>=1.0.0 <2.0.0`,
//! `1.0.0 - 1.4.0`, `a || b`). Ranges are translated into one
//! [`semver::VersionReq`] per `||` alternative.

use anyhow::{Context, Result, bail};
use semver::{Version, VersionReq};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Parse a version string, tolerating a leading `v` or `=`.
pub fn parse_version(input: &str) -> Option<Version> {
    let trimmed = input.trim();
    let bare = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    let bare = bare.strip_prefix('v').unwrap_or(bare);
    Version::parse(bare).ok()
}

pub fn is_valid(input: &str) -> bool {
    parse_version(input).is_some()
}

/// True when `input` is a range rather than a single version or an arbitrary ref.
pub fn is_range(input: &str) -> bool {
    !is_valid(input) && VersionRange::parse(input).is_ok()
}

/// Compare two version strings, valid versions first by precedence.
///
/// Invalid versions sort below valid ones and fall back to string order.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// An npm style version range.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRange {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    pub fn parse(input: &str) -> Result<Self> {
        let alternatives = input
            .split("||")
            .map(|set| {
                let translated = translate_comparator_set(set)?;
                VersionReq::parse(&translated)
                    .with_context(|| format!("Invalid version range: {}", input.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: input.trim().to_string(),
            alternatives,
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Matches a version string; strings that are not versions never match.
    pub fn matches_str(&self, version: &str) -> bool {
        parse_version(version).is_some_and(|v| self.matches(&v))
    }

    /// The exact string, or any version satisfying the range.
    pub fn accepts(spec: &str, candidate: &str) -> bool {
        spec == candidate
            || VersionRange::parse(spec)
                .map(|range| range.matches_str(candidate))
                .unwrap_or(false)
    }
}

impl FromStr for VersionRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "~", "^"];

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", token)
}

fn is_wildcard(version: &str) -> bool {
    version.is_empty()
        || version
            .split('.')
            .any(|part| matches!(part, "x" | "X" | "*"))
}

/// Translate one whitespace separated npm comparator set into the comma
/// separated form `semver` understands.
fn translate_comparator_set(set: &str) -> Result<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in set.split_whitespace() {
        if let Some(op) = pending_op.take() {
            tokens.push(format!("{}{}", op, token));
        } else if OPERATORS.contains(&token) {
            pending_op = Some(token);
        } else {
            tokens.push(token.to_string());
        }
    }
    if let Some(op) = pending_op {
        bail!("Dangling operator '{}' in version range", op);
    }

    let mut comparators = Vec::new();
    let mut idx = 0;
    while idx < tokens.len() {
        if tokens.get(idx + 1).map(String::as_str) == Some("-") {
            let upper = tokens
                .get(idx + 2)
                .with_context(|| format!("Incomplete hyphen range: {}", set.trim()))?;
            comparators.push(format!(">={}", strip_v(&tokens[idx])));
            comparators.push(format!("<={}", strip_v(upper)));
            idx += 3;
            continue;
        }
        comparators.push(translate_comparator(&tokens[idx]));
        idx += 1;
    }

    if comparators.is_empty() {
        return Ok("*".to_string());
    }
    Ok(comparators.join(", "))
}

fn translate_comparator(token: &str) -> String {
    let (op, version) = split_operator(token);
    let version = strip_v(version);
    match op {
        "" if is_wildcard(version) => version.to_string(),
        // A bare npm version is an exact (or partial exact) match.
        "" => format!("={}", version),
        "~>" => format!("~{}", version),
        _ => format!("{}{}", op, version),
    }
}

fn strip_v(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}
