//! Mapping between bundle versions and git reference names.
//!
//! A remote is either *dedicated* (one repository per bundle under an owner
//! URL, versions are plain tags such as `v1.2.0`) or a *single repo* holding
//! every bundle, with tags that embed the bundle name next to the version
//! (`dummy-1/v0.6.2`, `v0.7.1-dummy_2`). Name and version are separated by
//! any character that is neither a word character nor a dot.

use anyhow::{Context, Result};
use log::debug;
use regex::Regex;
use url::Url;

use crate::store::StoreError;
use crate::version;

const SSH_URL: &str = r"^git@[^:#]+:[^#/]+(?:/([^.]*))?(?:\.git)?$";
const URL_PATH: &str = r"^/[^#/]+(?:/([^.]*))?(?:\.git)?$";
const VERSION_PATTERN: &str = r"v?\d+\.\d+\.\d+(?:-[\w\.-]+)?";

/// Where the versions of a bundle live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLayout {
    /// URL handed to `git ls-remote` and `git clone`.
    pub url: String,
    pub single_repo: bool,
}

/// Work out the repository layout for `name` from the configured remote.
///
/// `git@host:owner` and `https://host/owner` address one repository per
/// bundle (`<owner>/<name>.git`); a URL naming a repository holds every
/// bundle.
pub fn resolve_repo_url(repo: &str, name: &str) -> Result<RepoLayout> {
    let (pattern, subject) = if repo.starts_with("git@") {
        (SSH_URL, repo.to_string())
    } else {
        let parsed = Url::parse(repo).map_err(|_| invalid_url(repo))?;
        (URL_PATH, parsed.path().to_string())
    };

    let regex = Regex::new(pattern).context("Failed to build repo url pattern")?;
    let captures = regex.captures(&subject).ok_or_else(|| invalid_url(repo))?;
    let has_repo = captures.get(1).is_some_and(|m| !m.as_str().is_empty());
    Ok(layout_for(repo, name, has_repo))
}

fn invalid_url(repo: &str) -> StoreError {
    StoreError::InvalidRepoUrl {
        url: repo.to_string(),
    }
}

fn layout_for(repo: &str, name: &str, has_repo: bool) -> RepoLayout {
    if has_repo {
        debug!("Using single repo {} for all bundles", repo);
        return RepoLayout {
            url: repo.to_string(),
            single_repo: true,
        };
    }
    let separator = if repo.ends_with('/') { "" } else { "/" };
    let url = format!("{}{}{}.git", repo, separator, name);
    debug!("Bundle repo is {}", url);
    RepoLayout {
        url,
        single_repo: false,
    }
}

/// Decides whether a reference holds a specific bundle version.
#[derive(Debug, Clone)]
pub enum VersionChecker {
    Exact(String),
    Embedded(Regex),
}

impl VersionChecker {
    pub fn new(name: &str, version: &str, single_repo: bool) -> Result<Self> {
        if !single_repo {
            return Ok(VersionChecker::Exact(version.to_string()));
        }
        let name = regex::escape(name);
        let version = regex::escape(version);
        let pattern = format!(
            r"^(?:(?:.*?[^\w\.])?({name})[^\w\.])?.*?(v?{version})(?:(?:.*?(?:[^\w\.]({name}))(?:[^\w\.].*?)?)?|(?:.*?))$"
        );
        let regex = Regex::new(&pattern).context("Failed to build version checker")?;
        Ok(VersionChecker::Embedded(regex))
    }

    pub fn matches(&self, ref_name: &str) -> bool {
        match self {
            VersionChecker::Exact(version) => version == ref_name,
            VersionChecker::Embedded(regex) => regex.captures(ref_name).is_some_and(|caps| {
                debug!(
                    "check [single-repo]: {} => [{:?},{:?},{:?}]",
                    ref_name,
                    caps.get(1).map(|m| m.as_str()),
                    caps.get(2).map(|m| m.as_str()),
                    caps.get(3).map(|m| m.as_str())
                );
                caps.get(2).is_some() && (caps.get(1).is_some() || caps.get(3).is_some())
            }),
        }
    }
}

/// Derives the bundle version a reference holds, if any.
#[derive(Debug, Clone)]
pub enum VersionEvaluator {
    Semver,
    Embedded(Regex),
}

impl VersionEvaluator {
    pub fn new(name: &str, single_repo: bool) -> Result<Self> {
        if !single_repo {
            return Ok(VersionEvaluator::Semver);
        }
        let name = regex::escape(name);
        let pattern = format!(
            r"^(?:(?:.*?[^\w\.])?({VERSION_PATTERN})[^\w\.])?.*?({name})(?:(?:.*?(?:[^\w\.]({VERSION_PATTERN}))(?:[^\w\.].*?)?)?|(?:.*?))$"
        );
        let regex = Regex::new(&pattern).context("Failed to build version evaluator")?;
        Ok(VersionEvaluator::Embedded(regex))
    }

    pub fn evaluate(&self, ref_name: &str) -> Option<String> {
        match self {
            VersionEvaluator::Semver => {
                version::is_valid(ref_name).then(|| ref_name.to_string())
            }
            VersionEvaluator::Embedded(regex) => {
                let caps = regex.captures(ref_name)?;
                caps.get(1)
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string())
            }
        }
    }
}
