//! Bundle stores.
//!
//! A store persists bundles and their versions and knows how to materialize
//! a version into an install directory. Two backends ship with the crate:
//!
//! - `git` - read-only, versions are derived from a remote's branches and tags
//! - `local` - read-write, bundles live as tarballs under a base directory
//!
//! Backends are looked up by name through [`StoreRegistry`].

pub mod git;
pub mod local;
mod registry;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, ConfigSpec};
use crate::model::{Bundle, BundleVersion};

pub use registry::{StoreFactory, StoreRegistry};

const SUPPORTED_URL_FORMATS: &str = "Supported formats are
- Repo url for all bundles: i.e. https://github.com/user/<bundles-repo>.git or git@github.com:user/<bundles-repo>.git
- Org url containing multiple bundles: i.e. https://github.com/user or git@github.com:user";

/// Failures callers need to tell apart. Everything else is a plain `anyhow` error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{store}:{operation} not applicable")]
    NotApplicable {
        store: String,
        operation: &'static str,
    },

    #[error("Bundle {bundle}@{version} not found")]
    VersionNotFound { bundle: String, version: String },

    #[error("Invalid git url [{url}]. {help}", help = SUPPORTED_URL_FORMATS)]
    InvalidRepoUrl { url: String },

    #[error("Unsupported git ref line {line}")]
    MalformedRef { line: String },

    #[error("Unknown store - {name}")]
    UnknownStore { name: String },

    #[error("Repo is needed by the {store} store")]
    MissingRepo { store: String },
}

/// Filters for [`Store::query_bundle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleQuery {
    /// Exact version, arbitrary ref name, or an npm style range.
    pub version: Option<String>,
    pub tag: Option<String>,
}

impl BundleQuery {
    pub fn version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            tag: None,
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            version: None,
            tag: Some(tag.into()),
        }
    }
}

/// Where the bundle contents come from when publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Project directory holding `package.json` and `node_modules`.
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub target_dir: PathBuf,
    /// The version is already present under `target_dir`.
    pub exists: bool,
}

/// Selects bundles in [`Store::list_bundles`].
#[derive(Clone, Default)]
pub enum BundlePattern {
    #[default]
    All,
    /// Bundle name contains the string.
    Substring(String),
    Regex(Regex),
    Predicate(Arc<dyn Fn(&Bundle) -> bool + Send + Sync>),
}

impl BundlePattern {
    pub fn matches(&self, bundle: &Bundle) -> bool {
        match self {
            BundlePattern::All => true,
            BundlePattern::Substring(s) => bundle.name.contains(s.as_str()),
            BundlePattern::Regex(re) => re.is_match(&bundle.name),
            BundlePattern::Predicate(f) => f(bundle),
        }
    }
}

impl fmt::Debug for BundlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundlePattern::All => f.write_str("All"),
            BundlePattern::Substring(s) => f.debug_tuple("Substring").field(s).finish(),
            BundlePattern::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            BundlePattern::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A bundle storage backend.
///
/// Write operations return `Ok(false)` when they lose a race against a
/// concurrent writer or the target already exists; backends that cannot
/// write fail with [`StoreError::NotApplicable`].
#[async_trait]
pub trait Store: Send + Sync {
    fn name(&self) -> &str;

    /// Extra configuration keys the backend reads in [`Store::init`].
    fn config_specs(&self) -> Vec<ConfigSpec> {
        Vec::new()
    }

    async fn init(&mut self, config: &Config) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    /// Create the bundle record. `Ok(false)` if it already exists.
    async fn create_bundle(&self, bundle: &Bundle) -> Result<bool>;

    /// Build and store a new version. `Ok(false)` if the version exists.
    async fn save_bundle_version(
        &self,
        bundle: &mut Bundle,
        version: &BundleVersion,
        options: &BuildOptions,
    ) -> Result<bool>;

    /// Replace the contents and metadata of a version, creating it if missing.
    async fn update_bundle_version(
        &self,
        bundle: &mut Bundle,
        version: &BundleVersion,
        options: &BuildOptions,
    ) -> Result<bool>;

    /// Move `tag` to `version`, or clear the version's tag with `None`.
    async fn set_bundle_version_tag(
        &self,
        bundle: &mut Bundle,
        version: &mut BundleVersion,
        tag: Option<String>,
    ) -> Result<bool>;

    /// Soft-delete a version, returning the name it was archived under.
    async fn delete_bundle_version(
        &self,
        bundle: &mut Bundle,
        version: &BundleVersion,
    ) -> Result<String>;

    /// Materialize a version. `Ok(None)` when there was nothing to do.
    async fn install_bundle(
        &self,
        bundle: &Bundle,
        version: &BundleVersion,
        options: &InstallOptions,
    ) -> Result<Option<PathBuf>>;

    /// Look a bundle up, filling `versions` with the candidates, best first.
    async fn query_bundle(&self, name: &str, query: &BundleQuery) -> Result<Option<Bundle>>;

    async fn list_bundles(&self, pattern: &BundlePattern) -> Result<Vec<Bundle>>;
}

pub(crate) fn not_applicable(store: &str, operation: &'static str) -> anyhow::Error {
    log::warn!("{}:{} should not be called", store, operation);
    StoreError::NotApplicable {
        store: store.to_string(),
        operation,
    }
    .into()
}
