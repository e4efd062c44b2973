//! Read-only store backed by a remote git repository.
//!
//! Versions are never written here; they are derived on every query from the
//! remote's branches and tags (see [`resolver`]). Installing a version is a
//! shallow clone of the matching reference.

mod client;
#[cfg(test)]
mod fixtures;
pub mod refs;
pub mod resolver;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use semver::Version;
use std::path::PathBuf;
use tracing::instrument;

use crate::config::{Config, ConfigSpec};
use crate::model::{Bundle, BundleVersion};
use crate::store::{
    BuildOptions, BundlePattern, BundleQuery, InstallOptions, Store, StoreError, not_applicable,
};
use crate::version::{self, VersionRange};

pub use client::{GitCli, GitClient, RefFilter, clone_args, ls_remote_args};
#[cfg(test)]
pub use client::MockGitClient;
use refs::RefListing;
use resolver::{RepoLayout, VersionChecker, VersionEvaluator, resolve_repo_url};

pub const STORE_NAME: &str = "git";

/// Branch names tried for the `latest` tag of a dedicated repository.
const LATEST_BRANCHES: [&str; 3] = ["latest", "master", "main"];

pub struct GitStore<G: GitClient = GitCli> {
    client: G,
    repo: Option<String>,
}

impl<G: GitClient> GitStore<G> {
    pub fn new(client: G) -> Self {
        Self { client, repo: None }
    }

    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }

    fn required_repo(&self) -> Result<&str> {
        self.repo.as_deref().ok_or_else(|| {
            StoreError::MissingRepo {
                store: STORE_NAME.to_string(),
            }
            .into()
        })
    }

    async fn fetch_refs(&self, name: &str) -> Result<(RepoLayout, Result<RefListing>)> {
        let layout = resolve_repo_url(self.required_repo()?, name)?;
        let listing = self
            .client
            .list_refs(&layout.url, &RefFilter::tags_and_branches())
            .await
            .and_then(|lines| RefListing::parse(lines).map_err(Into::into));
        Ok((layout, listing))
    }

    fn versions_for_exact(
        name: &str,
        version: &str,
        layout: &RepoLayout,
        listing: &RefListing,
    ) -> Result<Vec<BundleVersion>> {
        let checker = VersionChecker::new(name, version, layout.single_repo)?;
        let found = listing
            .iter()
            .find(|r| checker.matches(&r.name))
            .map(|r| BundleVersion::new(version).with_ref(r.name.clone()));
        if found.is_none() {
            warn!("Version {} does not exist for {}", version, name);
        }
        Ok(found.into_iter().collect())
    }

    fn versions_for_tag(
        name: &str,
        tag: &str,
        layout: &RepoLayout,
        listing: &RefListing,
    ) -> Vec<BundleVersion> {
        let candidates: Vec<&str> = if tag == "latest" {
            if layout.single_repo {
                vec![name]
            } else {
                LATEST_BRANCHES.to_vec()
            }
        } else {
            let msg = format!("Will try to pick branch {} from repo {}", tag, layout.url);
            if layout.single_repo {
                warn!("{}", msg);
            } else {
                info!("{}", msg);
            }
            vec![tag]
        };

        let mut versions: Vec<BundleVersion> = Vec::new();
        for r in listing.iter().filter(|r| r.is_branch()) {
            if !candidates.contains(&r.name.as_str())
                || versions.iter().any(|v| v.version == r.name)
            {
                continue;
            }
            let found = BundleVersion::new(r.name.clone()).with_ref(r.name.clone());
            if r.name == tag {
                versions.insert(0, found);
            } else {
                versions.push(found);
            }
            if versions.len() == candidates.len() {
                break;
            }
        }
        versions
    }

    fn versions_in_range(
        name: &str,
        range: Option<&VersionRange>,
        layout: &RepoLayout,
        listing: &RefListing,
    ) -> Result<Vec<BundleVersion>> {
        let evaluator = VersionEvaluator::new(name, layout.single_repo)?;
        let mut versions = Vec::new();
        let mut highest: Option<(usize, Version)> = None;

        for r in listing {
            let Some(found) = evaluator.evaluate(&r.name) else {
                continue;
            };
            let Some(parsed) = version::parse_version(&found) else {
                continue;
            };
            if range.is_some_and(|range| !range.matches(&parsed)) {
                continue;
            }
            versions.push(BundleVersion::new(found).with_ref(r.name.clone()));
            if parsed.pre.is_empty() && highest.as_ref().is_none_or(|(_, h)| parsed > *h) {
                highest = Some((versions.len() - 1, parsed));
            }
        }

        if let Some((idx, _)) = highest
            && idx > 0
        {
            let top = versions.remove(idx);
            versions.insert(0, top);
        }
        Ok(versions)
    }
}

#[async_trait]
impl<G: GitClient> Store for GitStore<G> {
    fn name(&self) -> &str {
        STORE_NAME
    }

    fn config_specs(&self) -> Vec<ConfigSpec> {
        vec![ConfigSpec::new("repo")]
    }

    async fn init(&mut self, config: &Config) -> Result<()> {
        self.repo = config.get("repo")?;
        debug!("Using GitStore [{:?}]", self.repo);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        debug!("GitStore:close");
        Ok(())
    }

    async fn create_bundle(&self, _bundle: &Bundle) -> Result<bool> {
        Err(not_applicable(STORE_NAME, "createBundle"))
    }

    async fn save_bundle_version(
        &self,
        _bundle: &mut Bundle,
        _version: &BundleVersion,
        _options: &BuildOptions,
    ) -> Result<bool> {
        Err(not_applicable(STORE_NAME, "saveBundleVersion"))
    }

    async fn update_bundle_version(
        &self,
        _bundle: &mut Bundle,
        _version: &BundleVersion,
        _options: &BuildOptions,
    ) -> Result<bool> {
        Err(not_applicable(STORE_NAME, "updateBundleVersion"))
    }

    async fn set_bundle_version_tag(
        &self,
        _bundle: &mut Bundle,
        _version: &mut BundleVersion,
        _tag: Option<String>,
    ) -> Result<bool> {
        Err(not_applicable(STORE_NAME, "setBundleVersionTag"))
    }

    async fn delete_bundle_version(
        &self,
        _bundle: &mut Bundle,
        _version: &BundleVersion,
    ) -> Result<String> {
        Err(not_applicable(STORE_NAME, "deleteBundleVersion"))
    }

    #[instrument(skip(self, bundle, version), fields(bundle = %bundle.name, version = %version.version))]
    async fn install_bundle(
        &self,
        bundle: &Bundle,
        version: &BundleVersion,
        options: &InstallOptions,
    ) -> Result<Option<PathBuf>> {
        if options.exists {
            warn!(
                "Bundle {}@{} already cloned under {:?}. SKIPPING!",
                bundle.name, version.version, options.target_dir
            );
            return Ok(None);
        }

        let (layout, listing) = self.fetch_refs(&bundle.name).await?;
        let listing = listing.with_context(|| {
            format!(
                "Error getting bundle details {}@{}",
                bundle.name, version.version
            )
        })?;

        let git_ref = match &version.git_ref {
            Some(r) => Some(r.clone()),
            None => {
                let checker = VersionChecker::new(&bundle.name, &version.version, layout.single_repo)?;
                listing
                    .iter()
                    .find(|r| checker.matches(&r.name))
                    .map(|r| r.name.clone())
            }
        };
        let git_ref = git_ref.ok_or_else(|| StoreError::VersionNotFound {
            bundle: bundle.name.clone(),
            version: version.version.clone(),
        })?;

        debug!(
            "GitStore: cloning {} {} to {:?}",
            layout.url, git_ref, options.target_dir
        );
        self.client
            .shallow_clone(&layout.url, &git_ref, &options.target_dir)
            .await?;
        Ok(Some(options.target_dir.clone()))
    }

    #[instrument(skip(self))]
    async fn query_bundle(&self, name: &str, query: &BundleQuery) -> Result<Option<Bundle>> {
        let (layout, listing) = self.fetch_refs(name).await?;
        let listing = match listing {
            Ok(listing) => listing,
            Err(err) => {
                error!("Error getting git revs [{:#}]", err);
                return Ok(None);
            }
        };

        // Exact versions and arbitrary ref names go through the checker.
        let range = query
            .version
            .as_deref()
            .filter(|v| version::is_range(v))
            .map(VersionRange::parse)
            .transpose()?;

        let mut bundle = Bundle::new(name);
        bundle.versions = match (&query.version, &query.tag, &range) {
            (Some(version), _, None) => {
                Self::versions_for_exact(name, version, &layout, &listing)?
            }
            (None, Some(tag), None) => Self::versions_for_tag(name, tag, &layout, &listing),
            _ => Self::versions_in_range(name, range.as_ref(), &layout, &listing)?,
        };
        Ok(Some(bundle))
    }

    async fn list_bundles(&self, _pattern: &BundlePattern) -> Result<Vec<Bundle>> {
        warn!("GitStore:listBundles should not be called");
        Ok(Vec::new())
    }
}
