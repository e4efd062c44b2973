//! Read-write store keeping bundles on the local filesystem.

pub mod metadata;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::archive;
use crate::config::{Config, ConfigSpec};
use crate::model::{Bundle, BundleVersion};
use crate::runtime::{RealRuntime, Runtime};
use crate::store::{
    BuildOptions, BundlePattern, BundleQuery, InstallOptions, Store, StoreError,
};
use crate::version::{self, VersionRange};

use metadata::MetadataRepository;

pub const STORE_NAME: &str = "local";

/// Base directory used when `repo` is not configured, relative to the cwd.
pub const DEFAULT_BASE_DIR: &str = ".store";

const TAG_ATTEMPTS: usize = 3;

pub struct LocalStore<R: Runtime = RealRuntime> {
    runtime: R,
    base_dir: Option<PathBuf>,
}

impl<R: Runtime> LocalStore<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            base_dir: None,
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    fn repository(&self) -> Result<MetadataRepository<'_, R>> {
        let base_dir = self
            .base_dir
            .as_deref()
            .context("LocalStore is used before init")?;
        Ok(MetadataRepository::new(&self.runtime, base_dir))
    }

    /// Drop the tags `version` holds, point `tag` at it and write the bundle record.
    ///
    /// A conflicting write reloads the bundle and reapplies the change. Only
    /// once the record is written does the version that held `tag` lose it.
    /// Returns `false` when every attempt conflicted; `bundle.tags` then
    /// matches the stored record.
    fn commit_tags(
        repo: &MetadataRepository<'_, R>,
        bundle: &mut Bundle,
        version: &str,
        tag: Option<&str>,
    ) -> Result<bool> {
        for attempt in 1..=TAG_ATTEMPTS {
            let current = bundle.tags.clone();
            let former = tag
                .and_then(|t| bundle.tagged_version(t))
                .filter(|holder| *holder != version)
                .map(str::to_string);

            bundle
                .tags
                .retain(|t, v| v.as_str() != version || Some(t.as_str()) == tag);
            if let Some(tag) = tag {
                bundle.tags.insert(tag.to_string(), version.to_string());
            }
            if bundle.tags == current {
                return Ok(true);
            }

            if repo.update_bundle(bundle)? {
                if let (Some(tag), Some(former)) = (tag, former) {
                    Self::untag_version(repo, &bundle.name, &former, tag)?;
                }
                return Ok(true);
            }

            bundle.tags = current;
            warn!(
                "Bundle {} changed while tagging {}. attempt:{}",
                bundle.name, version, attempt
            );
            let Some(stored) = repo.get_bundle(&bundle.name)? else {
                break;
            };
            bundle.ts = stored.ts;
            bundle.tags = stored.tags;
        }
        error!("Error setting tags of {}@{}!", bundle.name, version);
        Ok(false)
    }

    /// Clear `tag` from the metadata of `version`, if it still carries it.
    fn untag_version(
        repo: &MetadataRepository<'_, R>,
        name: &str,
        version: &str,
        tag: &str,
    ) -> Result<()> {
        if let Some(mut previous) = repo.get_bundle_version(name, version)?
            && previous.tag.as_deref() == Some(tag)
        {
            previous.tag = None;
            if !repo.update_bundle_version_meta(name, &mut previous)? {
                warn!("Unable to untag {}@{}", name, version);
            }
        }
        Ok(())
    }

    /// Put `tag` back on the stored metadata of `version`.
    fn restore_tag(
        repo: &MetadataRepository<'_, R>,
        name: &str,
        version: &str,
        tag: Option<String>,
    ) -> Result<()> {
        if let Some(mut stored) = repo.get_bundle_version(name, version)?
            && stored.tag != tag
        {
            stored.tag = tag;
            if !repo.update_bundle_version_meta(name, &mut stored)? {
                warn!("Unable to restore tag of {}@{}", name, version);
            }
        }
        Ok(())
    }

    fn versions_in_range(
        repo: &MetadataRepository<'_, R>,
        name: &str,
        range: &VersionRange,
    ) -> Result<Vec<BundleVersion>> {
        let mut versions: Vec<BundleVersion> = repo
            .get_bundle_versions(name)?
            .into_iter()
            .filter(|v| range.matches_str(&v.version))
            .collect();
        versions.sort_by(|a, b| version::compare(&b.version, &a.version));
        Ok(versions)
    }
}

#[async_trait]
impl<R: Runtime> Store for LocalStore<R> {
    fn name(&self) -> &str {
        STORE_NAME
    }

    fn config_specs(&self) -> Vec<ConfigSpec> {
        vec![ConfigSpec::new("repo")]
    }

    async fn init(&mut self, config: &Config) -> Result<()> {
        let base_dir = match config.get("repo")? {
            Some(repo) => PathBuf::from(repo),
            None => self.runtime.current_dir()?.join(DEFAULT_BASE_DIR),
        };
        debug!("Using LocalStore [{:?}]", base_dir);
        self.runtime
            .create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create store directory {:?}", base_dir))?;
        self.base_dir = Some(base_dir);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        debug!("LocalStore:close");
        Ok(())
    }

    async fn create_bundle(&self, bundle: &Bundle) -> Result<bool> {
        self.repository()?.create_bundle(bundle)
    }

    #[instrument(skip_all, fields(bundle = %bundle.name, version = %version.version))]
    async fn save_bundle_version(
        &self,
        bundle: &mut Bundle,
        version: &BundleVersion,
        options: &BuildOptions,
    ) -> Result<bool> {
        debug!("LocalStore:saveBundleVersion");
        let repo = self.repository()?;
        if !repo.create_bundle_version(&bundle.name, version, options)? {
            return Ok(false);
        }
        let Some(tag) = version.tag.as_deref() else {
            return Ok(true);
        };
        if Self::commit_tags(&repo, bundle, &version.version, Some(tag))? {
            return Ok(true);
        }
        Self::restore_tag(&repo, &bundle.name, &version.version, None)?;
        Ok(false)
    }

    #[instrument(skip_all, fields(bundle = %bundle.name, version = %version.version))]
    async fn update_bundle_version(
        &self,
        bundle: &mut Bundle,
        version: &BundleVersion,
        options: &BuildOptions,
    ) -> Result<bool> {
        debug!("LocalStore:updateBundleVersion");
        let repo = self.repository()?;
        let Some(previous) = repo.get_bundle_version(&bundle.name, &version.version)? else {
            return self.save_bundle_version(bundle, version, options).await;
        };

        let mut replacement = version.clone();
        replacement.ts = previous.ts + 1;
        if !repo.update_bundle_version(&bundle.name, &replacement, options)? {
            return Ok(false);
        }

        if Self::commit_tags(&repo, bundle, &version.version, version.tag.as_deref())? {
            return Ok(true);
        }
        Self::restore_tag(&repo, &bundle.name, &version.version, previous.tag)?;
        Ok(false)
    }

    #[instrument(skip_all, fields(bundle = %bundle.name, version = %version.version))]
    async fn set_bundle_version_tag(
        &self,
        bundle: &mut Bundle,
        version: &mut BundleVersion,
        tag: Option<String>,
    ) -> Result<bool> {
        if version.tag == tag {
            info!(
                "{}@{} already tagged {} - SKIPPING!",
                bundle.name,
                version.version,
                tag.as_deref().unwrap_or("<none>")
            );
            return Ok(true);
        }

        let repo = self.repository()?;
        let original = std::mem::replace(&mut version.tag, tag.clone());
        if !repo.update_bundle_version_meta(&bundle.name, version)? {
            version.tag = original;
            error!("Error updating tag!");
            return Ok(false);
        }

        if Self::commit_tags(&repo, bundle, &version.version, tag.as_deref())? {
            return Ok(true);
        }
        version.tag = original;
        if !repo.update_bundle_version_meta(&bundle.name, version)? {
            warn!("Unable to restore tag of {}@{}", bundle.name, version.version);
        }
        Ok(false)
    }

    #[instrument(skip_all, fields(bundle = %bundle.name, version = %version.version))]
    async fn delete_bundle_version(
        &self,
        bundle: &mut Bundle,
        version: &BundleVersion,
    ) -> Result<String> {
        let repo = self.repository()?;
        let deleted = repo.delete_bundle_version(&bundle.name, &version.version)?;

        if !Self::commit_tags(&repo, bundle, &version.version, None)? {
            error!("Error untagging version!");
        }
        Ok(deleted)
    }

    #[instrument(skip(self, bundle, version), fields(bundle = %bundle.name, version = %version.version))]
    async fn install_bundle(
        &self,
        bundle: &Bundle,
        version: &BundleVersion,
        options: &InstallOptions,
    ) -> Result<Option<PathBuf>> {
        debug!("LocalStore: installBundle {} {}", bundle.name, version.version);
        let archive_path = self
            .repository()?
            .archive_path(&bundle.name, &version.version);
        if !self.runtime.exists(&archive_path) {
            return Err(StoreError::VersionNotFound {
                bundle: bundle.name.clone(),
                version: version.version.clone(),
            }
            .into());
        }
        if options.exists {
            warn!(
                "Bundle {}@{} exists under {:?}. Content will be applied over existing content.",
                bundle.name, version.version, options.target_dir
            );
        }

        self.runtime.create_dir_all(&options.target_dir)?;
        archive::extract_newer(&self.runtime, &archive_path, &options.target_dir)?;
        Ok(Some(options.target_dir.clone()))
    }

    #[instrument(skip(self))]
    async fn query_bundle(&self, name: &str, query: &BundleQuery) -> Result<Option<Bundle>> {
        let repo = self.repository()?;
        let Some(mut bundle) = repo.get_bundle(name)? else {
            info!("Bundle with this name does not exist. [{}]", name);
            return Ok(None);
        };

        let mut wanted = query.version.clone();
        if let Some(tag) = query.tag.as_deref() {
            match bundle.tagged_version(tag) {
                Some(tagged) => wanted = Some(tagged.to_string()),
                None => {
                    warn!("No version found corresponding to tag {} for {}", tag, name);
                    return Ok(Some(bundle));
                }
            }
        }

        bundle.versions = match wanted {
            Some(wanted) if version::is_range(&wanted) => {
                Self::versions_in_range(&repo, name, &VersionRange::parse(&wanted)?)?
            }
            Some(wanted) => match repo.get_bundle_version(name, &wanted)? {
                Some(found) => vec![found],
                None => {
                    warn!("Version {} does not exist for {}", wanted, name);
                    Vec::new()
                }
            },
            None => {
                let latest = bundle.tagged_version("latest").map(str::to_string);
                let mut versions = Vec::new();
                for found in repo.get_bundle_versions(name)? {
                    if latest.as_deref() == Some(found.version.as_str()) {
                        versions.insert(0, found);
                    } else {
                        versions.push(found);
                    }
                }
                versions
            }
        };
        Ok(Some(bundle))
    }

    async fn list_bundles(&self, pattern: &BundlePattern) -> Result<Vec<Bundle>> {
        Ok(self
            .repository()?
            .get_bundles()?
            .into_iter()
            .filter(|bundle| pattern.matches(bundle))
            .collect())
    }
}
