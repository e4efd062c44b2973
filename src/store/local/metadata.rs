//! On-disk metadata for the local store.
//!
//! ```text
//! <basedir>/
//!   .temp/                    scratch space for version updates
//!   <bundle>/
//!     metadata.json           Bundle
//!     <version>/
//!       metadata.json         BundleVersion
//!       bundle.tgz
//!     <version>_DELETED_<ts>  soft-deleted version
//! ```
//!
//! Records are only ever rewritten through [`MetadataRepository::update`]:
//! the current file is copied exclusively to a working file, its `ts` is
//! compared with the caller's copy, and the incremented record is renamed
//! over the original. A second writer either fails the exclusive copy or
//! sees a `ts` mismatch; both report `Ok(false)`.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use log::{debug, error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::model::{Bundle, BundleVersion, Revisioned};
use crate::runtime::{self, Runtime};
use crate::store::BuildOptions;

pub const METADATA_FILE: &str = "metadata.json";
pub const BUNDLE_FILE: &str = "bundle.tgz";
pub const TEMP_DIR: &str = ".temp";

const DELETED_MARKER: &str = "_DELETED_";
const DELETE_ATTEMPTS: usize = 3;
const NOT_BUNDLE_DIRS: [&str; 2] = [".temp", ".tmp"];

/// `YYYYMMDDhhmmssSSS` in UTC.
pub fn timestamp() -> String {
    Utc::now().format("%Y%m%d%H%M%S%3f").to_string()
}

pub struct MetadataRepository<'a, R: Runtime> {
    runtime: &'a R,
    base_dir: &'a Path,
}

impl<'a, R: Runtime> MetadataRepository<'a, R> {
    pub fn new(runtime: &'a R, base_dir: &'a Path) -> Self {
        Self { runtime, base_dir }
    }

    pub fn bundle_dir(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    pub fn version_dir(&self, name: &str, version: &str) -> PathBuf {
        self.bundle_dir(name).join(version)
    }

    pub fn archive_path(&self, name: &str, version: &str) -> PathBuf {
        self.version_dir(name, version).join(BUNDLE_FILE)
    }

    fn load<T: DeserializeOwned>(&self, file: &Path) -> Result<Option<T>> {
        let content = match self.runtime.read_to_string(file) {
            Ok(content) => content,
            Err(e) if runtime::is_not_found(&e) => {
                debug!("metadata file {:?} does not exist", file);
                return Ok(None);
            }
            Err(e) => {
                return Err(e.context(format!("Error loading metadata for {:?}", file)));
            }
        };
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Invalid metadata in {:?}", file))?;
        Ok(Some(record))
    }

    fn write_new<T: Serialize>(&self, file: &Path, record: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        self.runtime.write_new(file, json.as_bytes())
    }

    /// Optimistically replace the record in `file` with `record`.
    ///
    /// On success `record.ts` has been incremented to the value now on disk.
    /// On a conflict `record` and the file are left untouched.
    pub fn update<T>(&self, file: &Path, record: &mut T) -> Result<bool>
    where
        T: Revisioned + Serialize + DeserializeOwned,
    {
        let mut working = file.as_os_str().to_owned();
        working.push(".update");
        let working = PathBuf::from(working);

        if let Err(e) = self.runtime.copy_new(file, &working) {
            if runtime::is_already_exists(&e) {
                error!("Metadata {:?} is being updated by another process", file);
                return Ok(false);
            }
            return Err(e.context(format!("Error creating working metadata from {:?}", file)));
        }

        let result = self.replace(file, &working, record);
        if let Err(e) = self.runtime.remove_file(&working)
            && !runtime::is_not_found(&e)
        {
            debug!(
                "Unable to delete {:?}. Please delete it manually [{:#}]",
                working, e
            );
        }
        result
    }

    fn replace<T>(&self, file: &Path, working: &Path, record: &mut T) -> Result<bool>
    where
        T: Revisioned + Serialize + DeserializeOwned,
    {
        let Some(current) = self.load::<T>(working)? else {
            error!("Unable to load metadata file {:?}", working);
            return Ok(false);
        };
        if current.ts() != record.ts() {
            error!(
                "Metadata {:?} already updated. Expected:{}, Found:{}",
                file,
                record.ts(),
                current.ts()
            );
            return Ok(false);
        }

        let next = record.ts() + 1;
        let mut updated = serde_json::to_value(&*record)?;
        updated["ts"] = next.into();
        self.runtime
            .write(working, serde_json::to_string_pretty(&updated)?.as_bytes())
            .with_context(|| format!("Metadata {:?} update failed", file))?;
        self.runtime
            .rename(working, file)
            .with_context(|| format!("Metadata {:?} update failed", file))?;
        record.set_ts(next);
        Ok(true)
    }

    /// `Ok(false)` if the bundle directory already exists.
    #[tracing::instrument(skip(self, bundle), fields(bundle = %bundle.name))]
    pub fn create_bundle(&self, bundle: &Bundle) -> Result<bool> {
        let dir = self.bundle_dir(&bundle.name);
        debug!("Creating bundle directory [{:?}]", dir);
        if let Err(e) = self.runtime.create_dir(&dir) {
            if runtime::is_already_exists(&e) {
                debug!("bundle directory already exists [{:?}]", dir);
                return Ok(false);
            }
            return Err(e);
        }
        self.write_new(&dir.join(METADATA_FILE), bundle)?;
        Ok(true)
    }

    pub fn update_bundle(&self, bundle: &mut Bundle) -> Result<bool> {
        let file = self.bundle_dir(&bundle.name).join(METADATA_FILE);
        debug!("Updating bundle metadata [{:?}]", file);
        self.update(&file, bundle)
    }

    /// `Ok(None)` if the bundle or its metadata file does not exist.
    pub fn get_bundle(&self, name: &str) -> Result<Option<Bundle>> {
        let dir = self.bundle_dir(name);
        if !self.runtime.is_dir(&dir) {
            debug!("Bundle {} does not exist", name);
            return Ok(None);
        }
        self.load(&dir.join(METADATA_FILE))
    }

    /// All bundles with readable metadata, in directory order.
    pub fn get_bundles(&self) -> Result<Vec<Bundle>> {
        let mut bundles = Vec::new();
        for dir in self.record_dirs(self.base_dir)? {
            match self.load::<Bundle>(&dir.join(METADATA_FILE))? {
                Some(bundle) => bundles.push(bundle),
                None => debug!("Ignoring {:?} - missing {}", dir, METADATA_FILE),
            }
        }
        Ok(bundles)
    }

    /// Create a version under its own directory. `Ok(false)` if it exists.
    #[tracing::instrument(skip(self, version, options), fields(version = %version.version))]
    pub fn create_bundle_version(
        &self,
        name: &str,
        version: &BundleVersion,
        options: &BuildOptions,
    ) -> Result<bool> {
        let dir = self.version_dir(name, &version.version);
        if let Err(e) = self.runtime.create_dir(&dir) {
            if runtime::is_already_exists(&e) {
                debug!("bundle version already exists [{:?}]", dir);
                return Ok(false);
            }
            return Err(e);
        }
        self.write_version(&dir, version, options)?;
        Ok(true)
    }

    fn write_version(&self, dir: &Path, version: &BundleVersion, options: &BuildOptions) -> Result<()> {
        debug!("creating metadata file under [{:?}]", dir);
        self.write_new(&dir.join(METADATA_FILE), version)?;
        archive::build_bundle(self.runtime, &options.base_dir, &dir.join(BUNDLE_FILE))
    }

    /// Replace a live version: build it in scratch space, soft-delete the
    /// current directory, then move the new one into place.
    #[tracing::instrument(skip(self, version, options), fields(version = %version.version))]
    pub fn update_bundle_version(
        &self,
        name: &str,
        version: &BundleVersion,
        options: &BuildOptions,
    ) -> Result<bool> {
        let temp_base = self.base_dir.join(TEMP_DIR);
        self.runtime.create_dir_all(&temp_base)?;
        let temp_dir = temp_base.join(format!("{}-{}-{}", name, version.version, timestamp()));
        self.runtime.create_dir(&temp_dir)?;

        debug!("Create bundle version under {:?}", temp_dir);
        if let Err(e) = self.write_version(&temp_dir, version, options) {
            let _ = self.runtime.remove_dir_all(&temp_dir);
            return Err(e);
        }

        let live = self.version_dir(name, &version.version);
        if self.runtime.exists(&live) {
            let deleted = self.delete_bundle_version(name, &version.version)?;
            debug!("Previous bundle version moved to {}", deleted);
        }
        self.runtime
            .rename(&temp_dir, &live)
            .with_context(|| format!("Failed to move {:?} into place", temp_dir))?;
        Ok(true)
    }

    pub fn update_bundle_version_meta(&self, name: &str, version: &mut BundleVersion) -> Result<bool> {
        let file = self.version_dir(name, &version.version).join(METADATA_FILE);
        debug!("Updating bundle version metadata [{:?}]", file);
        self.update(&file, version)
    }

    pub fn get_bundle_version(&self, name: &str, version: &str) -> Result<Option<BundleVersion>> {
        if is_deleted(version) {
            return Ok(None);
        }
        self.load(&self.version_dir(name, version).join(METADATA_FILE))
    }

    /// Live versions of a bundle, ordered by directory name.
    pub fn get_bundle_versions(&self, name: &str) -> Result<Vec<BundleVersion>> {
        let mut versions = Vec::new();
        for dir in self.record_dirs(&self.bundle_dir(name))? {
            match self.load::<BundleVersion>(&dir.join(METADATA_FILE))? {
                Some(version) => versions.push(version),
                None => debug!("Ignoring {:?} - missing {}", dir, METADATA_FILE),
            }
        }
        Ok(versions)
    }

    /// Rename the version directory to `<version>_DELETED_<ts>`, returning the new name.
    #[tracing::instrument(skip(self))]
    pub fn delete_bundle_version(&self, name: &str, version: &str) -> Result<String> {
        let live = self.version_dir(name, version);
        let unique = timestamp();
        for attempt in 0..DELETE_ATTEMPTS {
            let deleted = match attempt {
                0 => format!("{}{}{}", version, DELETED_MARKER, unique),
                n => format!("{}{}{}_{}", version, DELETED_MARKER, unique, n),
            };
            let target = self.version_dir(name, &deleted);
            if self.runtime.exists(&target) {
                error!("Soft delete target {:?} exists. attempt:{}", target, attempt + 1);
                continue;
            }
            match self.runtime.rename(&live, &target) {
                Ok(()) => {
                    debug!("Renamed {:?} to {} to mark it deleted", live, deleted);
                    return Ok(deleted);
                }
                Err(e) => error!(
                    "Rename bundle version directory failed. attempt:{} [{:#}]",
                    attempt + 1,
                    e
                ),
            }
        }
        bail!("Error deleting bundle version [{}]", live.display())
    }

    fn record_dirs(&self, parent: &Path) -> Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = self
            .runtime
            .read_dir(parent)?
            .into_iter()
            .filter(|path| self.runtime.is_dir(path))
            .filter(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let skip = name.starts_with('.')
                    || NOT_BUNDLE_DIRS.contains(&name.as_str())
                    || is_deleted(&name);
                if skip {
                    debug!("Ignoring {:?}", path);
                }
                !skip
            })
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}

fn is_deleted(dir_name: &str) -> bool {
    dir_name.contains(DELETED_MARKER)
}
