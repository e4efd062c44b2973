//! Consumer side install root.
//!
//! ```text
//! <root>/<bundle>/<version>/node_modules
//! <root>/<bundle>/current -> <version>
//! ```
//!
//! Stores only materialize a version into a directory; everything about
//! which versions are installed and which one is current lives here.

use anyhow::{Context, Result};
use log::{debug, info};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::archive::DEPENDENCY_DIR;
use crate::runtime::Runtime;
use crate::version::{self, VersionRange};

mod packages;
mod symlink;

pub use packages::{Npm, PackageInstaller};
#[cfg(test)]
pub use packages::MockPackageInstaller;
pub use symlink::{CURRENT_LINK, current_version, set_current};

/// An installed version directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledVersions {
    pub current: Option<InstalledVersion>,
    /// Other complete installs, ordered by directory name.
    pub others: Vec<InstalledVersion>,
}

impl InstalledVersions {
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.others.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub removed: usize,
    /// Version `current` was re-pointed at, if it had to be re-picked.
    pub new_current: Option<String>,
}

pub struct InstallRoot<'a, R: Runtime> {
    runtime: &'a R,
    root: PathBuf,
}

impl<'a, R: Runtime> InstallRoot<'a, R> {
    pub fn new(runtime: &'a R, root: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn install_dir(&self, name: &str, version: &str) -> PathBuf {
        self.bundle_dir(name).join(version)
    }

    pub fn current_link(&self, name: &str) -> PathBuf {
        self.bundle_dir(name).join(CURRENT_LINK)
    }

    /// The `current` link, if it resolves to an existing directory.
    pub fn current_version_dir(&self, name: &str) -> Option<PathBuf> {
        let link = self.current_link(name);
        self.runtime.exists(&link).then_some(link)
    }

    pub fn set_current(&self, version_dir: &Path, overwrite: bool) -> Result<Option<PathBuf>> {
        set_current(self.runtime, version_dir, overwrite)
    }

    /// Installed versions matching `filter` (exact name or range).
    ///
    /// The current version is reported even when incomplete; others only when
    /// they hold a dependency directory.
    #[tracing::instrument(skip(self))]
    pub fn installed_versions(&self, name: &str, filter: Option<&str>) -> Result<InstalledVersions> {
        let bundle_dir = self.bundle_dir(name);
        if !self.runtime.is_dir(&bundle_dir) {
            return Ok(InstalledVersions::default());
        }
        let current = current_version(self.runtime, &bundle_dir)?;

        let mut installed = InstalledVersions::default();
        for (version, dir) in self.version_dirs(&bundle_dir)? {
            if filter.is_some_and(|spec| !VersionRange::accepts(spec, &version)) {
                continue;
            }
            if current.as_deref() == Some(version.as_str()) {
                installed.current = Some(InstalledVersion { version, dir });
            } else if self.runtime.is_dir(&dir.join(DEPENDENCY_DIR)) {
                installed.others.push(InstalledVersion { version, dir });
            } else {
                debug!("Ignoring incomplete install {:?}", dir);
            }
        }
        Ok(installed)
    }

    /// Directory of the best installed match for `spec`: the exact version
    /// if present, else the highest semver satisfying the range.
    #[tracing::instrument(skip(self))]
    pub fn latest_installed_version(&self, name: &str, spec: &str) -> Result<Option<PathBuf>> {
        let bundle_dir = self.bundle_dir(name);
        if !self.runtime.is_dir(&bundle_dir) {
            return Ok(None);
        }
        let versions = self.version_dirs(&bundle_dir)?;
        if let Some((_, dir)) = versions.iter().find(|(v, _)| v == spec) {
            return Ok(Some(dir.clone()));
        }
        let Ok(range) = VersionRange::parse(spec) else {
            return Ok(None);
        };
        Ok(versions
            .into_iter()
            .filter(|(v, _)| version::is_valid(v) && range.matches_str(v))
            .max_by(|(a, _), (b, _)| version::compare(a, b))
            .map(|(_, dir)| dir))
    }

    /// Delete installed versions matching `spec` (all when `None`).
    ///
    /// When the current version goes, `current` is re-pointed at the highest
    /// remaining semver, else the lexicographically largest remaining name.
    #[tracing::instrument(skip(self))]
    pub fn remove_versions(&self, name: &str, spec: Option<&str>) -> Result<RemoveOutcome> {
        let installed = self.installed_versions(name, None)?;
        let matches = |v: &str| spec.is_none_or(|s| VersionRange::accepts(s, v));

        let mut outcome = RemoveOutcome::default();
        let mut repick = false;
        if let Some(current) = &installed.current
            && matches(&current.version)
        {
            self.remove_dir(&current.dir)?;
            outcome.removed += 1;
            repick = true;
        }

        let mut candidate: Option<&InstalledVersion> = None;
        for other in &installed.others {
            if matches(&other.version) {
                self.remove_dir(&other.dir)?;
                outcome.removed += 1;
            } else if repick
                && candidate
                    .is_none_or(|c| version::compare(&other.version, &c.version) == Ordering::Greater)
            {
                candidate = Some(other);
            }
        }

        if repick {
            match candidate {
                Some(next) => {
                    info!("Setting bundle {}@{} as current", name, next.version);
                    self.set_current(&next.dir, true)?;
                    outcome.new_current = Some(next.version.clone());
                }
                None => {
                    let link = self.current_link(name);
                    if self.runtime.is_symlink(&link) {
                        debug!("Removing dangling {:?}", link);
                        self.runtime.remove_symlink(&link)?;
                    }
                }
            }
        }
        Ok(outcome)
    }

    fn remove_dir(&self, dir: &Path) -> Result<()> {
        info!("removing {}", dir.display());
        self.runtime
            .remove_dir_all(dir)
            .with_context(|| format!("Failed to remove {:?}", dir))
    }

    /// Version directories of a bundle, sorted by name. Symlinks are skipped.
    fn version_dirs(&self, bundle_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut dirs: Vec<(String, PathBuf)> = self
            .runtime
            .read_dir(bundle_dir)?
            .into_iter()
            .filter(|p| !self.runtime.is_symlink(p) && self.runtime.is_dir(p))
            .filter_map(|p| {
                let version = p.file_name()?.to_string_lossy().into_owned();
                Some((version, p))
            })
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use std::fs;
    use tempfile::TempDir;

    fn install(root: &InstallRoot<'_, RealRuntime>, name: &str, version: &str) -> PathBuf {
        let dir = root.install_dir(name, version);
        fs::create_dir_all(dir.join(DEPENDENCY_DIR)).unwrap();
        dir
    }

    fn versions(list: &[InstalledVersion]) -> Vec<&str> {
        list.iter().map(|v| v.version.as_str()).collect()
    }

    #[test]
    fn test_paths() {
        let root = InstallRoot::new(&RealRuntime, "/home/user/.ndb");
        assert_eq!(
            root.install_dir("dummy", "1.0.0"),
            PathBuf::from("/home/user/.ndb/dummy/1.0.0")
        );
        assert_eq!(
            root.current_link("dummy"),
            PathBuf::from("/home/user/.ndb/dummy/current")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_install_two_versions_and_switch_current() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(&RealRuntime, dir.path());

        let one = install(&root, "dummy", "1.0.0");
        root.set_current(&one, true).unwrap();
        let two = install(&root, "dummy", "2.0.0");
        root.set_current(&two, true).unwrap();

        assert!(one.is_dir());
        assert!(two.is_dir());
        assert_eq!(
            fs::read_link(root.current_link("dummy")).unwrap(),
            PathBuf::from("2.0.0")
        );

        let installed = root.installed_versions("dummy", None).unwrap();
        assert_eq!(installed.current.unwrap().version, "2.0.0");
        assert_eq!(versions(&installed.others), vec!["1.0.0"]);
        assert_eq!(
            root.current_version_dir("dummy"),
            Some(root.current_link("dummy"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_installed_versions_filter_and_incomplete() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(&RealRuntime, dir.path());
        install(&root, "dummy", "1.0.0");
        install(&root, "dummy", "1.2.0");
        install(&root, "dummy", "2.0.0");
        fs::create_dir_all(root.install_dir("dummy", "1.3.0")).unwrap();

        let installed = root.installed_versions("dummy", Some("^1.0.0")).unwrap();
        assert!(installed.current.is_none());
        assert_eq!(versions(&installed.others), vec!["1.0.0", "1.2.0"]);

        let exact = root.installed_versions("dummy", Some("2.0.0")).unwrap();
        assert_eq!(versions(&exact.others), vec!["2.0.0"]);

        assert!(root.installed_versions("other", None).unwrap().is_empty());
    }

    #[test]
    fn test_latest_installed_version() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(&RealRuntime, dir.path());
        install(&root, "dummy", "1.0.0");
        install(&root, "dummy", "1.10.0");
        install(&root, "dummy", "1.9.0");
        install(&root, "dummy", "master");

        assert_eq!(
            root.latest_installed_version("dummy", "1.x").unwrap(),
            Some(root.install_dir("dummy", "1.10.0"))
        );
        assert_eq!(
            root.latest_installed_version("dummy", "master").unwrap(),
            Some(root.install_dir("dummy", "master"))
        );
        assert_eq!(root.latest_installed_version("dummy", "^2.0.0").unwrap(), None);
        assert_eq!(root.latest_installed_version("other", "1.x").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_current_repicks_highest() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(&RealRuntime, dir.path());
        install(&root, "dummy", "1.0.0");
        install(&root, "dummy", "master");
        let two = install(&root, "dummy", "2.0.0");
        root.set_current(&two, true).unwrap();

        let outcome = root.remove_versions("dummy", Some("2.0.0")).unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.new_current.as_deref(), Some("1.0.0"));
        assert!(!two.exists());
        assert_eq!(
            fs::read_link(root.current_link("dummy")).unwrap(),
            PathBuf::from("1.0.0")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_repicks_largest_name_without_semver() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(&RealRuntime, dir.path());
        install(&root, "dummy", "develop");
        install(&root, "dummy", "master");
        let one = install(&root, "dummy", "1.0.0");
        root.set_current(&one, true).unwrap();

        let outcome = root.remove_versions("dummy", Some("1.x")).unwrap();
        assert_eq!(outcome.new_current.as_deref(), Some("master"));
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_all_drops_current_link() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(&RealRuntime, dir.path());
        install(&root, "dummy", "1.0.0");
        let two = install(&root, "dummy", "2.0.0");
        root.set_current(&two, true).unwrap();

        let outcome = root.remove_versions("dummy", None).unwrap();
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.new_current, None);
        assert!(
            fs::symlink_metadata(root.current_link("dummy")).is_err(),
            "current link should be gone"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_non_current_keeps_link() {
        let dir = TempDir::new().unwrap();
        let root = InstallRoot::new(&RealRuntime, dir.path());
        let one = install(&root, "dummy", "1.0.0");
        let two = install(&root, "dummy", "2.0.0");
        root.set_current(&two, true).unwrap();

        let outcome = root.remove_versions("dummy", Some("1.0.0")).unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.new_current, None);
        assert!(!one.exists());
        assert_eq!(
            fs::read_link(root.current_link("dummy")).unwrap(),
            PathBuf::from("2.0.0")
        );
    }
}
