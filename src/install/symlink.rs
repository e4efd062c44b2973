use anyhow::{Context, Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::runtime::{Runtime, relative_symlink_path};

pub const CURRENT_LINK: &str = "current";

/// Point the `current` link next to `version_dir` at it.
///
/// A link to a version that still exists is only replaced with `overwrite`.
/// A link whose target is gone is always replaced. Returns the link path,
/// or `None` when the existing link was kept.
#[tracing::instrument(skip(runtime))]
pub fn set_current<R: Runtime>(
    runtime: &R,
    version_dir: &Path,
    overwrite: bool,
) -> Result<Option<PathBuf>> {
    let base = version_dir
        .parent()
        .context("Failed to get parent directory")?;
    let current_link = base.join(CURRENT_LINK);

    if runtime.is_symlink(&current_link) {
        let target = runtime.read_link(&current_link)?;
        let orphaned = !runtime.exists(&base.join(&target));
        debug!(
            "{:?} points to {:?}. orphaned: {}",
            current_link, target, orphaned
        );
        if !orphaned && !overwrite {
            debug!("Skipping setting current as it is already mapped! [{:?}]", current_link);
            return Ok(None);
        }
        runtime.remove_symlink(&current_link)?;
    } else if runtime.exists(&current_link) {
        bail!("{:?} exists but is not a symlink", current_link);
    }

    let link_target = relative_symlink_path(&current_link, version_dir)
        .unwrap_or_else(|| version_dir.to_path_buf());
    debug!("Linking {:?} to {:?}", link_target, current_link);
    runtime
        .symlink(&link_target, &current_link)
        .with_context(|| format!("Failed to update 'current' symlink to {:?}", version_dir))?;
    Ok(Some(current_link))
}

/// Name of the version directory `current` points at, if the link exists.
pub fn current_version<R: Runtime>(runtime: &R, bundle_dir: &Path) -> Result<Option<String>> {
    let current_link = bundle_dir.join(CURRENT_LINK);
    if !runtime.is_symlink(&current_link) {
        return Ok(None);
    }
    let target = runtime.read_link(&current_link)?;
    Ok(target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned()))
}
