//! Path helpers.

use std::path::{Path, PathBuf};

/// Calculate the relative path from a symlink location to a target.
///
/// A `current` link at `/root/.ndb/dummy/current` pointing to
/// `/root/.ndb/dummy/1.0.0` becomes `1.0.0`, so the install root can be moved
/// without breaking its links.
///
/// Returns `None` if a relative path cannot be computed (e.g., different drive letters on Windows).
pub fn relative_symlink_path(from_link: &Path, to_target: &Path) -> Option<PathBuf> {
    let from_dir = from_link.parent()?;
    let result = pathdiff::diff_paths(to_target, from_dir)?;

    if result.is_absolute() {
        return None;
    }

    Some(result)
}
