//! Bundle archives.
//!
//! A bundle archive is a gzip compressed tarball holding exactly the
//! `node_modules` directory and the `package.json` manifest of a project,
//! stored relative to the project base directory.

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{debug, info, warn};
use std::io::Write;
use std::path::Path;
use std::time::UNIX_EPOCH;
use tar::{Archive, Builder};

use crate::runtime::Runtime;

pub const DEPENDENCY_DIR: &str = "node_modules";
pub const MANIFEST_FILE: &str = "package.json";
pub const LOCK_FILE: &str = "package-lock.json";

/// Write the bundle archive for the project under `base_dir` to `archive_path`.
///
/// The archive file is created exclusively, so a concurrent publisher of the
/// same version fails instead of interleaving writes. Symlinks inside
/// `node_modules` are stored as links.
#[tracing::instrument(skip(runtime))]
pub fn build_bundle<R: Runtime>(runtime: &R, base_dir: &Path, archive_path: &Path) -> Result<()> {
    info!("Building bundle");
    let dependency_dir = base_dir.join(DEPENDENCY_DIR);
    if !runtime.is_dir(&dependency_dir) {
        bail!("Unable to access directory {}", dependency_dir.display());
    }
    let manifest = base_dir.join(MANIFEST_FILE);

    debug!("Building bundle from {:?}", base_dir);
    let file = runtime
        .create_file_new(archive_path)
        .with_context(|| format!("Failed to create bundle file {:?}", archive_path))?;

    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);
    builder
        .append_dir_all(DEPENDENCY_DIR, &dependency_dir)
        .with_context(|| format!("Failed to add {:?} to the bundle", dependency_dir))?;
    builder
        .append_path_with_name(&manifest, MANIFEST_FILE)
        .with_context(|| format!("Failed to add {:?} to the bundle", manifest))?;

    let mut file = builder
        .into_inner()
        .context("Failed to finish bundle archive")?
        .finish()
        .context("Failed to finish bundle compression")?;
    file.flush()?;
    debug!("Bundle file written to {:?}", archive_path);
    Ok(())
}

/// Unpack `archive_path` into `target_dir`, keeping local files that are
/// newer than their archived copy. Returns the number of entries written.
#[tracing::instrument(skip(runtime))]
pub fn extract_newer<R: Runtime>(
    runtime: &R,
    archive_path: &Path,
    target_dir: &Path,
) -> Result<usize> {
    let file = runtime
        .open(archive_path)
        .with_context(|| format!("Failed to open bundle {:?}", archive_path))?;

    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);

    let mut written = 0;
    let entries = archive
        .entries()
        .with_context(|| format!("Failed to read bundle {:?}", archive_path))?;
    for entry in entries {
        let mut entry = entry.with_context(|| format!("Corrupt bundle {:?}", archive_path))?;
        let path = entry.path()?.into_owned();
        let archived_mtime = entry.header().mtime().unwrap_or(0);

        if !entry.header().entry_type().is_dir()
            && is_newer_on_disk(runtime, &target_dir.join(&path), archived_mtime)
        {
            debug!("Keeping newer local file {:?}", path);
            continue;
        }

        let unpacked = entry
            .unpack_in(target_dir)
            .with_context(|| format!("Failed to extract {:?}", path))?;
        if unpacked {
            written += 1;
        } else {
            warn!("Skipping bundle entry outside of the target: {:?}", path);
        }
    }
    debug!("Extracted {} entries into {:?}", written, target_dir);
    Ok(written)
}

fn is_newer_on_disk<R: Runtime>(runtime: &R, path: &Path, archived_mtime: u64) -> bool {
    runtime
        .modified(path)
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .is_some_and(|local| local.as_secs() > archived_mtime)
}
