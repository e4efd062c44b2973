use anyhow::{Result, bail};
use log::{debug, info};

use super::{CommandContext, split_bundle_spec};
use crate::archive::DEPENDENCY_DIR;
use crate::runtime::Runtime;

/// Point `current` at the best installed match for `version`.
#[tracing::instrument(skip(ctx))]
pub fn set_default<R: Runtime>(
    ctx: &CommandContext<R>,
    bundle: &str,
    version: Option<&str>,
) -> Result<()> {
    let (name, version) = split_bundle_spec(bundle, version);
    let Some(version) = version else {
        bail!("No version specified to set as default for {}", name);
    };

    let root = ctx.install_root()?;
    let Some(version_dir) = root.latest_installed_version(name, version)? else {
        bail!("Bundle {}@{} not installed. Please install it first", name, version);
    };
    debug!("Setting {:?} as default", version_dir);
    root.set_current(&version_dir, true)?;

    info!("Bundle {} now defaults to {}", name, version_dir.display());
    info!(
        "Add {} to NODE_PATH to use it",
        root.current_link(name).join(DEPENDENCY_DIR).display()
    );
    Ok(())
}
