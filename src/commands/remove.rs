use anyhow::Result;
use log::{debug, info};

use super::{CommandContext, describe, split_bundle_spec};
use crate::runtime::Runtime;

/// Remove installed versions matching `version`, or all of them.
#[tracing::instrument(skip(ctx))]
pub fn remove<R: Runtime>(ctx: &CommandContext<R>, bundle: &str, version: Option<&str>) -> Result<()> {
    let (name, version) = split_bundle_spec(bundle, version);
    debug!("Removing bundle {}", describe(name, version));

    let outcome = ctx.install_root()?.remove_versions(name, version)?;
    if let Some(current) = &outcome.new_current {
        info!("Bundle {} now defaults to {}", name, current);
    }
    info!("Bundle versions removed: {}", outcome.removed);
    Ok(())
}
