use anyhow::{Result, bail};
use colored::Colorize;
use log::debug;

use super::{CommandContext, describe, print_name, split_bundle_spec};
use crate::runtime::Runtime;

/// Print installed versions of a bundle, the current one first.
#[tracing::instrument(skip(ctx))]
pub fn list<R: Runtime>(ctx: &CommandContext<R>, bundle: &str, version: Option<&str>) -> Result<()> {
    let (name, version) = split_bundle_spec(bundle, version);
    debug!("Determining installed versions of bundle {}", describe(name, version));

    let installed = ctx.install_root()?.installed_versions(name, version)?;

    print_name(name);

    if installed.is_empty() {
        bail!("Bundle {} not installed.", describe(name, version));
    }

    if let Some(current) = &installed.current {
        println!(
            "{}{}",
            format!("*{}", current.version).bold().yellow(),
            format!(" [{}]", current.dir.display()).white()
        );
    }
    for other in &installed.others {
        println!(
            "{}",
            format!("{} [{}]", other.version, other.dir.display()).white()
        );
    }
    Ok(())
}
