use anyhow::{Context, Result, bail};
use log::{debug, info, warn};

use super::{CommandContext, close_store, describe, split_bundle_spec};
use crate::archive::LOCK_FILE;
use crate::runtime::Runtime;
use crate::store::{BundleQuery, InstallOptions, Store};

/// Install a bundle version and make it current.
#[tracing::instrument(skip(ctx))]
pub async fn install<R: Runtime>(
    ctx: &mut CommandContext<R>,
    bundle: &str,
    version: Option<&str>,
    tag: Option<&str>,
) -> Result<()> {
    let store = ctx.open_store().await?;
    let result = run(ctx, store.as_ref(), bundle, version, tag).await;
    close_store(store).await;
    result
}

async fn run<R: Runtime>(
    ctx: &CommandContext<R>,
    store: &dyn Store,
    bundle: &str,
    version: Option<&str>,
    tag: Option<&str>,
) -> Result<()> {
    let (name, version) = split_bundle_spec(bundle, version);
    let query = BundleQuery {
        version: version.map(str::to_string),
        tag: tag.filter(|t| !t.is_empty()).map(str::to_string),
    };
    debug!("Querying bundle {} {:?}", name, query);

    let Some(bundle) = store.query_bundle(name, &query).await? else {
        bail!("Bundle {} does not exist!", name);
    };
    let Some(bundle_version) = bundle.preferred_version() else {
        bail!("No candidate version found for bundle {}!", describe(name, version));
    };

    info!("Installing bundle {}@{}", bundle.name, bundle_version.version);

    let root = ctx.install_root()?;
    let target_dir = root.install_dir(&bundle.name, &bundle_version.version);
    let runtime = ctx.runtime();

    let exists = runtime.exists(&target_dir);
    if exists {
        warn!("Bundle already installed under {}.", target_dir.display());
        info!("Updating it with newer files!");
    }
    runtime
        .create_dir_all(&target_dir)
        .with_context(|| format!("Error accessing {}", target_dir.display()))?;

    let options = InstallOptions {
        target_dir: target_dir.clone(),
        exists,
    };
    if store
        .install_bundle(&bundle, bundle_version, &options)
        .await?
        .is_none()
    {
        warn!("Bundle installation skipped");
    }

    if runtime.exists(&target_dir.join(LOCK_FILE)) {
        info!("Installing packages");
        ctx.packages().install_packages(&target_dir).await?;
    }

    root.set_current(&target_dir, true)?;

    info!("Bundle install under {} complete", target_dir.display());
    Ok(())
}
