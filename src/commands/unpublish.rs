use anyhow::{Result, bail};
use log::info;

use super::tag::find_version;
use super::{CommandContext, close_store, split_bundle_spec};
use crate::runtime::Runtime;
use crate::store::Store;

/// Soft-delete a published version. Installs made from it are left alone.
#[tracing::instrument(skip(ctx))]
pub async fn unpublish<R: Runtime>(
    ctx: &mut CommandContext<R>,
    bundle: &str,
    version: Option<&str>,
) -> Result<()> {
    let (name, version) = split_bundle_spec(bundle, version);
    let Some(version) = version else {
        bail!("No version specified to unpublish for {}", name);
    };

    let store = ctx.open_store().await?;
    let result = run(store.as_ref(), name, version).await;
    close_store(store).await;
    result
}

async fn run(store: &dyn Store, name: &str, version: &str) -> Result<()> {
    let (mut bundle, bundle_version) = find_version(store, name, version).await?;
    let archived = store.delete_bundle_version(&mut bundle, &bundle_version).await?;
    info!("{}@{} unpublished [{}]", name, version, archived);
    Ok(())
}
