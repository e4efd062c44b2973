use anyhow::{Result, bail};
use log::info;

use super::{CommandContext, close_store, split_bundle_spec};
use crate::model::{Bundle, BundleVersion};
use crate::runtime::Runtime;
use crate::store::{BundleQuery, Store};

/// Move `tag` to a published version, or clear the version's tag.
#[tracing::instrument(skip(ctx))]
pub async fn tag<R: Runtime>(
    ctx: &mut CommandContext<R>,
    bundle: &str,
    version: Option<&str>,
    tag: Option<&str>,
) -> Result<()> {
    let (name, version) = split_bundle_spec(bundle, version);
    let Some(version) = version else {
        bail!("No version specified to tag for {}", name);
    };
    let tag = tag.filter(|t| !t.is_empty()).map(str::to_string);

    let store = ctx.open_store().await?;
    let result = run(store.as_ref(), name, version, tag).await;
    close_store(store).await;
    result
}

async fn run(store: &dyn Store, name: &str, version: &str, tag: Option<String>) -> Result<()> {
    let (mut bundle, mut bundle_version) = find_version(store, name, version).await?;

    if !store
        .set_bundle_version_tag(&mut bundle, &mut bundle_version, tag.clone())
        .await?
    {
        bail!("Unable to tag {}@{}. Please retry", name, version);
    }
    match tag {
        Some(tag) => info!("{}@{} tagged {}", name, version, tag),
        None => info!("{}@{} untagged", name, version),
    }
    Ok(())
}

/// The bundle and one of its published versions, looked up exactly.
pub(super) async fn find_version(
    store: &dyn Store,
    name: &str,
    version: &str,
) -> Result<(Bundle, BundleVersion)> {
    let Some(mut bundle) = store
        .query_bundle(name, &BundleQuery::version(version))
        .await?
    else {
        bail!("Bundle {} does not exist!", name);
    };
    let Some(found) = bundle
        .versions
        .iter()
        .position(|v| v.version == version)
        .map(|i| bundle.versions.swap_remove(i))
    else {
        bail!("Bundle {}@{} is not published!", name, version);
    };
    bundle.versions.clear();
    Ok((bundle, found))
}
