use anyhow::{Result, bail};
use colored::Colorize;
use log::debug;

use super::{CommandContext, close_store, describe, print_name, split_bundle_spec};
use crate::model::BundleVersion;
use crate::runtime::Runtime;
use crate::store::{BundleQuery, Store};

/// Print the versions a store offers for a bundle, the preferred one first.
#[tracing::instrument(skip(ctx))]
pub async fn view<R: Runtime>(
    ctx: &mut CommandContext<R>,
    bundle: &str,
    version: Option<&str>,
    tag: Option<&str>,
) -> Result<()> {
    let store = ctx.open_store().await?;
    let result = run(store.as_ref(), bundle, version, tag).await;
    close_store(store).await;
    result
}

async fn run(
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

    print_name(&bundle.name);

    let Some((first, rest)) = bundle.versions.split_first() else {
        bail!("No candidate version found for bundle {}!", describe(name, version));
    };
    println!("{}", format!("*{}", label(first)).bold().yellow());
    for version in rest {
        println!("{}", label(version).white());
    }
    Ok(())
}

fn label(version: &BundleVersion) -> String {
    match &version.tag {
        Some(tag) => format!("{} [tag:{}]", version.version, tag),
        None => version.version.clone(),
    }
}
