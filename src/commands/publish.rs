use anyhow::{Context, Result, bail};
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{CommandContext, close_store};
use crate::archive::MANIFEST_FILE;
use crate::model::{Bundle, BundleVersion};
use crate::runtime::{self, Runtime};
use crate::store::{BuildOptions, BundleQuery, Store};

/// The part of `package.json` a bundle is named after.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub name: String,
    pub version: String,
}

impl Manifest {
    pub fn load<R: Runtime>(runtime: &R, base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(MANIFEST_FILE);
        let content = match runtime.read_to_string(&path) {
            Ok(content) => content,
            Err(e) if runtime::is_not_found(&e) => {
                bail!("Missing package.json. Needed for deriving bundle's 'name' and 'version'")
            }
            Err(e) => return Err(e.context(format!("Failed to read {:?}", path))),
        };
        serde_json::from_str(&content).with_context(|| format!("Invalid manifest {:?}", path))
    }
}

/// Build the project under `basedir` and publish it as a bundle version.
///
/// With `force` an already published version is replaced.
#[tracing::instrument(skip(ctx))]
pub async fn publish<R: Runtime>(ctx: &mut CommandContext<R>, force: bool) -> Result<()> {
    let base_dir = match ctx.config().get("basedir")? {
        Some(dir) => PathBuf::from(dir),
        None => ctx.runtime().current_dir()?,
    };
    let manifest = Manifest::load(ctx.runtime(), &base_dir)?;
    let tag = ctx.config().get("tag")?.filter(|t| !t.is_empty());

    let store = ctx.open_store().await?;
    let result = run(ctx, store.as_ref(), &base_dir, manifest, tag, force).await;
    close_store(store).await;
    result
}

async fn run<R: Runtime>(
    ctx: &CommandContext<R>,
    store: &dyn Store,
    base_dir: &Path,
    manifest: Manifest,
    tag: Option<String>,
    force: bool,
) -> Result<()> {
    let Manifest { name, version } = manifest;
    info!("Publishing bundle {}@{}", name, version);

    info!("Installing packages");
    ctx.packages().install_packages(base_dir).await?;

    info!("Check and initiate Bundle \"{}\"", name);
    if store.create_bundle(&Bundle::new(&name)).await? {
        info!("Bundle initiated \"{}\"", name);
    }
    let mut bundle = store
        .query_bundle(&name, &BundleQuery::default())
        .await?
        .unwrap_or_else(|| Bundle::new(&name));
    bundle.versions.clear();

    let bundle_version = BundleVersion::new(&version).with_tag(tag);
    let options = BuildOptions {
        base_dir: base_dir.to_path_buf(),
    };

    info!("Save bundle version");
    let saved = if force {
        store
            .update_bundle_version(&mut bundle, &bundle_version, &options)
            .await?
    } else {
        store
            .save_bundle_version(&mut bundle, &bundle_version, &options)
            .await?
    };
    if !saved {
        bail!(
            "Unable to publish {}@{}. Please check whether it is already published!",
            name,
            version
        );
    }
    info!("{}@{} published successfully!", name, version);
    Ok(())
}
