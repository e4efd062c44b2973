use anyhow::{Result, bail};
use log::{debug, warn};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::{CommandContext, close_store, describe, split_bundle_spec};
use crate::archive::DEPENDENCY_DIR;
use crate::runtime::Runtime;
use crate::store::{BundleQuery, Store};
use crate::version;

/// Print the `node_modules` directory of an installed bundle version.
///
/// With `check`, a range that resolved to an older install than the store's
/// latest match is an error.
#[tracing::instrument(skip(ctx))]
pub async fn path<R: Runtime>(
    ctx: &mut CommandContext<R>,
    bundle: &str,
    version: Option<&str>,
    check: bool,
) -> Result<()> {
    let (name, version) = split_bundle_spec(bundle, version);
    debug!("Determining install path of bundle {}", describe(name, version));

    let version_dir = resolve_dir(ctx, name, version)?;
    let check = check || ctx.config().get_flag("check")?;

    if check && let Some(version) = version {
        let installed = dir_version(&version_dir);
        if installed != version {
            let store = ctx.open_store().await?;
            let result = check_latest(store.as_ref(), name, version, &installed).await;
            close_store(store).await;
            result?;
        }
    }

    println!("{}", version_dir.join(DEPENDENCY_DIR).display());
    Ok(())
}

fn resolve_dir<R: Runtime>(
    ctx: &CommandContext<R>,
    name: &str,
    version: Option<&str>,
) -> Result<PathBuf> {
    let root = ctx.install_root()?;
    let found = match version {
        Some(version) => root.latest_installed_version(name, version)?,
        None => root.current_version_dir(name),
    };
    match found {
        Some(dir) => Ok(dir),
        None => bail!(
            "Bundle {} not installed. Please install it first",
            describe(name, version)
        ),
    }
}

fn dir_version(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn check_latest(store: &dyn Store, name: &str, spec: &str, installed: &str) -> Result<()> {
    let latest = store
        .query_bundle(name, &BundleQuery::version(spec))
        .await?
        .and_then(|bundle| bundle.versions.into_iter().next());
    match latest {
        None => {
            warn!(
                "Unable to determine latest version of bundle {}. Using [{}]",
                name, installed
            );
            Ok(())
        }
        Some(latest) if version::compare(&latest.version, installed) != Ordering::Equal => bail!(
            "Installed version [{}] of bundle {} did not match the latest version [{}]. Please update the version first",
            installed,
            name,
            latest.version
        ),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::Workspace;
    use super::*;

    #[tokio::test]
    async fn test_path_not_installed() {
        let workspace = Workspace::new();
        let mut ctx = workspace.context(&[]);

        let err = path(&mut ctx, "dummy", None, false).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bundle dummy not installed. Please install it first"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_path_resolves_range_to_install() {
        let workspace = Workspace::new();
        workspace.publish("dummy", "1.0.0", "latest").await;
        let mut ctx = workspace.context(&[]);
        super::super::install(&mut ctx, "dummy", None, None).await.unwrap();

        assert_eq!(
            resolve_dir(&ctx, "dummy", Some("^1.0.0")).unwrap(),
            workspace.root().join("dummy/1.0.0")
        );
        assert_eq!(
            resolve_dir(&ctx, "dummy", None).unwrap(),
            workspace.root().join("dummy/current")
        );
        path(&mut ctx, "dummy", Some("^1.0.0"), true).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_path_check_detects_outdated_install() {
        let workspace = Workspace::new();
        workspace.publish("dummy", "1.0.0", "latest").await;
        let mut ctx = workspace.context(&[]);
        super::super::install(&mut ctx, "dummy", None, None).await.unwrap();
        workspace.publish("dummy", "1.1.0", "latest").await;

        path(&mut ctx, "dummy@^1.0.0", None, false).await.unwrap();
        let err = path(&mut ctx, "dummy@^1.0.0", None, true)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Installed version [1.0.0] of bundle dummy did not match the latest version [1.1.0]. Please update the version first"
        );
    }
}
