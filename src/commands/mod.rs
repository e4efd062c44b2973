//! Command implementations behind the CLI.
//!
//! Every command works against a [`CommandContext`]. Commands that talk to a
//! store resolve it by the configured `store` name, let it declare its config
//! keys, initialize it and always close it again, whatever the outcome.

use anyhow::Result;
use colored::Colorize;
use log::{debug, warn};
use std::path::PathBuf;

use crate::config::Config;
use crate::install::{InstallRoot, PackageInstaller};
use crate::runtime::{RealRuntime, Runtime};
use crate::store::{Store, StoreRegistry};

mod default;
mod install;
mod list;
mod path;
mod publish;
mod remove;
mod tag;
mod unpublish;
mod view;

pub use default::set_default;
pub use install::install;
pub use list::list;
pub use path::path;
pub use publish::publish;
pub use remove::remove;
pub use tag::tag;
pub use unpublish::unpublish;
pub use view::view;

pub struct CommandContext<R: Runtime = RealRuntime> {
    runtime: R,
    registry: StoreRegistry,
    config: Config,
    packages: Box<dyn PackageInstaller>,
}

impl<R: Runtime> CommandContext<R> {
    pub fn new(
        runtime: R,
        registry: StoreRegistry,
        config: Config,
        packages: Box<dyn PackageInstaller>,
    ) -> Self {
        Self {
            runtime,
            registry,
            config,
            packages,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn packages(&self) -> &dyn PackageInstaller {
        self.packages.as_ref()
    }

    pub fn root_dir(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.config.require("rootdir")?))
    }

    pub fn install_root(&self) -> Result<InstallRoot<'_, R>> {
        Ok(InstallRoot::new(&self.runtime, self.root_dir()?))
    }

    /// Resolve and initialize the configured store.
    #[tracing::instrument(skip(self))]
    pub async fn open_store(&mut self) -> Result<Box<dyn Store>> {
        let name = self.config.require("store")?;
        let mut store = self.registry.resolve(&name)?;
        self.config.extend_specs(store.config_specs());
        debug!("Initializing {} store", name);
        store.init(&self.config).await?;
        Ok(store)
    }
}

async fn close_store(mut store: Box<dyn Store>) {
    if let Err(e) = store.close().await {
        warn!("Error closing {} store: {:#}", store.name(), e);
    }
}

/// Split `name@version`. An explicit `version` argument wins.
pub fn split_bundle_spec<'a>(bundle: &'a str, version: Option<&'a str>) -> (&'a str, Option<&'a str>) {
    let (name, embedded) = match bundle.split_once('@') {
        Some((name, ver)) if !ver.is_empty() => (name, Some(ver)),
        Some((name, _)) => (name, None),
        None => (bundle, None),
    };
    (name, version.or(embedded))
}

fn describe(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{}@{}", name, version),
        None => name.to_string(),
    }
}

fn print_name(name: &str) {
    println!("{}", name.underline().bold().cyan());
    println!();
}
