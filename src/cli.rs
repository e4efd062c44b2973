use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::commands::{self, CommandContext};
use crate::config::ROOT_DIR_ENV;
use crate::runtime::Runtime;

/// dbm - dependency bundle manager
///
/// Publish, tag and install snapshots of a node_modules tree.
///
/// Settings are read from ~/.dbm/.dbmrc, the nearest .dbmrc and
/// DBM_CONFIG_<KEY> environment variables; options given here win.
///
/// Examples:
///   dbm --store local --repo /shared/bundles publish
///   dbm install my-bundle@^1.2.0
///   NODE_PATH=$(dbm path my-bundle) node app.js
#[derive(Parser, Debug)]
#[command(author, version = env!("DBM_VERSION"), about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory of installed bundles (defaults to ~/.ndb)
    #[arg(
        long = "root",
        short = 'r',
        env = ROOT_DIR_ENV,
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Store backend to use (git or local)
    #[arg(long, short = 's', value_name = "NAME", global = true)]
    pub store: Option<String>,

    /// Repository of the store: a git url or a local directory
    #[arg(long, short = 'R', value_name = "REPO", global = true)]
    pub repo: Option<String>,

    /// Display verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install version of the bundle
    #[command(visible_alias = "i")]
    Install(QueryArgs),

    /// View available versions of the bundle
    #[command(visible_alias = "vw")]
    View(QueryArgs),

    /// List installed bundle versions
    #[command(visible_aliases = ["ls", "l"])]
    List(BundleArgs),

    /// Resolve the node_modules path of an installed bundle version
    #[command(visible_alias = "p")]
    Path(PathArgs),

    /// Set the default installed version of the bundle
    Default(BundleArgs),

    /// Remove installed versions of the bundle
    #[command(visible_alias = "rm")]
    Remove(BundleArgs),

    /// Publish the bundle project in the working directory
    Publish(PublishArgs),

    /// Tag a published version, or clear its tag
    Tag(TagArgs),

    /// Unpublish a version of the bundle
    Unpublish(BundleArgs),
}

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Bundle name, optionally followed by @<version>
    #[arg(value_name = "BUNDLE")]
    pub bundle: String,

    /// Version or version range
    #[arg(value_name = "VERSION")]
    pub version: Option<String>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub target: BundleArgs,

    /// Tag to use
    #[arg(long, short = 't')]
    pub tag: Option<String>,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    #[command(flatten)]
    pub target: BundleArgs,

    /// Check whether the installed version is the latest match
    #[arg(long, short = 'c')]
    pub check: bool,
}

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Base directory of the bundle project
    #[arg(long = "dir", short = 'd', value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Tag for the published version (defaults to latest)
    #[arg(long, short = 't')]
    pub tag: Option<String>,

    /// Replace the version if it is already published
    #[arg(long, short = 'f')]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct TagArgs {
    #[arg(value_name = "BUNDLE")]
    pub bundle: String,

    #[arg(value_name = "VERSION")]
    pub version: String,

    /// Tag to set. Clears the version's tag when omitted
    #[arg(value_name = "TAG")]
    pub tag: Option<String>,
}

impl Cli {
    /// Config values given on the command line.
    pub fn overrides(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        if let Some(root) = &self.root {
            values.insert("rootdir".to_string(), root.to_string_lossy().into_owned());
        }
        if let Some(store) = &self.store {
            values.insert("store".to_string(), store.clone());
        }
        if let Some(repo) = &self.repo {
            values.insert("repo".to_string(), repo.clone());
        }
        match &self.command {
            Commands::Publish(args) => {
                if let Some(dir) = &args.dir {
                    values.insert("basedir".to_string(), dir.to_string_lossy().into_owned());
                }
                if let Some(tag) = &args.tag {
                    values.insert("tag".to_string(), tag.clone());
                }
            }
            Commands::Path(args) if args.check => {
                values.insert("check".to_string(), "true".to_string());
            }
            _ => {}
        }
        values
    }
}

impl Commands {
    pub async fn run<R: Runtime>(self, ctx: &mut CommandContext<R>) -> Result<()> {
        match self {
            Commands::Install(args) => {
                let BundleArgs { bundle, version } = &args.target;
                commands::install(ctx, bundle, version.as_deref(), args.tag.as_deref()).await
            }
            Commands::View(args) => {
                let BundleArgs { bundle, version } = &args.target;
                commands::view(ctx, bundle, version.as_deref(), args.tag.as_deref()).await
            }
            Commands::List(args) => commands::list(ctx, &args.bundle, args.version.as_deref()),
            Commands::Path(args) => {
                let BundleArgs { bundle, version } = &args.target;
                commands::path(ctx, bundle, version.as_deref(), args.check).await
            }
            Commands::Default(args) => {
                commands::set_default(ctx, &args.bundle, args.version.as_deref())
            }
            Commands::Remove(args) => commands::remove(ctx, &args.bundle, args.version.as_deref()),
            Commands::Publish(args) => commands::publish(ctx, args.force).await,
            Commands::Tag(args) => {
                commands::tag(ctx, &args.bundle, Some(&args.version), args.tag.as_deref()).await
            }
            Commands::Unpublish(args) => {
                commands::unpublish(ctx, &args.bundle, args.version.as_deref()).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_install_parsing() {
        let cli = Cli::try_parse_from(["dbm", "install", "dummy@1.0.0"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.target.bundle, "dummy@1.0.0");
                assert_eq!(args.target.version, None);
                assert_eq!(args.tag, None);
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_aliases() {
        let cli = Cli::try_parse_from(["dbm", "i", "dummy", "^1.0.0", "--tag", "beta"]).unwrap();
        match cli.command {
            Commands::Install(args) => {
                assert_eq!(args.target.version.as_deref(), Some("^1.0.0"));
                assert_eq!(args.tag.as_deref(), Some("beta"));
            }
            _ => panic!("Expected Install command"),
        }
        assert!(matches!(
            Cli::try_parse_from(["dbm", "vw", "dummy"]).unwrap().command,
            Commands::View(_)
        ));
        assert!(matches!(
            Cli::try_parse_from(["dbm", "ls", "dummy"]).unwrap().command,
            Commands::List(_)
        ));
        assert!(matches!(
            Cli::try_parse_from(["dbm", "p", "dummy"]).unwrap().command,
            Commands::Path(_)
        ));
        assert!(matches!(
            Cli::try_parse_from(["dbm", "rm", "dummy", "1.0.0"]).unwrap().command,
            Commands::Remove(_)
        ));
    }

    #[test]
    fn test_cli_global_options() {
        let cli = Cli::try_parse_from([
            "dbm", "view", "dummy", "--root", "/tmp/ndb", "-s", "local", "-R", "/tmp/store",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/ndb")));

        let overrides = cli.overrides();
        assert_eq!(overrides.get("rootdir").map(String::as_str), Some("/tmp/ndb"));
        assert_eq!(overrides.get("store").map(String::as_str), Some("local"));
        assert_eq!(overrides.get("repo").map(String::as_str), Some("/tmp/store"));
    }

    #[test]
    fn test_cli_publish_overrides() {
        let cli = Cli::try_parse_from(["dbm", "publish", "--dir", "/work/app", "-t", "beta", "-f"])
            .unwrap();
        let overrides = cli.overrides();
        assert_eq!(overrides.get("basedir").map(String::as_str), Some("/work/app"));
        assert_eq!(overrides.get("tag").map(String::as_str), Some("beta"));
        assert!(matches!(cli.command, Commands::Publish(PublishArgs { force: true, .. })));
    }

    #[test]
    fn test_cli_path_check() {
        let cli = Cli::try_parse_from(["dbm", "path", "dummy", "^1.0.0", "--check"]).unwrap();
        assert_eq!(cli.overrides().get("check").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_cli_tag_requires_version() {
        assert!(Cli::try_parse_from(["dbm", "tag", "dummy"]).is_err());
        let cli = Cli::try_parse_from(["dbm", "tag", "dummy", "1.0.0"]).unwrap();
        match cli.command {
            Commands::Tag(args) => assert_eq!(args.tag, None),
            _ => panic!("Expected Tag command"),
        }
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["dbm", "dummy"]).is_err());
    }
}
