use anyhow::Result;
use clap::Parser;
use dbm::cli::Cli;
use dbm::commands::CommandContext;
use dbm::install::Npm;
use dbm::runtime::RealRuntime;
use dbm::store::StoreRegistry;
use log::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let runtime = RealRuntime;
    let registry = StoreRegistry::with_builtin();
    let config = dbm::config::load(&runtime, registry.default_store(), cli.overrides())?;
    let mut ctx = CommandContext::new(runtime, registry, config, Box::new(Npm));
    cli.command.run(&mut ctx).await
}
