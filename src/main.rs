use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitesync::config::Config;
use sitesync::sync;

#[derive(Parser)]
#[command(name = "sitesync")]
#[command(version, about = "Pull a CMS site's production database and files over SSH")]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "site.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Pull the database dump and uploaded files for every detected site
    Sync,
    /// Report remote installation status without transferring anything
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitesync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Sync) {
        Command::Sync => sync::run(&config).await?,
        Command::Info => sync::inspect(&config).await?,
    }

    Ok(())
}
