mod commands;
mod report;

use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "refresh",
    version,
    about = "Rebuild import manifests and clean up duplicate projects on the scanning platform"
)]
struct Cli {
    /// Log every fetched record and request detail
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    commands::run(cli.command).await
}
