use clap::Args;
use refresh_core::config::RefreshConfig;
use refresh_engine::dedup::{run_dedup, CleanupMode};
use refresh_engine::orchestrator::AccountRunner;
use tracing::{info, warn};

use super::ScopeArgs;
use crate::report;

#[derive(Args)]
pub struct DedupArgs {
    #[command(flatten)]
    scope: ScopeArgs,
    /// Number of organizations to process in parallel
    #[arg(long)]
    concurrency: Option<usize>,
    /// Actually delete duplicates (default is a dry run)
    #[arg(long)]
    delete: bool,
}

pub async fn run(args: DedupArgs) -> anyhow::Result<()> {
    let config = RefreshConfig::load()?;
    let concurrency = super::concurrency(args.concurrency, &config)?;
    let mode = if args.delete {
        CleanupMode::Delete
    } else {
        warn!("DRY RUN: nothing will be deleted. Use --delete to remove duplicates.");
        CleanupMode::DryRun
    };

    let api = super::connect(&config)?;
    let accounts = args.scope.resolve(api.as_ref()).await?;
    info!(
        "scanning {} organization(s) for duplicates with concurrency {concurrency}",
        accounts.len()
    );

    let runner = AccountRunner::new(concurrency).with_progress(super::show_progress());
    let result = run_dedup(api, accounts, mode, &runner).await;

    print!("{}", report::render_cleanup(&result));
    Ok(())
}
