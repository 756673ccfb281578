use std::path::PathBuf;

use clap::Args;
use refresh_core::config::RefreshConfig;
use refresh_core::output::{sanitize_output_path, write_manifest};
use refresh_engine::orchestrator::AccountRunner;
use refresh_engine::refresh::{run_refresh, RefreshOptions};
use tracing::info;

use super::ScopeArgs;
use crate::report;

#[derive(Args)]
pub struct RefreshArgs {
    #[command(flatten)]
    scope: ScopeArgs,
    /// Only include projects of this integration type (e.g. github, bitbucket-cloud)
    #[arg(long, alias = "integrationType")]
    integration_type: Option<String>,
    /// Number of organizations to process in parallel
    #[arg(long)]
    concurrency: Option<usize>,
    /// Manifest output path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub async fn run(args: RefreshArgs) -> anyhow::Result<()> {
    let config = RefreshConfig::load()?;
    let concurrency = super::concurrency(args.concurrency, &config)?;
    // Checked before any API traffic so a bad path fails fast.
    let output = sanitize_output_path(args.output.as_deref().unwrap_or(&config.output))?;

    let api = super::connect(&config)?;
    let accounts = args.scope.resolve(api.as_ref()).await?;
    info!(
        "processing {} organization(s) with concurrency {concurrency}",
        accounts.len()
    );

    let options = RefreshOptions {
        group_id: args.scope.group_id.clone(),
        integration_type: args.integration_type.filter(|t| !t.is_empty()),
    };
    let runner = AccountRunner::new(concurrency).with_progress(super::show_progress());
    let result = run_refresh(api, accounts, &options, &runner).await;

    write_manifest(&output, &result.manifest)?;
    print!("{}", report::render_refresh_summary(&result, &output));
    Ok(())
}
