pub mod config;
pub mod dedup;
pub mod refresh;

use std::sync::Arc;

use clap::{Args, Subcommand};
use refresh_api::{PlatformApi, PlatformClient};
use refresh_auth::{resolve_token, EnvStore, KeyringStore};
use refresh_core::config::RefreshConfig;
use refresh_core::models::account::Account;
use tracing::info;

#[derive(Subcommand)]
pub enum Command {
    /// Build a manifest of unique targets for re-import
    Refresh(refresh::RefreshArgs),
    /// Find and optionally delete duplicate projects and empty targets
    Dedup(dedup::DedupArgs),
    /// Manage refresh configuration and credentials
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Refresh(args) => refresh::run(args).await,
        Command::Dedup(args) => dedup::run(args).await,
        Command::Config { action } => config::run(action),
    }
}

/// Which accounts a run covers. Exactly one of the two must be given.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ScopeArgs {
    /// Group ID; every organization in the group is scanned
    #[arg(long, alias = "groupId")]
    pub group_id: Option<String>,
    /// A single organization ID to scan
    #[arg(long, alias = "orgId")]
    pub org_id: Option<String>,
}

impl ScopeArgs {
    pub async fn resolve(&self, api: &dyn PlatformApi) -> anyhow::Result<Vec<Account>> {
        match (&self.group_id, &self.org_id) {
            (Some(group), None) => {
                info!(group = %group, "fetching organizations");
                let accounts = api
                    .list_accounts(group)
                    .await
                    .map_err(|e| anyhow::anyhow!("fetching orgs: {e}"))?;
                Ok(accounts)
            }
            (None, Some(org)) => Ok(vec![Account::from_id(org.clone())]),
            _ => anyhow::bail!("provide either --group-id or --org-id, not both"),
        }
    }
}

/// Effective concurrency: the flag if given, else the configured value.
pub fn concurrency(flag: Option<usize>, config: &RefreshConfig) -> anyhow::Result<usize> {
    let n = flag.unwrap_or(config.concurrency);
    if n == 0 {
        anyhow::bail!("--concurrency must be at least 1");
    }
    Ok(n)
}

/// Authenticated API client built from the config and the first available
/// token (environment, then OS keychain).
pub fn connect(config: &RefreshConfig) -> anyhow::Result<Arc<dyn PlatformApi>> {
    let env = EnvStore::default();
    let keyring = KeyringStore::new();
    let token = resolve_token(&[&env, &keyring])?;

    let client = PlatformClient::from_config(config, &token)?;
    info!(host = %client.host(), "connected");
    Ok(Arc::new(client))
}

/// Show a progress bar only when someone is watching stderr.
pub fn show_progress() -> bool {
    console::user_attended_stderr()
}
