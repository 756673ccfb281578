//! Duplicate project removal followed by orphaned target cleanup.
//!
//! Each account goes through two phases in order. Phase one groups projects
//! by name and removes every project but the oldest in each group. Phase two
//! re-reads the projects, works out which targets still own one, and removes
//! the targets that are empty and share a display name with another target.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use refresh_api::PlatformApi;
use refresh_core::error::RefreshError;
use refresh_core::models::account::Account;
use refresh_core::models::api_target::ApiTarget;
use refresh_core::models::project::Project;
use refresh_reconcile::{active_target_ids, find_duplicate_groups, orphaned_targets};

use crate::orchestrator::{AccountOutcome, AccountRunner};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Report candidates without deleting anything.
    DryRun,
    Delete,
}

/// What happened to one removal candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    WouldDelete,
    Deleted,
    Failed(String),
}

impl Disposition {
    fn from_result(result: Result<(), RefreshError>) -> Self {
        match result {
            Ok(()) => Disposition::Deleted,
            Err(e) => Disposition::Failed(e.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Disposition::Failed(_))
    }

    /// Deleted, or would be in a dry run.
    pub fn is_removed(&self) -> bool {
        matches!(self, Disposition::Deleted | Disposition::WouldDelete)
    }
}

#[derive(Debug, Clone)]
pub struct LeafResolution {
    pub project: Project,
    pub disposition: Disposition,
}

/// One duplicate group: the project kept and what happened to the rest.
#[derive(Debug, Clone)]
pub struct GroupResolution {
    pub key: String,
    pub original: Project,
    pub duplicates: Vec<LeafResolution>,
}

#[derive(Debug, Clone)]
pub struct ParentResolution {
    pub target: ApiTarget,
    pub disposition: Disposition,
}

/// Cleanup result for one account.
#[derive(Debug, Clone, Default)]
pub struct AccountCleanup {
    pub project_count: usize,
    pub groups: Vec<GroupResolution>,
    pub orphans: Vec<ParentResolution>,
    /// Set when the orphan phase could not read the account. The duplicate
    /// phase results stand.
    pub parent_scan_error: Option<String>,
}

impl AccountCleanup {
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.duplicates.len()).sum()
    }

    fn leaves(&self) -> impl Iterator<Item = &LeafResolution> {
        self.groups.iter().flat_map(|g| g.duplicates.iter())
    }

    pub fn duplicates_removed(&self) -> usize {
        self.leaves().filter(|l| l.disposition.is_removed()).count()
    }

    pub fn duplicates_failed(&self) -> usize {
        self.leaves().filter(|l| l.disposition.is_failed()).count()
    }

    pub fn orphans_removed(&self) -> usize {
        self.orphans.iter().filter(|o| o.disposition.is_removed()).count()
    }

    pub fn orphans_failed(&self) -> usize {
        self.orphans.iter().filter(|o| o.disposition.is_failed()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.groups.is_empty() && self.orphans.is_empty()
    }
}

async fn remove_project(
    api: &dyn PlatformApi,
    account: &Account,
    project: Project,
    mode: CleanupMode,
) -> LeafResolution {
    let disposition = match mode {
        CleanupMode::DryRun => Disposition::WouldDelete,
        CleanupMode::Delete => {
            let d = Disposition::from_result(api.delete_project(&account.id, &project.id).await);
            if let Disposition::Failed(error) = &d {
                warn!(account = %account.label(), project = %project.id, %error, "failed to delete project");
            }
            d
        }
    };
    LeafResolution {
        project,
        disposition,
    }
}

async fn remove_target(
    api: &dyn PlatformApi,
    account: &Account,
    target: ApiTarget,
    mode: CleanupMode,
) -> ParentResolution {
    let disposition = match mode {
        CleanupMode::DryRun => Disposition::WouldDelete,
        CleanupMode::Delete => {
            let d = Disposition::from_result(api.delete_api_target(&account.id, &target.id).await);
            if let Disposition::Failed(error) = &d {
                warn!(account = %account.label(), target = %target.id, %error, "failed to delete target");
            }
            d
        }
    };
    ParentResolution {
        target,
        disposition,
    }
}

/// Phase two. `hypothetically_removed` holds the projects a dry run would
/// have deleted; they are treated as gone.
async fn resolve_orphans(
    api: &dyn PlatformApi,
    account: &Account,
    mode: CleanupMode,
    hypothetically_removed: &HashSet<String>,
) -> Result<Vec<ParentResolution>, RefreshError> {
    let targets = api
        .list_api_targets(&account.id)
        .await
        .map_err(|e| e.at("fetch targets"))?;
    let projects = api
        .list_projects(&account.id)
        .await
        .map_err(|e| e.at("re-fetch projects"))?;

    let active = active_target_ids(&projects, hypothetically_removed);
    let candidates = orphaned_targets(&targets, &active);
    debug!(
        account = %account.label(),
        targets = targets.len(),
        active = active.len(),
        orphans = candidates.len(),
        "target scan"
    );

    let mut resolved = Vec::with_capacity(candidates.len());
    for target in candidates {
        resolved.push(remove_target(api, account, target, mode).await);
    }
    Ok(resolved)
}

/// Run both cleanup phases for one account. Only the initial project fetch
/// can fail the account; later failures are recorded in the result.
pub async fn clean_account(
    api: &dyn PlatformApi,
    account: &Account,
    mode: CleanupMode,
) -> Result<AccountCleanup, RefreshError> {
    let projects = api
        .list_projects(&account.id)
        .await
        .map_err(|e| e.at("fetch projects"))?;
    info!(account = %account.label(), "fetched {} project(s)", projects.len());
    for p in &projects {
        debug!(id = %p.id, name = %p.name, origin = %p.origin, created = %p.created, "project");
    }

    let mut cleanup = AccountCleanup {
        project_count: projects.len(),
        ..AccountCleanup::default()
    };

    for group in find_duplicate_groups(&projects) {
        let mut duplicates = Vec::with_capacity(group.duplicates().len());
        for project in group.duplicates() {
            duplicates.push(remove_project(api, account, project.clone(), mode).await);
        }
        cleanup.groups.push(GroupResolution {
            key: group.key().to_string(),
            original: group.original().clone(),
            duplicates,
        });
    }

    let hypothetically_removed: HashSet<String> = match mode {
        CleanupMode::Delete => HashSet::new(),
        CleanupMode::DryRun => cleanup.leaves().map(|l| l.project.id.clone()).collect(),
    };

    match resolve_orphans(api, account, mode, &hypothetically_removed).await {
        Ok(orphans) => cleanup.orphans = orphans,
        Err(e) => {
            warn!(account = %account.label(), error = %e, "could not check for empty targets");
            cleanup.parent_scan_error = Some(e.to_string());
        }
    }

    Ok(cleanup)
}

/// Cleanup results across accounts, in the order the accounts were given.
#[derive(Debug)]
pub struct CleanupReport {
    pub mode: CleanupMode,
    pub accounts: Vec<(Account, AccountCleanup)>,
    /// Account label and the error that stopped it.
    pub failed_accounts: Vec<(String, String)>,
}

impl CleanupReport {
    fn sum(&self, f: impl Fn(&AccountCleanup) -> usize) -> usize {
        self.accounts.iter().map(|(_, c)| f(c)).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.sum(AccountCleanup::duplicate_count)
    }

    pub fn total_removed(&self) -> usize {
        self.sum(AccountCleanup::duplicates_removed)
    }

    pub fn total_failed(&self) -> usize {
        self.sum(AccountCleanup::duplicates_failed)
    }

    pub fn orphans_removed(&self) -> usize {
        self.sum(AccountCleanup::orphans_removed)
    }

    pub fn orphans_failed(&self) -> usize {
        self.sum(AccountCleanup::orphans_failed)
    }

    /// Accounts with at least one duplicate group.
    pub fn affected_accounts(&self) -> usize {
        self.accounts
            .iter()
            .filter(|(_, c)| !c.groups.is_empty())
            .count()
    }
}

/// Clean every account with bounded parallelism.
pub async fn run_dedup(
    api: Arc<dyn PlatformApi>,
    accounts: Vec<Account>,
    mode: CleanupMode,
    runner: &AccountRunner,
) -> CleanupReport {
    let outcomes = runner
        .run(accounts, move |account| {
            let api = Arc::clone(&api);
            async move { clean_account(api.as_ref(), &account, mode).await }
        })
        .await;

    let mut report = CleanupReport {
        mode,
        accounts: Vec::new(),
        failed_accounts: Vec::new(),
    };
    for outcome in outcomes {
        match outcome {
            AccountOutcome::Completed { account, value } => report.accounts.push((account, value)),
            AccountOutcome::Failed { account, error } => {
                warn!(account = %account.label(), error = %error, "failed to process account");
                report.failed_accounts.push((account.label(), error.to_string()));
            }
        }
    }
    report
}
