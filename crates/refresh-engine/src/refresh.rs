use std::sync::Arc;

use tracing::{debug, info, warn};

use refresh_api::PlatformApi;
use refresh_core::error::RefreshError;
use refresh_core::models::account::{Account, ConnectorMap};
use refresh_core::models::manifest::{AccountMeta, RefreshManifest};
use refresh_reconcile::{derive_targets, DerivedTargets, SkipCounts};

use crate::orchestrator::{AccountOutcome, AccountRunner};

/// Inputs of a manifest run that are not accounts.
#[derive(Debug, Clone, Default)]
pub struct RefreshOptions {
    /// Recorded in the manifest when the accounts came from a group.
    pub group_id: Option<String>,
    /// Keep only projects whose origin or connector key equals this.
    pub integration_type: Option<String>,
}

/// What one account contributes to the manifest.
#[derive(Debug, Default)]
pub struct AccountTargets {
    pub connectors: ConnectorMap,
    pub derived: DerivedTargets,
}

/// Fetch one account's connectors and projects concurrently and derive its
/// manifest entries. Both fetch results are inspected before either error
/// is returned.
pub async fn scan_account(
    api: &dyn PlatformApi,
    account: &Account,
    integration_type: Option<&str>,
) -> Result<AccountTargets, RefreshError> {
    let (connectors, projects) =
        tokio::join!(api.list_connectors(&account.id), api.list_projects(&account.id));

    let (connectors, projects) = match (connectors, projects) {
        (Ok(c), Ok(p)) => (c, p),
        (Err(e), Ok(_)) => return Err(e.at("list integrations")),
        (Ok(_), Err(e)) => return Err(e.at("fetch projects")),
        (Err(conn_err), Err(proj_err)) => {
            warn!(account = %account.label(), error = %proj_err, "project fetch also failed");
            return Err(conn_err.at("list integrations"));
        }
    };
    debug!(
        account = %account.label(),
        connectors = connectors.len(),
        projects = projects.len(),
        "account fetched"
    );

    let derived = derive_targets(&account.id, &connectors, &projects, integration_type);
    Ok(AccountTargets {
        connectors,
        derived,
    })
}

/// Result of a manifest run over many accounts.
#[derive(Debug)]
pub struct RefreshReport {
    pub manifest: RefreshManifest,
    pub processed_accounts: usize,
    /// Account label and the error that stopped it.
    pub failed_accounts: Vec<(String, String)>,
    pub skipped: SkipCounts,
}

impl RefreshReport {
    pub fn target_count(&self) -> usize {
        self.manifest.targets.len()
    }
}

/// Scan every account with bounded parallelism and merge the results into
/// one manifest. Failed accounts are reported and contribute nothing.
pub async fn run_refresh(
    api: Arc<dyn PlatformApi>,
    accounts: Vec<Account>,
    options: &RefreshOptions,
    runner: &AccountRunner,
) -> RefreshReport {
    let filter = options.integration_type.clone();
    let outcomes = runner
        .run(accounts, move |account| {
            let api = Arc::clone(&api);
            let filter = filter.clone();
            async move { scan_account(api.as_ref(), &account, filter.as_deref()).await }
        })
        .await;

    let mut report = RefreshReport {
        manifest: RefreshManifest::new(options.group_id.clone()),
        processed_accounts: 0,
        failed_accounts: Vec::new(),
        skipped: SkipCounts::default(),
    };

    for outcome in outcomes {
        match outcome {
            AccountOutcome::Failed { account, error } => {
                warn!(account = %account.label(), error = %error, "failed to process account");
                report.failed_accounts.push((account.label(), error.to_string()));
            }
            AccountOutcome::Completed { account, value } => {
                report.processed_accounts += 1;
                merge_account(&mut report, &account, value);
            }
        }
    }

    if report.manifest.targets.is_empty() {
        info!("no targets found to refresh");
    }
    report
}

fn merge_account(report: &mut RefreshReport, account: &Account, value: AccountTargets) {
    let label = account.label();
    let AccountTargets {
        connectors,
        derived,
    } = value;

    if derived.skipped.gitlab > 0 {
        warn!(
            account = %label,
            skipped = derived.skipped.gitlab,
            "skipping GitLab project(s): the platform does not expose the numeric project id needed for re-import"
        );
    }
    if !derived.targets.is_empty() {
        info!(account = %label, "{} target(s)", derived.targets.len());
    } else if derived.skipped.gitlab == 0 {
        info!(account = %label, "no SCM projects found");
    }

    if account.has_metadata() {
        report.manifest.orgs.insert(
            account.id.clone(),
            AccountMeta {
                name: account.name.clone(),
                slug: account.slug.clone(),
            },
        );
    }
    for (kind, id) in connectors {
        report.manifest.integrations.insert(id, kind);
    }
    report.skipped += derived.skipped;
    report.manifest.targets.extend(derived.targets);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use refresh_core::models::project::Project;
    use refresh_core::models::target::CanonicalTarget;

    use crate::fake::{project, FakePlatform};

    fn named(id: &str, name: &str) -> Account {
        Account {
            id: id.into(),
            name: name.into(),
            slug: name.to_lowercase(),
        }
    }

    fn connectors() -> ConnectorMap {
        ConnectorMap::from([
            ("github".to_string(), "int-gh".to_string()),
            ("bitbucket-server".to_string(), "int-bbs".to_string()),
        ])
    }

    fn with_branch(mut p: Project, branch: &str) -> Project {
        p.branch = branch.into();
        p
    }

    fn platform() -> FakePlatform {
        let org1 = vec![
            with_branch(project("p1", "acme/api:package.json", "github", "2024-01-01T00:00:00Z", "t1"), "main"),
            with_branch(project("p2", "PROJ/repo:pom.xml", "bitbucket-server", "2024-01-01T00:00:00Z", "t2"), "main"),
            with_branch(project("p3", "acme/api:Dockerfile", "github", "2024-01-02T00:00:00Z", "t1"), "main"),
        ];
        FakePlatform {
            accounts: vec![named("org-1", "Payments"), named("org-2", "Search")],
            connectors: HashMap::from([
                ("org-1".to_string(), connectors()),
                ("org-2".to_string(), connectors()),
            ]),
            projects: Mutex::new(HashMap::from([
                ("org-1".to_string(), org1),
                (
                    "org-2".to_string(),
                    vec![project("p9", "group/svc:go.mod", "gitlab", "2024-01-01T00:00:00Z", "t9")],
                ),
            ])),
            ..FakePlatform::default()
        }
    }

    #[tokio::test]
    async fn test_two_accounts_collapse_to_two_entries() {
        let fake = platform();
        let accounts = fake.accounts.clone();
        let options = RefreshOptions {
            group_id: Some("grp-1".into()),
            integration_type: None,
        };
        let report = run_refresh(Arc::new(fake), accounts, &options, &AccountRunner::new(2)).await;

        assert_eq!(report.target_count(), 2);
        assert_eq!(report.processed_accounts, 2);
        assert!(report.failed_accounts.is_empty());
        assert_eq!(report.skipped.duplicate, 1);
        assert_eq!(report.skipped.gitlab, 1);

        let m = &report.manifest;
        assert_eq!(m.group_id.as_deref(), Some("grp-1"));
        assert_eq!(
            m.targets[0].target,
            CanonicalTarget::repository("acme", "api", Some("main"))
        );
        assert_eq!(m.targets[1].target, CanonicalTarget::key_slug("PROJ", "repo"));
        assert_eq!(m.orgs["org-1"].name, "Payments");
        assert_eq!(m.integrations["int-gh"], "github");
    }

    #[tokio::test]
    async fn test_same_target_in_another_account_is_kept() {
        let fake = platform();
        fake.projects.lock().unwrap().insert(
            "org-2".to_string(),
            vec![with_branch(
                project("q1", "acme/api:package.json", "github", "2024-01-01T00:00:00Z", "u1"),
                "main",
            )],
        );
        let accounts = fake.accounts.clone();
        let report = run_refresh(
            Arc::new(fake),
            accounts,
            &RefreshOptions::default(),
            &AccountRunner::new(2),
        )
        .await;

        assert_eq!(report.target_count(), 3);
        let org2: Vec<_> = report
            .manifest
            .targets
            .iter()
            .filter(|t| t.account_id == "org-2")
            .collect();
        assert_eq!(org2.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_account_is_reported_and_excluded() {
        let mut fake = platform();
        fake.failing.insert(("org-1".to_string(), "projects"));
        let accounts = fake.accounts.clone();
        let report = run_refresh(
            Arc::new(fake),
            accounts,
            &RefreshOptions::default(),
            &AccountRunner::new(2),
        )
        .await;

        assert_eq!(report.processed_accounts, 1);
        assert_eq!(report.failed_accounts.len(), 1);
        assert_eq!(report.failed_accounts[0].0, "Payments (payments)");
        assert!(report.failed_accounts[0].1.starts_with("fetch projects"));
        assert!(report.manifest.targets.is_empty());
        // Metadata of the failed account is not merged.
        assert!(!report.manifest.orgs.contains_key("org-1"));
    }

    #[tokio::test]
    async fn test_both_subfetch_failures_are_inspected() {
        let mut fake = platform();
        fake.failing.insert(("org-1".to_string(), "projects"));
        fake.failing.insert(("org-1".to_string(), "connectors"));
        let err = scan_account(&fake, &named("org-1", "Payments"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("list integrations"));
    }

    #[tokio::test]
    async fn test_integration_filter_is_applied() {
        let fake = platform();
        let targets = scan_account(&fake, &named("org-1", "Payments"), Some("bitbucket-server"))
            .await
            .unwrap();
        assert_eq!(targets.derived.targets.len(), 1);
        assert_eq!(targets.derived.skipped.filtered, 2);
    }
}
