use std::collections::HashSet;
use std::ops::AddAssign;

use tracing::debug;

use refresh_core::models::account::ConnectorMap;
use refresh_core::models::project::Project;
use refresh_core::models::target::ImportTarget;

use crate::identity::target_id;
use crate::origin::{is_scm_origin, normalize, origin_to_connector_key, GITLAB_ORIGIN};

/// Why projects did not become manifest entries. One accumulator per
/// account, summed by the collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    /// GitLab projects, which cannot be re-imported.
    pub gitlab: usize,
    /// Non-SCM origins (CLI uploads, container registries, ...).
    pub non_scm: usize,
    /// Excluded by the integration-type filter.
    pub filtered: usize,
    /// The account has no connector for the project's origin.
    pub missing_connector: usize,
    /// The composite name did not parse.
    pub unparseable: usize,
    /// Same (account, connector, target) already emitted.
    pub duplicate: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.gitlab
            + self.non_scm
            + self.filtered
            + self.missing_connector
            + self.unparseable
            + self.duplicate
    }
}

impl AddAssign for SkipCounts {
    fn add_assign(&mut self, other: Self) {
        self.gitlab += other.gitlab;
        self.non_scm += other.non_scm;
        self.filtered += other.filtered;
        self.missing_connector += other.missing_connector;
        self.unparseable += other.unparseable;
        self.duplicate += other.duplicate;
    }
}

/// Manifest entries derived from one account's projects.
#[derive(Debug, Default)]
pub struct DerivedTargets {
    pub targets: Vec<ImportTarget>,
    pub skipped: SkipCounts,
}

/// Convert one account's projects into unique manifest entries.
///
/// Entries keep the order of the first project that produced them. When
/// `integration_type` is set, only projects whose origin or connector key
/// equals it are considered.
pub fn derive_targets(
    account_id: &str,
    connectors: &ConnectorMap,
    projects: &[Project],
    integration_type: Option<&str>,
) -> DerivedTargets {
    let mut out = DerivedTargets::default();
    let mut seen = HashSet::new();

    for p in projects {
        if p.origin == GITLAB_ORIGIN {
            out.skipped.gitlab += 1;
            continue;
        }
        if !is_scm_origin(&p.origin) {
            out.skipped.non_scm += 1;
            continue;
        }

        let key = origin_to_connector_key(&p.origin);
        if let Some(filter) = integration_type {
            if p.origin != filter && key != filter {
                out.skipped.filtered += 1;
                continue;
            }
        }

        let connector_id = match connectors.get(key) {
            Some(id) if !id.is_empty() => id,
            _ => {
                debug!(project = %p.id, origin = %p.origin, "no connector for origin");
                out.skipped.missing_connector += 1;
                continue;
            }
        };

        let branch = if p.branch.is_empty() {
            p.target_reference.as_str()
        } else {
            p.branch.as_str()
        };
        let Some(target) = normalize(&p.name, &p.origin, branch) else {
            debug!(project = %p.id, name = %p.name, "unparseable project name");
            out.skipped.unparseable += 1;
            continue;
        };

        if !seen.insert(target_id(account_id, connector_id, &target)) {
            out.skipped.duplicate += 1;
            continue;
        }

        out.targets.push(ImportTarget {
            target,
            account_id: account_id.to_string(),
            connector_id: connector_id.clone(),
        });
    }

    out
}
