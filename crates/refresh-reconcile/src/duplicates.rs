use std::collections::{BTreeMap, HashSet};

use refresh_core::models::api_target::ApiTarget;
use refresh_core::models::project::Project;

/// Projects of one account that share a name, oldest first. Only built by
/// [`find_duplicate_groups`], so it always holds at least two projects.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    key: String,
    projects: Vec<Project>,
}

impl DuplicateGroup {
    /// The shared project name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The project that is kept.
    pub fn original(&self) -> &Project {
        &self.projects[0]
    }

    /// Every project after the original; these are removal candidates.
    pub fn duplicates(&self) -> &[Project] {
        &self.projects[1..]
    }
}

/// Group projects by name and return the groups with two or more members.
///
/// The key is the name alone. Re-imports through a different connector
/// (`bitbucket-connect-app` vs `bitbucket-cloud`) are the usual source of
/// duplicates, so the origin must not be part of it. Groups come back in
/// name order; members in creation order regardless of fetch order.
pub fn find_duplicate_groups(projects: &[Project]) -> Vec<DuplicateGroup> {
    let mut grouped: BTreeMap<&str, Vec<Project>> = BTreeMap::new();
    for p in projects {
        grouped.entry(p.name.as_str()).or_default().push(p.clone());
    }

    grouped
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(key, mut members)| {
            members.sort_by(|a, b| a.cmp_created(b));
            DuplicateGroup {
                key: key.to_string(),
                projects: members,
            }
        })
        .collect()
}

/// Targets still referenced by at least one project, ignoring the projects
/// in `removed`. In delete mode `removed` is empty because the projects were
/// re-fetched after deletion; in a dry run it holds the candidates that
/// would have been deleted.
pub fn active_target_ids(projects: &[Project], removed: &HashSet<String>) -> HashSet<String> {
    projects
        .iter()
        .filter(|p| !p.target_id.is_empty() && !removed.contains(&p.id))
        .map(|p| p.target_id.clone())
        .collect()
}

/// Targets that share a display name with at least one other target and
/// own no active project. A uniquely named empty target is left alone.
pub fn orphaned_targets(targets: &[ApiTarget], active: &HashSet<String>) -> Vec<ApiTarget> {
    let mut by_name: BTreeMap<&str, Vec<&ApiTarget>> = BTreeMap::new();
    for t in targets {
        by_name.entry(t.display_name.as_str()).or_default().push(t);
    }

    let mut orphans = Vec::new();
    for (_, mut group) in by_name {
        if group.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        orphans.extend(
            group
                .into_iter()
                .filter(|t| !active.contains(&t.id))
                .cloned(),
        );
    }
    orphans
}
