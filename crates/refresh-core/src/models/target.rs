use serde::{Deserialize, Serialize};

/// Normalized, origin-agnostic repository identity.
///
/// The shape is fixed by the origin: path-style providers (GitHub, Bitbucket
/// Cloud, Azure Repos) identify a repo by owner/name and optionally a branch,
/// Bitbucket Server by project key and repo slug. Serializes as the bare
/// fields, which is what the importer expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalTarget {
    Repository {
        owner: String,
        name: String,
        /// `None` means the provider's default branch.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },
    KeySlug {
        #[serde(rename = "projectKey")]
        project_key: String,
        #[serde(rename = "repoSlug")]
        repo_slug: String,
    },
}

impl CanonicalTarget {
    pub fn repository(owner: &str, name: &str, branch: Option<&str>) -> Self {
        CanonicalTarget::Repository {
            owner: owner.to_string(),
            name: name.to_string(),
            branch: branch.filter(|b| !b.is_empty()).map(str::to_string),
        }
    }

    pub fn key_slug(project_key: &str, repo_slug: &str) -> Self {
        CanonicalTarget::KeySlug {
            project_key: project_key.to_string(),
            repo_slug: repo_slug.to_string(),
        }
    }
}

impl std::fmt::Display for CanonicalTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalTarget::Repository {
                owner,
                name,
                branch: Some(branch),
            } => write!(f, "{owner}/{name}@{branch}"),
            CanonicalTarget::Repository { owner, name, .. } => write!(f, "{owner}/{name}"),
            CanonicalTarget::KeySlug {
                project_key,
                repo_slug,
            } => write!(f, "{project_key}/{repo_slug}"),
        }
    }
}

/// One row of the output manifest: a unique (account, connector, target).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTarget {
    pub target: CanonicalTarget,
    #[serde(rename = "orgId")]
    pub account_id: String,
    #[serde(rename = "integrationId")]
    pub connector_id: String,
}
