use refresh_core::models::target::CanonicalTarget;

/// Origin tag of the one hosted provider that cannot be re-imported: the
/// platform does not expose the numeric project ID its importer requires.
pub const GITLAB_ORIGIN: &str = "gitlab";

/// How a provider identifies a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStyle {
    /// owner / name / optional branch
    Repository,
    /// project key / repo slug, never branch-specific
    KeySlug,
}

/// Source-control origins whose projects can be re-registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScmOrigin {
    GitHub,
    GitHubCloudApp,
    GitHubEnterprise,
    BitbucketCloud,
    BitbucketConnectApp,
    BitbucketCloudApp,
    AzureRepos,
    BitbucketServer,
}

impl ScmOrigin {
    pub const ALL: [ScmOrigin; 8] = [
        ScmOrigin::GitHub,
        ScmOrigin::GitHubCloudApp,
        ScmOrigin::GitHubEnterprise,
        ScmOrigin::BitbucketCloud,
        ScmOrigin::BitbucketConnectApp,
        ScmOrigin::BitbucketCloudApp,
        ScmOrigin::AzureRepos,
        ScmOrigin::BitbucketServer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScmOrigin::GitHub => "github",
            ScmOrigin::GitHubCloudApp => "github-cloud-app",
            ScmOrigin::GitHubEnterprise => "github-enterprise",
            ScmOrigin::BitbucketCloud => "bitbucket-cloud",
            ScmOrigin::BitbucketConnectApp => "bitbucket-connect-app",
            ScmOrigin::BitbucketCloudApp => "bitbucket-cloud-app",
            ScmOrigin::AzureRepos => "azure-repos",
            ScmOrigin::BitbucketServer => "bitbucket-server",
        }
    }

    pub fn style(&self) -> TargetStyle {
        match self {
            ScmOrigin::BitbucketServer => TargetStyle::KeySlug,
            _ => TargetStyle::Repository,
        }
    }

    /// Key under which the account's integration listing reports the
    /// connector for this origin. `bitbucket-cloud-app` is what projects
    /// carry, but the integration is listed as `bitbucket-connect-app`.
    pub fn connector_key(&self) -> &'static str {
        match self {
            ScmOrigin::BitbucketCloudApp => ScmOrigin::BitbucketConnectApp.as_str(),
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for ScmOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScmOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScmOrigin::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| format!("unsupported origin: {s:?}"))
    }
}

pub fn is_scm_origin(origin: &str) -> bool {
    origin.parse::<ScmOrigin>().is_ok()
}

/// Map an origin tag to its connector lookup key. Tags outside the
/// supported set pass through unchanged.
pub fn origin_to_connector_key(origin: &str) -> &str {
    match origin.parse::<ScmOrigin>() {
        Ok(o) => o.connector_key(),
        Err(_) => origin,
    }
}

/// Split `owner/repo[(decoration)]:manifest/path` into owner and repo.
fn split_name(raw_name: &str) -> Option<(&str, &str)> {
    let (owner, rest) = raw_name.split_once('/')?;
    let repo = rest.split(':').next().unwrap_or(rest);
    let repo = repo.split('(').next().unwrap_or(repo).trim();
    let owner = owner.trim();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner, repo))
}

/// Convert a project's composite name into its canonical target.
///
/// Returns `None` for unsupported origins and for names without an
/// `owner/` prefix. An empty branch hint means the default branch; the hint
/// is ignored for Bitbucket Server.
pub fn normalize(raw_name: &str, origin: &str, branch_hint: &str) -> Option<CanonicalTarget> {
    let origin: ScmOrigin = origin.parse().ok()?;
    let (owner, repo) = split_name(raw_name)?;

    Some(match origin.style() {
        TargetStyle::Repository => CanonicalTarget::repository(owner, repo, Some(branch_hint)),
        TargetStyle::KeySlug => CanonicalTarget::key_slug(owner, repo),
    })
}
