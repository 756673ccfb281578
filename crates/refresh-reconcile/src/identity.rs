use std::borrow::Cow;

use refresh_core::models::target::CanonicalTarget;

const DELIMITER: char = ':';

/// Escape the delimiter (and the escape character) inside a field so that
/// no two distinct field lists join to the same string.
fn field(value: &str) -> Cow<'_, str> {
    if value.contains([DELIMITER, '%']) {
        Cow::Owned(value.replace('%', "%25").replace(DELIMITER, "%3A"))
    } else {
        Cow::Borrowed(value)
    }
}

/// Stable identity of a target within one account and connector.
///
/// Field order is fixed per shape: name, owner, branch for repositories;
/// key, slug for Bitbucket Server.
pub fn target_id(account_id: &str, connector_id: &str, target: &CanonicalTarget) -> String {
    let mut parts: Vec<Cow<'_, str>> = vec![field(account_id), field(connector_id)];
    match target {
        CanonicalTarget::Repository {
            owner,
            name,
            branch,
        } => {
            parts.push(field(name));
            parts.push(field(owner));
            parts.push(field(branch.as_deref().unwrap_or("")));
        }
        CanonicalTarget::KeySlug {
            project_key,
            repo_slug,
        } => {
            parts.push(field(project_key));
            parts.push(field(repo_slug));
        }
    }
    parts.join(":")
}
