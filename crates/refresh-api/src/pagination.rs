//! Multi-page retrieval.
//!
//! Two styles are in use on the platform: the v1 API pages by number and the
//! last page is the first one shorter than the page size; the REST API returns
//! a `links.next` continuation. Continuations come from the server, so they
//! are only followed while they stay on the API host.

use reqwest::{Method, StatusCode};
use tracing::{debug, warn};
use url::Url;

use refresh_core::error::RefreshError;

use crate::client::PlatformClient;

/// Records requested per page.
pub const PAGE_SIZE: usize = 100;

/// One decoded page of a link-paginated listing.
#[derive(Debug)]
pub struct LinkPage<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Whether a server-supplied continuation may be followed.
///
/// Allowed: a root-relative path, or an absolute `https` URL whose host is
/// `allowed_host` or a subdomain of it (dot boundary required).
pub fn is_allowed_next_url(next: &str, allowed_host: &str) -> bool {
    if next.is_empty() {
        return false;
    }
    if next.starts_with('/') {
        // "//host/path" is a network-path reference, not a path.
        return !next.starts_with("//") && !next.starts_with("/\\");
    }
    let Ok(url) = Url::parse(next) else {
        return false;
    };
    if url.scheme() != "https" {
        return false;
    }
    match url.host_str() {
        Some(host) => host_matches(host, allowed_host),
        None => false,
    }
}

fn host_matches(host: &str, allowed_host: &str) -> bool {
    host == allowed_host
        || host
            .strip_suffix(allowed_host)
            .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
}

impl PlatformClient {
    /// Turn a continuation into the next request URL, or `None` to stop.
    pub(crate) fn resolve_next(&self, next: &str) -> Option<Url> {
        if !is_allowed_next_url(next, self.host()) {
            warn!(next, host = self.host(), "ignoring pagination link outside the API host");
            return None;
        }
        let resolved = if next.starts_with('/') {
            self.append_to_base(next)
        } else {
            Url::parse(next).ok()?
        };
        // A relative reference must still land on the base host.
        if next.starts_with('/') && resolved.host_str() != Some(self.host()) {
            warn!(next, "ignoring relative pagination link that changes host");
            return None;
        }
        Some(resolved)
    }

    /// Append a root-relative continuation to the base URL, keeping any
    /// path prefix the base carries (e.g. `https://proxy.corp/snyk`).
    fn append_to_base(&self, next: &str) -> Url {
        let (path, query) = match next.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (next, None),
        };
        let mut url = self.base().clone();
        let joined = format!("{}{path}", url.path().trim_end_matches('/'));
        url.set_path(&joined);
        url.set_query(query);
        url.set_fragment(None);
        url
    }

    /// Fetch every page of a link-paginated listing.
    ///
    /// A 404 on the first page means the account has nothing to list and
    /// yields an empty result.
    pub async fn fetch_link_paged<T, F>(
        &self,
        what: &str,
        first: Url,
        decode: F,
    ) -> Result<Vec<T>, RefreshError>
    where
        F: Fn(&str) -> Result<LinkPage<T>, RefreshError>,
    {
        let mut all = Vec::new();
        let mut next = Some(first);
        let mut page = 0u32;

        while let Some(url) = next.take() {
            page += 1;
            let (status, body) = self
                .send_with_retry(Method::GET, &url, crate::client::ACCEPT_JSON_API)
                .await?;

            if status == StatusCode::NOT_FOUND && page == 1 {
                debug!(what, "listing not found, treating as empty");
                return Ok(all);
            }
            if !status.is_success() {
                return Err(RefreshError::ApiError {
                    status: status.as_u16(),
                    body: format!("{what} page {page}: {body}"),
                });
            }

            let decoded = decode(&body)?;
            debug!(what, page, count = decoded.items.len(), "fetched page");
            all.extend(decoded.items);
            next = decoded.next.as_deref().and_then(|n| self.resolve_next(n));
        }

        Ok(all)
    }

    /// Fetch every page of a page-number listing. Stops at the first page
    /// holding fewer than [`PAGE_SIZE`] records.
    pub async fn fetch_count_paged<T, U, F>(
        &self,
        what: &str,
        url_for_page: U,
        decode: F,
    ) -> Result<Vec<T>, RefreshError>
    where
        U: Fn(u32) -> Result<Url, RefreshError>,
        F: Fn(&str) -> Result<Vec<T>, RefreshError>,
    {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let url = url_for_page(page)?;
            let (status, body) = self
                .send_with_retry(Method::GET, &url, crate::client::ACCEPT_JSON)
                .await?;
            if !status.is_success() {
                return Err(RefreshError::ApiError {
                    status: status.as_u16(),
                    body: format!("{what} page {page}: {body}"),
                });
            }

            let items = decode(&body)?;
            let count = items.len();
            debug!(what, page, count, "fetched page");
            all.extend(items);

            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const HOST: &str = "api.snyk.io";

    #[test]
    fn test_relative_links_are_allowed() {
        assert!(is_allowed_next_url("/rest/orgs/abc/projects?page=2", HOST));
        assert!(is_allowed_next_url("/", HOST));
    }

    #[test]
    fn test_same_host_and_subdomains_are_allowed() {
        assert!(is_allowed_next_url("https://api.snyk.io/rest/orgs/abc/projects", HOST));
        assert!(is_allowed_next_url("https://app.api.snyk.io/something", HOST));
        assert!(is_allowed_next_url(
            "https://api.eu.snyk.io/rest/orgs/abc/projects",
            "api.eu.snyk.io"
        ));
    }

    #[test]
    fn test_foreign_hosts_are_rejected() {
        assert!(!is_allowed_next_url("https://evil.com/rest/orgs/abc/projects", HOST));
        assert!(!is_allowed_next_url("https://notapi.snyk.io/path", HOST));
        assert!(!is_allowed_next_url("https://evilapi.snyk.io/path", HOST));
        assert!(!is_allowed_next_url("https://api.snyk.io.evil.com/path", HOST));
        assert!(!is_allowed_next_url("https://api.snyk.io@evil.com/path", HOST));
    }

    #[test]
    fn test_plain_http_and_junk_are_rejected() {
        assert!(!is_allowed_next_url("http://api.snyk.io/rest/orgs/abc/projects", HOST));
        assert!(!is_allowed_next_url("", HOST));
        assert!(!is_allowed_next_url("rest/orgs?page=2", HOST));
        assert!(!is_allowed_next_url("//evil.com/rest", HOST));
    }

    #[test]
    fn test_resolve_next_joins_relative_links_onto_base() {
        let client = PlatformClient::new("https://api.snyk.io", "tok", Duration::from_secs(1))
            .unwrap();
        let url = client
            .resolve_next("/rest/orgs/o1/projects?starting_after=abc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.snyk.io/rest/orgs/o1/projects?starting_after=abc"
        );
        assert!(client.resolve_next("https://evilapi.snyk.io/x").is_none());
    }

    #[test]
    fn test_resolve_next_keeps_base_path_prefix() {
        let client =
            PlatformClient::new("https://proxy.corp/snyk/", "tok", Duration::from_secs(1))
                .unwrap();
        let url = client
            .resolve_next("/rest/orgs/o1/projects?starting_after=abc")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://proxy.corp/snyk/rest/orgs/o1/projects?starting_after=abc"
        );
        let url = client.resolve_next("/rest/orgs/o1/targets").unwrap();
        assert_eq!(url.as_str(), "https://proxy.corp/snyk/rest/orgs/o1/targets");
    }
}
