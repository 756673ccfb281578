use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A registered repository + manifest scan entry (the platform's "project").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    /// Provider-specific composite name, e.g. `owner/repo:package.json`.
    pub name: String,
    /// Origin tag of the source-control provider, e.g. `github-cloud-app`.
    pub origin: String,
    /// Branch, or the target reference when no branch attribute is present.
    pub branch: String,
    pub target_reference: String,
    /// ISO 8601 creation timestamp as returned by the API.
    pub created: String,
    /// Identity of the owning parent record, empty when not reported.
    pub target_id: String,
}

impl Project {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Order by creation time, oldest first. Falls back to comparing the raw
    /// timestamps when either side does not parse, then to the identity so
    /// that the order is total.
    pub fn cmp_created(&self, other: &Self) -> Ordering {
        let by_time = match (self.created_at(), other.created_at()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.created.cmp(&other.created),
        };
        by_time.then_with(|| self.id.cmp(&other.id))
    }
}
