use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An organization on the scanning platform. Each account is scanned
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

impl Account {
    /// An account known only by its identity, as when a single org is
    /// selected on the command line.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            slug: String::new(),
        }
    }

    /// Human-readable label used in logs and reports.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.id.clone()
        } else {
            format!("{} ({})", self.name, self.slug)
        }
    }

    pub fn has_metadata(&self) -> bool {
        !self.name.is_empty() || !self.slug.is_empty()
    }
}

/// Connector (integration) type tag to connector identity, for one account.
pub type ConnectorMap = BTreeMap<String, String>;
