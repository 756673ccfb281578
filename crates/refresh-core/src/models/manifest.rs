use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::target::ImportTarget;

/// Display metadata for an account in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
}

/// The manifest document consumed by the importer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshManifest {
    #[serde(rename = "groupId", default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Account identity to display metadata.
    pub orgs: BTreeMap<String, AccountMeta>,
    /// Connector identity to connector type.
    pub integrations: BTreeMap<String, String>,
    pub targets: Vec<ImportTarget>,
}

impl RefreshManifest {
    pub fn new(group_id: Option<String>) -> Self {
        Self {
            group_id,
            ..Self::default()
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, crate::error::RefreshError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::RefreshError::Serialization(e.to_string()))
    }
}
