pub mod client;
pub mod pagination;
pub mod platform;
pub mod wire;

use async_trait::async_trait;
use refresh_core::error::RefreshError;
use refresh_core::models::account::{Account, ConnectorMap};
use refresh_core::models::api_target::ApiTarget;
use refresh_core::models::project::Project;

pub use client::PlatformClient;

/// Trait for the remote operations the reconciliation engine consumes.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// List every account in a group (handles pagination).
    async fn list_accounts(&self, group_id: &str) -> Result<Vec<Account>, RefreshError>;

    /// Map of connector type to connector identity for an account.
    async fn list_connectors(&self, account_id: &str) -> Result<ConnectorMap, RefreshError>;

    /// All projects of an account. An unknown or empty account yields an
    /// empty list.
    async fn list_projects(&self, account_id: &str) -> Result<Vec<Project>, RefreshError>;

    /// All targets of an account, including ones without projects.
    async fn list_api_targets(&self, account_id: &str) -> Result<Vec<ApiTarget>, RefreshError>;

    /// Delete a single project.
    async fn delete_project(&self, account_id: &str, project_id: &str)
        -> Result<(), RefreshError>;

    /// Delete a target. Fails while the target still owns projects.
    async fn delete_api_target(&self, account_id: &str, target_id: &str)
        -> Result<(), RefreshError>;
}
