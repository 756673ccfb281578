use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use refresh_core::error::RefreshError;
use refresh_core::models::account::{Account, ConnectorMap};
use refresh_core::models::api_target::ApiTarget;
use refresh_core::models::project::Project;

use crate::client::{PlatformClient, ACCEPT_JSON, ACCEPT_JSON_API, REST_VERSION};
use crate::pagination::PAGE_SIZE;
use crate::{wire, PlatformApi};

impl PlatformClient {
    async fn delete_resource(
        &self,
        what: &str,
        account_id: &str,
        collection: &str,
        id: &str,
    ) -> Result<(), RefreshError> {
        let url = self.endpoint(
            &["rest", "orgs", account_id, collection, id],
            &[("version", REST_VERSION.to_string())],
        )?;
        let (status, body) = self
            .send_with_retry(Method::DELETE, &url, ACCEPT_JSON_API)
            .await?;
        // 204 No Content is the usual answer.
        if status.as_u16() != 204 && status.as_u16() != 200 {
            return Err(RefreshError::ApiError {
                status: status.as_u16(),
                body: format!("delete {what} {id}: {body}"),
            });
        }
        debug!(what, id, account = account_id, "deleted");
        Ok(())
    }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn list_accounts(&self, group_id: &str) -> Result<Vec<Account>, RefreshError> {
        self.fetch_count_paged(
            "orgs",
            |page| {
                self.endpoint(
                    &["v1", "group", group_id, "orgs"],
                    &[("perPage", PAGE_SIZE.to_string()), ("page", page.to_string())],
                )
            },
            wire::decode_orgs_page,
        )
        .await
    }

    async fn list_connectors(&self, account_id: &str) -> Result<ConnectorMap, RefreshError> {
        let url = self.endpoint(&["v1", "org", account_id, "integrations"], &[])?;
        let (status, body) = self.send_with_retry(Method::GET, &url, ACCEPT_JSON).await?;
        if !status.is_success() {
            return Err(RefreshError::ApiError {
                status: status.as_u16(),
                body: format!("list integrations: {body}"),
            });
        }
        wire::decode_integrations(&body)
    }

    async fn list_projects(&self, account_id: &str) -> Result<Vec<Project>, RefreshError> {
        let first = self.endpoint(
            &["rest", "orgs", account_id, "projects"],
            &[
                ("version", REST_VERSION.to_string()),
                ("limit", PAGE_SIZE.to_string()),
            ],
        )?;
        self.fetch_link_paged("projects", first, wire::decode_projects_page)
            .await
    }

    async fn list_api_targets(&self, account_id: &str) -> Result<Vec<ApiTarget>, RefreshError> {
        let first = self.endpoint(
            &["rest", "orgs", account_id, "targets"],
            &[
                ("version", REST_VERSION.to_string()),
                ("limit", PAGE_SIZE.to_string()),
                ("exclude_empty", "false".to_string()),
            ],
        )?;
        self.fetch_link_paged("targets", first, wire::decode_targets_page)
            .await
    }

    async fn delete_project(
        &self,
        account_id: &str,
        project_id: &str,
    ) -> Result<(), RefreshError> {
        self.delete_resource("project", account_id, "projects", project_id)
            .await
    }

    async fn delete_api_target(
        &self,
        account_id: &str,
        target_id: &str,
    ) -> Result<(), RefreshError> {
        self.delete_resource("target", account_id, "targets", target_id)
            .await
    }
}
