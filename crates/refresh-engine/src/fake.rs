//! In-memory platform used by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use refresh_api::PlatformApi;
use refresh_core::error::RefreshError;
use refresh_core::models::account::{Account, ConnectorMap};
use refresh_core::models::api_target::ApiTarget;
use refresh_core::models::project::Project;

#[derive(Default)]
pub struct FakePlatform {
    pub accounts: Vec<Account>,
    pub connectors: HashMap<String, ConnectorMap>,
    pub projects: Mutex<HashMap<String, Vec<Project>>>,
    pub targets: Mutex<HashMap<String, Vec<ApiTarget>>>,
    /// (account id, operation) pairs that fail, e.g. ("org-2", "projects").
    pub failing: HashSet<(String, &'static str)>,
    /// Project or target ids whose deletion fails.
    pub undeletable: HashSet<String>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakePlatform {
    fn check(&self, account_id: &str, op: &'static str) -> Result<(), RefreshError> {
        if self.failing.contains(&(account_id.to_string(), op)) {
            return Err(RefreshError::ApiError {
                status: 500,
                body: format!("{op} unavailable"),
            });
        }
        Ok(())
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

pub fn project(id: &str, name: &str, origin: &str, created: &str, target_id: &str) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        origin: origin.into(),
        branch: String::new(),
        target_reference: String::new(),
        created: created.into(),
        target_id: target_id.into(),
    }
}

pub fn api_target(id: &str, display_name: &str) -> ApiTarget {
    ApiTarget {
        id: id.into(),
        display_name: display_name.into(),
        integration_id: "int-1".into(),
        integration_type: "bitbucket-cloud".into(),
        created_at: "2024-01-01T00:00:00Z".into(),
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn list_accounts(&self, _group_id: &str) -> Result<Vec<Account>, RefreshError> {
        Ok(self.accounts.clone())
    }

    async fn list_connectors(&self, account_id: &str) -> Result<ConnectorMap, RefreshError> {
        self.check(account_id, "connectors")?;
        Ok(self.connectors.get(account_id).cloned().unwrap_or_default())
    }

    async fn list_projects(&self, account_id: &str) -> Result<Vec<Project>, RefreshError> {
        self.check(account_id, "projects")?;
        Ok(self
            .projects
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_api_targets(&self, account_id: &str) -> Result<Vec<ApiTarget>, RefreshError> {
        self.check(account_id, "targets")?;
        Ok(self
            .targets
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_project(&self, account_id: &str, project_id: &str) -> Result<(), RefreshError> {
        if self.undeletable.contains(project_id) {
            return Err(RefreshError::ApiError {
                status: 500,
                body: "delete failed".into(),
            });
        }
        let mut projects = self.projects.lock().unwrap();
        if let Some(list) = projects.get_mut(account_id) {
            list.retain(|p| p.id != project_id);
        }
        self.deleted.lock().unwrap().push(project_id.to_string());
        Ok(())
    }

    async fn delete_api_target(&self, account_id: &str, target_id: &str) -> Result<(), RefreshError> {
        let still_used = self
            .projects
            .lock()
            .unwrap()
            .get(account_id)
            .is_some_and(|list| list.iter().any(|p| p.target_id == target_id));
        if still_used || self.undeletable.contains(target_id) {
            return Err(RefreshError::ApiError {
                status: 409,
                body: "target has projects".into(),
            });
        }
        if let Some(list) = self.targets.lock().unwrap().get_mut(account_id) {
            list.retain(|t| t.id != target_id);
        }
        self.deleted.lock().unwrap().push(target_id.to_string());
        Ok(())
    }
}
