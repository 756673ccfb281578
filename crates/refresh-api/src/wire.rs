//! Response bodies of the platform API and their decoders.

use serde::Deserialize;
use serde_json::{Map, Value};

use refresh_core::error::RefreshError;
use refresh_core::models::account::{Account, ConnectorMap};
use refresh_core::models::api_target::ApiTarget;
use refresh_core::models::project::Project;

use crate::pagination::LinkPage;

fn decode_err(context: &str, e: serde_json::Error) -> RefreshError {
    RefreshError::Decode {
        context: context.to_string(),
        message: e.to_string(),
    }
}

#[derive(Deserialize)]
struct OrgsResponse {
    #[serde(default)]
    orgs: Vec<Account>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
struct JsonApiPage<R> {
    #[serde(default)]
    data: Vec<R>,
    #[serde(default)]
    links: Option<Map<String, Value>>,
}

impl<R> JsonApiPage<R> {
    /// `links.next` when it is a non-empty string.
    fn next_link(&self) -> Option<String> {
        self.links
            .as_ref()
            .and_then(|links| links.get("next"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[derive(Deserialize)]
struct Resource<A, L> {
    id: String,
    #[serde(default)]
    attributes: Option<A>,
    #[serde(default)]
    relationships: Option<L>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProjectAttributes {
    name: Option<String>,
    origin: Option<String>,
    created: Option<String>,
    branch: Option<String>,
    #[serde(rename = "targetReference")]
    target_reference: Option<String>,
    #[serde(rename = "target_reference")]
    target_reference_snake: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct ProjectRelationships {
    target: Option<Relationship<Value>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TargetAttributes {
    display_name: Option<String>,
    created_at: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TargetRelationships {
    integration: Option<Relationship<IntegrationAttributes>>,
}

#[derive(Deserialize)]
struct Relationship<A> {
    #[serde(default)]
    data: Option<RelationshipData<A>>,
}

#[derive(Deserialize)]
struct RelationshipData<A> {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attributes: Option<A>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct IntegrationAttributes {
    integration_type: Option<String>,
}

/// Decode one page of `GET /v1/group/{id}/orgs`.
pub fn decode_orgs_page(body: &str) -> Result<Vec<Account>, RefreshError> {
    let resp: OrgsResponse = serde_json::from_str(body).map_err(|e| decode_err("orgs", e))?;
    Ok(resp.orgs)
}

/// Decode `GET /v1/org/{id}/integrations`.
pub fn decode_integrations(body: &str) -> Result<ConnectorMap, RefreshError> {
    serde_json::from_str(body).map_err(|e| decode_err("integrations", e))
}

/// Decode one page of `GET /rest/orgs/{id}/projects`.
pub fn decode_projects_page(body: &str) -> Result<LinkPage<Project>, RefreshError> {
    let page: JsonApiPage<Resource<ProjectAttributes, ProjectRelationships>> =
        serde_json::from_str(body).map_err(|e| decode_err("projects", e))?;
    let next = page.next_link();

    let items = page
        .data
        .into_iter()
        .map(|r| {
            let attrs = r.attributes.unwrap_or_default();
            let target_reference = attrs
                .target_reference
                .filter(|s| !s.is_empty())
                .or(attrs.target_reference_snake)
                .unwrap_or_default();
            let branch = attrs
                .branch
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| target_reference.clone());
            let target_id = r
                .relationships
                .and_then(|rel| rel.target)
                .and_then(|t| t.data)
                .and_then(|d| d.id)
                .unwrap_or_default();

            Project {
                id: r.id,
                name: attrs.name.unwrap_or_default(),
                origin: attrs.origin.unwrap_or_default(),
                branch,
                target_reference,
                created: attrs.created.unwrap_or_default(),
                target_id,
            }
        })
        .collect();

    Ok(LinkPage { items, next })
}

/// Decode one page of `GET /rest/orgs/{id}/targets`.
pub fn decode_targets_page(body: &str) -> Result<LinkPage<ApiTarget>, RefreshError> {
    let page: JsonApiPage<Resource<TargetAttributes, TargetRelationships>> =
        serde_json::from_str(body).map_err(|e| decode_err("targets", e))?;
    let next = page.next_link();

    let items = page
        .data
        .into_iter()
        .map(|r| {
            let attrs = r.attributes.unwrap_or_default();
            let integration = r
                .relationships
                .and_then(|rel| rel.integration)
                .and_then(|i| i.data);
            let (integration_id, integration_type) = match integration {
                Some(data) => (
                    data.id.unwrap_or_default(),
                    data.attributes
                        .and_then(|a| a.integration_type)
                        .unwrap_or_default(),
                ),
                None => (String::new(), String::new()),
            };

            ApiTarget {
                id: r.id,
                display_name: attrs.display_name.unwrap_or_default(),
                integration_id,
                integration_type,
                created_at: attrs.created_at.unwrap_or_default(),
            }
        })
        .collect();

    Ok(LinkPage { items, next })
}
