use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{ApiClient, ApiError, ApiRequest};
use crate::models::Permission;

/// A role as managed by administrators. Names are free-form here: the
/// server may hold roles the console cannot route for.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRecord {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body for creating or updating a role.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleDraft {
    pub name: String,
    pub permissions: BTreeSet<Permission>,
    pub is_active: bool,
}

pub struct RolesApi {
    client: Arc<ApiClient>,
}

impl RolesApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        RolesApi { client }
    }

    pub async fn list(&self) -> Result<Vec<RoleRecord>, ApiError> {
        self.client.get("/admin/role").await
    }

    pub async fn create(&self, draft: &RoleDraft) -> Result<(), ApiError> {
        self.client
            .execute(ApiRequest::post("/admin/role").with_json(draft)?)
            .await?;
        info!(role = draft.name.as_str(), "role created");
        Ok(())
    }

    pub async fn update(&self, id: &str, draft: &RoleDraft) -> Result<(), ApiError> {
        self.client
            .execute(ApiRequest::put(format!("/admin/role/{}", id)).with_json(draft)?)
            .await?;
        info!(role_id = id, "role updated");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/admin/role/{}", id)).await?;
        info!(role_id = id, "role deleted");
        Ok(())
    }
}
