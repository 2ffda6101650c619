use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, ApiError, ApiRequest};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoleCount {
    /// Role name.
    #[serde(rename = "_id")]
    pub role: String,
    pub count: u64,
}

/// Account and role totals for the admin dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: u64,
    pub active_users: u64,
    pub inactive_users: u64,
    #[serde(default)]
    pub role_user_counts: Vec<RoleCount>,
    pub total_roles: u64,
    pub active_roles: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
}

impl ExportFormat {
    fn path(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "/admin/getusercsv",
            ExportFormat::Excel => "/admin/getuserexcel",
        }
    }

    /// Suggested file name for a download.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "users.csv",
            ExportFormat::Excel => "users.xlsx",
        }
    }
}

pub struct StatsApi {
    client: Arc<ApiClient>,
}

impl StatsApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        StatsApi { client }
    }

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        self.client.get("/admin/stats").await
    }

    /// The user export, as the raw bytes the server sent.
    pub async fn export_users(&self, format: ExportFormat) -> Result<Vec<u8>, ApiError> {
        let response = self.client.execute(ApiRequest::get(format.path())).await?;
        Ok(response.into_bytes())
    }
}
