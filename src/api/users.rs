use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::roles::RoleRecord;
use crate::client::{ApiClient, ApiError, ApiRequest};

/// A console account as listed by `GET /users`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: RoleRecord,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            total: 0,
            page: 1,
            limit: 10,
            pages: 1,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPage {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub pagination: Pagination,
}

/// Filters for the user listing. Unset fields are left off the query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl UserQuery {
    fn apply(&self, mut request: ApiRequest) -> ApiRequest {
        if let Some(page) = self.page {
            request = request.with_query("page", page.to_string());
        }
        if let Some(limit) = self.limit {
            request = request.with_query("limit", limit.to_string());
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            request = request.with_query("search", search);
        }
        if let Some(role) = &self.role {
            request = request.with_query("role", role.as_str());
        }
        if let Some(active) = self.is_active {
            request = request.with_query("isActive", active.to_string());
        }
        request
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Role id.
    pub role: String,
    pub is_active: bool,
}

/// A partial update; only set fields are sent.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

pub struct UsersApi {
    client: Arc<ApiClient>,
}

impl UsersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        UsersApi { client }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<UserPage, ApiError> {
        let request = query.apply(ApiRequest::get("/users"));
        self.client.execute(request).await?.json()
    }

    pub async fn create(&self, user: &NewUser) -> Result<(), ApiError> {
        self.client
            .execute(ApiRequest::post("/users").with_json(user)?)
            .await?;
        info!(username = user.username.as_str(), "user created");
        Ok(())
    }

    pub async fn update(&self, id: &str, update: &UserUpdate) -> Result<(), ApiError> {
        self.client
            .execute(ApiRequest::put(format!("/users/{}", id)).with_json(update)?)
            .await?;
        info!(user_id = id, "user updated");
        Ok(())
    }

    /// Deletes `id`. The server records `acting_admin_id` as the deleting
    /// account.
    pub async fn delete(&self, id: &str, acting_admin_id: &str) -> Result<(), ApiError> {
        let request = ApiRequest::delete(format!("/users/{}", id))
            .with_json(&json!({ "loginId": acting_admin_id }))?;
        self.client.execute(request).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::session::SessionContext;
    use crate::store::{MemoryStorage, TOKEN_KEY};
    use mockito::{Matcher, Server};

    fn api(server: &Server) -> UsersApi {
        let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "tok1")]));
        let session = Arc::new(SessionContext::load(storage));
        UsersApi::new(Arc::new(
            ApiClient::new(&ApiConfig::new(server.url()), session).unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/users")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("search".into(), "ali".into()),
                Matcher::UrlEncoded("isActive".into(), "true".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "users": [{
                        "_id": "u1",
                        "username": "alice",
                        "email": "alice@example.com",
                        "role": {"_id": "r1", "name": "admin", "permissions": ["read"], "isActive": true},
                        "isActive": true,
                        "createdAt": "2024-01-01T00:00:00Z"
                    }],
                    "pagination": {"total": 11, "page": 2, "limit": 10, "pages": 2}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let query = UserQuery {
            page: Some(2),
            search: Some("ali".to_string()),
            is_active: Some(true),
            ..Default::default()
        };
        let page = api(&server).list(&query).await.unwrap();
        m.assert_async().await;
        assert_eq!(page.users[0].username, "alice");
        assert_eq!(page.users[0].role.name, "admin");
        assert_eq!(page.pagination.pages, 2);
    }

    #[tokio::test]
    async fn test_missing_pagination_defaults() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users")
            .with_status(200)
            .with_body(r#"{"users": []}"#)
            .create_async()
            .await;

        let page = api(&server).list(&UserQuery::default()).await.unwrap();
        assert!(page.users.is_empty());
        assert_eq!(page.pagination, Pagination::default());
    }

    #[tokio::test]
    async fn test_delete_names_acting_admin() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("DELETE", "/users/u2")
            .match_body(Matcher::Json(json!({"loginId": "u1"})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        api(&server).delete("u2", "u1").await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_partial_update_sends_set_fields() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("PUT", "/users/u2")
            .match_body(Matcher::Json(json!({"isActive": false})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        api(&server).update("u2", &update).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/users")
            .with_status(400)
            .with_body(r#"{"message": "Email already registered"}"#)
            .create_async()
            .await;

        let user = NewUser {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "secret1".to_string(),
            role: "r2".to_string(),
            is_active: true,
        };
        let err = api(&server).create(&user).await.unwrap_err();
        assert_eq!(err.status(), Some(http::StatusCode::BAD_REQUEST));
    }
}
