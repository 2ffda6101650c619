use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::ApiError;
use super::request::{ApiRequest, ApiResponse};
use crate::config::ApiConfig;
use crate::models::{RefreshResponse, SessionToken};
use crate::session::SessionContext;

/// The single point of egress to the remote API.
///
/// Every request carries the current bearer token. A 401 on a refreshable
/// request triggers one refresh through the cookie-authenticated refresh
/// endpoint and one replay of the request; a second 401 is returned as is.
/// Refreshes are serialized, so parallel 401s share the first refresh.
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: Arc<SessionContext>,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(Duration::from_millis(config.timeout_in_ms))
            .build()
            .map_err(|e| ApiError::Request(format!("could not build HTTP client: {}", e)))?;

        info!("Creating API client for {}", config.base_url);
        Ok(ApiClient {
            http,
            config: config.clone(),
            session,
            refresh_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends `request`, recovering once from an authentication failure.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let observed_epoch = self.session.tokens().epoch();
        let token = self.session.token();
        let response = self.dispatch(&request, token.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED
            || !request.is_refreshable()
            || request.is_retried()
        {
            return response.error_for_status();
        }

        request.mark_retried();
        let original = response.rejection();
        debug!(
            method = %request.method,
            path = %request.path,
            "received 401, attempting token refresh"
        );

        match self.recover_token(observed_epoch).await {
            Some(fresh) => {
                let replayed = self.dispatch(&request, Some(&fresh)).await?;
                if replayed.status() == StatusCode::UNAUTHORIZED {
                    warn!(
                        path = %request.path,
                        "replayed request was rejected again; not retrying"
                    );
                }
                replayed.error_for_status()
            }
            None => Err(ApiError::SessionExpired(original)),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::get(path)).await?.json()
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::post(path).with_json(body)?)
            .await?
            .json()
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(ApiRequest::put(path).with_json(body)?)
            .await?
            .json()
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.execute(ApiRequest::delete(path)).await
    }

    /// Waits for any refresh in flight. If the token changed since the
    /// failed request was sent, that outcome is reused; otherwise this
    /// caller performs the refresh. `None` means the session is gone.
    async fn recover_token(&self, observed_epoch: u64) -> Option<SessionToken> {
        let _guard = self.refresh_lock.lock().await;

        if self.session.tokens().epoch() != observed_epoch {
            let current = self.session.token();
            debug!(
                reused = current.is_some(),
                "token changed while the request was in flight; skipping refresh"
            );
            return current;
        }

        match self.refresh().await {
            Ok(token) => {
                info!(
                    event_name = "client.refresh.success",
                    event_domain = "client",
                    "session token refreshed"
                );
                self.session.replace_token(token.clone());
                Some(token)
            }
            Err(e) => {
                warn!(
                    event_name = "client.refresh.failure",
                    event_domain = "client",
                    "token refresh failed, signing out: {}",
                    e
                );
                self.session.sign_out();
                None
            }
        }
    }

    async fn refresh(&self) -> Result<SessionToken, ApiError> {
        let request = ApiRequest::post(self.config.refresh_path.as_str()).without_refresh();
        let token = self.session.token();
        let response = self
            .dispatch(&request, token.as_ref())
            .await?
            .error_for_status()?;
        let body: RefreshResponse = response.json()?;
        body.access_token
            .filter(|t| !t.as_str().is_empty())
            .ok_or_else(|| ApiError::Decode("refresh response carried no access token".to_string()))
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&SessionToken>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(&request.path);
        let mut builder = self.http.request(request.method.clone(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, token.bearer());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            retried = request.is_retried(),
            authenticated = token.is_some(),
            "sending API request"
        );
        let response = builder.send().await.map_err(|source| ApiError::Network {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ApiError::Network { url, source })?;
        debug!(status = status.as_u16(), path = %request.path, "received API response");
        Ok(ApiResponse::new(status, body.to_vec()))
    }
}
