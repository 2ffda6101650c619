use std::sync::Arc;

use http::StatusCode;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::form::{Credentials, FieldError, SignInForm};
use crate::client::{ApiClient, ApiError, ApiRequest};
use crate::models::{AuthResponse, Profile};
use crate::routes::{Navigator, RouteTable};

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const NO_RESPONSE: &str = "No response from the server. Please check your network connection.";
const UNEXPECTED: &str = "An unexpected error occurred. Please try again.";

/// Where a submission currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInState {
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

#[derive(Debug, Error)]
pub enum SignInError {
    /// Local checks failed; nothing was sent.
    #[error("sign-in form is invalid")]
    Validation(Vec<FieldError>),
    /// The server answered with an error.
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    /// No response was received.
    #[error("{}", NO_RESPONSE)]
    Network,
    #[error("{}", UNEXPECTED)]
    Unexpected(String),
}

impl SignInError {
    /// The message to show the user.
    pub fn user_message(&self) -> String {
        match self {
            SignInError::Validation(errors) => errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.to_string(),
        }
    }
}

impl From<ApiError> for SignInError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Rejected(r) | ApiError::SessionExpired(r) => SignInError::Server {
                status: r.status,
                message: r.server_message.unwrap_or_else(|| LOGIN_FAILED.to_string()),
            },
            ApiError::Network { .. } => SignInError::Network,
            other => SignInError::Unexpected(other.to_string()),
        }
    }
}

/// A completed sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub profile: Profile,
    /// The route navigated to, or `None` when the role has no landing route
    /// and the user stayed on the current page.
    pub landing: Option<String>,
}

/// Runs sign-in submissions: validate locally, exchange credentials, install
/// the session, go to the role's landing route.
pub struct SignInFlow {
    client: Arc<ApiClient>,
    routes: Arc<RouteTable>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SignInState>,
}

impl SignInFlow {
    pub fn new(
        client: Arc<ApiClient>,
        routes: Arc<RouteTable>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SignInState::Idle);
        SignInFlow {
            client,
            routes,
            navigator,
            state,
        }
    }

    pub fn state(&self) -> SignInState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SignInState> {
        self.state.subscribe()
    }

    /// Submits the form. Validation failures never reach the network, and
    /// no failure touches the session.
    pub async fn submit(&self, form: &SignInForm) -> Result<SignedIn, SignInError> {
        self.set_state(SignInState::Validating);
        let credentials = match form.validate() {
            Ok(credentials) => credentials,
            Err(errors) => {
                debug!(errors = errors.len(), "sign-in form failed validation");
                self.set_state(SignInState::Idle);
                return Err(SignInError::Validation(errors));
            }
        };

        self.set_state(SignInState::Submitting);
        match self.exchange(&credentials).await {
            Ok(signed_in) => {
                self.set_state(SignInState::Success);
                Ok(signed_in)
            }
            Err(e) => {
                warn!(
                    event_name = "sign_in.failure",
                    event_domain = "sign_in",
                    "sign-in failed: {:?}",
                    e
                );
                self.set_state(SignInState::Failed);
                Err(e)
            }
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<SignedIn, SignInError> {
        let request = ApiRequest::post(self.client.config().sign_in_path.as_str())
            .with_json(credentials)
            .map_err(|e| SignInError::Unexpected(e.to_string()))?
            .without_refresh();
        let response = self.client.execute(request).await?;
        let AuthResponse { access_token, user } = response
            .json()
            .map_err(|e| SignInError::Unexpected(e.to_string()))?;

        self.client
            .session()
            .establish(access_token, user.clone())
            .map_err(|e| SignInError::Unexpected(e.to_string()))?;

        let landing = self.routes.landing_for(user.role()).map(str::to_string);
        match &landing {
            Some(route) => self.navigator.navigate(route, false),
            None => warn!(
                role = user.role.name.map(|r| r.as_str()).unwrap_or(""),
                "no landing route for role, staying on the current page"
            ),
        }
        info!(
            event_name = "sign_in.success",
            event_domain = "sign_in",
            username = user.username.as_str(),
            "user signed in"
        );

        Ok(SignedIn {
            profile: user,
            landing,
        })
    }

    /// Ends the session and returns to the home route.
    pub fn sign_out(&self) {
        self.client.session().sign_out();
        self.set_state(SignInState::Idle);
        self.navigator.navigate(self.routes.home_route(), true);
        info!(
            event_name = "sign_in.sign_out",
            event_domain = "sign_in",
            "user signed out"
        );
    }

    fn set_state(&self, state: SignInState) {
        self.state.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, NavigationConfig};
    use crate::models::{Role, SessionToken};
    use crate::routes::History;
    use crate::session::SessionContext;
    use crate::store::{MemoryStorage, Storage, PROFILE_KEY, TOKEN_KEY};
    use mockito::{Matcher, Server};
    use serde_json::json;

    struct Harness {
        flow: SignInFlow,
        session: Arc<SessionContext>,
        history: Arc<History>,
        storage: Arc<MemoryStorage>,
    }

    fn harness(base_url: String, navigation: NavigationConfig) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let session = Arc::new(SessionContext::load(storage.clone()));
        let client = Arc::new(ApiClient::new(&ApiConfig::new(base_url), session.clone()).unwrap());
        let history = Arc::new(History::new("/"));
        let flow = SignInFlow::new(
            client,
            Arc::new(RouteTable::new(&navigation)),
            history.clone(),
        );
        Harness {
            flow,
            session,
            history,
            storage,
        }
    }

    fn auth_body(token: &str, role: &str) -> String {
        json!({
            "accessToken": token,
            "user": {
                "_id": "u1",
                "username": "alice",
                "email": "alice@example.com",
                "isActive": true,
                "role": {"name": role, "permissions": ["read"], "isActive": true}
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_successful_sign_in() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth")
            .match_body(Matcher::Json(json!({"username": "alice", "password": "secret1"})))
            .with_status(200)
            .with_body(auth_body("tok1", "admin"))
            .create_async()
            .await;

        let h = harness(server.url(), NavigationConfig::default());
        let signed_in = h
            .flow
            .submit(&SignInForm::username("alice", "secret1"))
            .await
            .unwrap();

        m.assert_async().await;
        assert_eq!(signed_in.landing.as_deref(), Some("/admin"));
        assert_eq!(h.history.current(), "/admin");
        assert_eq!(h.flow.state(), SignInState::Success);
        assert!(h.session.is_authenticated());
        assert_eq!(h.session.token(), Some(SessionToken::new("tok1")));
        assert!(h.storage.load(PROFILE_KEY).unwrap().is_some());
        assert_eq!(h.storage.load(TOKEN_KEY).unwrap().as_deref(), Some("tok1"));
    }

    #[tokio::test]
    async fn test_email_mode_sends_email_only() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/auth")
            .match_body(Matcher::Json(
                json!({"email": "alice@example.com", "password": "secret1"}),
            ))
            .with_status(200)
            .with_body(auth_body("tok1", "manager"))
            .create_async()
            .await;

        let h = harness(server.url(), NavigationConfig::default());
        let signed_in = h
            .flow
            .submit(&SignInForm::email("alice@example.com", "secret1"))
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(signed_in.landing.as_deref(), Some("/manager"));
    }

    #[tokio::test]
    async fn test_short_password_never_hits_network() {
        let mut server = Server::new_async().await;
        let m = server.mock("POST", "/auth").expect(0).create_async().await;

        let h = harness(server.url(), NavigationConfig::default());
        let err = h
            .flow
            .submit(&SignInForm::username("alice", "12345"))
            .await
            .unwrap_err();

        m.assert_async().await;
        match err {
            SignInError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(h.flow.state(), SignInState::Idle);
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_server_error_message_is_surfaced() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(401)
            .with_body(r#"{"message": "Invalid credentials"}"#)
            .create_async()
            .await;
        let refresh = server
            .mock("POST", "/auth/refresh")
            .expect(0)
            .create_async()
            .await;

        let h = harness(server.url(), NavigationConfig::default());
        let err = h
            .flow
            .submit(&SignInForm::username("alice", "wrong-pass"))
            .await
            .unwrap_err();

        refresh.assert_async().await;
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(matches!(
            err,
            SignInError::Server {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        ));
        assert_eq!(h.flow.state(), SignInState::Failed);
        assert!(h.session.snapshot().token.is_none());
        assert!(h.session.snapshot().profile.is_none());
    }

    #[tokio::test]
    async fn test_server_error_without_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(500)
            .create_async()
            .await;

        let h = harness(server.url(), NavigationConfig::default());
        let err = h
            .flow
            .submit(&SignInForm::username("alice", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), LOGIN_FAILED);
    }

    #[tokio::test]
    async fn test_no_response() {
        let h = harness("http://127.0.0.1:1".to_string(), NavigationConfig::default());
        let err = h
            .flow
            .submit(&SignInForm::username("alice", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SignInError::Network));
        assert_eq!(err.user_message(), NO_RESPONSE);
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_unexpected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(200)
            .with_body(r#"{"user": {}}"#)
            .create_async()
            .await;

        let h = harness(server.url(), NavigationConfig::default());
        let err = h
            .flow
            .submit(&SignInForm::username("alice", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SignInError::Unexpected(_)));
        assert_eq!(err.user_message(), UNEXPECTED);
        assert!(!h.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_out_returns_home() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(200)
            .with_body(auth_body("tok1", "user"))
            .create_async()
            .await;

        let h = harness(server.url(), NavigationConfig::default());
        h.flow
            .submit(&SignInForm::username("alice", "secret1"))
            .await
            .unwrap();
        assert_eq!(h.history.current(), "/users");

        h.flow.sign_out();
        assert!(!h.session.is_authenticated());
        assert_eq!(h.flow.state(), SignInState::Idle);
        assert_eq!(h.history.current(), "/");
        assert_eq!(h.storage.load(TOKEN_KEY).unwrap(), None);
        assert_eq!(h.storage.load(PROFILE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_role_without_landing_stays() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(200)
            .with_body(auth_body("tok1", "manager"))
            .create_async()
            .await;

        let mut navigation = NavigationConfig::default();
        navigation.landing.remove(&Role::Manager);
        let h = harness(server.url(), navigation);
        let signed_in = h
            .flow
            .submit(&SignInForm::username("alice", "secret1"))
            .await
            .unwrap();
        assert_eq!(signed_in.landing, None);
        assert_eq!(h.history.entries(), vec!["/"]);
        assert!(h.session.is_authenticated());
    }
}
