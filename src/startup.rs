//! Console startup.
//!
//! Builds the shared state in a fixed order: storage, then the session
//! rehydrated from it, then the API client bound to that session, then the
//! route table and the flows on top.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::api::{RolesApi, StatsApi, UsersApi};
use crate::client::{ApiClient, ApiError};
use crate::config::{load_config, ConfigError, ConfigV1};
use crate::preferences::Preferences;
use crate::routes::{Navigator, RouteTable};
use crate::session::SessionContext;
use crate::sign_in::SignInFlow;
use crate::state::AppState;
use crate::store::{create_storage, StorageError};
use crate::utils::init_logging;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not open session storage: {0}")]
    Storage(#[from] StorageError),
    #[error("could not create API client: {0}")]
    Client(#[from] ApiError),
}

/// Builds the console state from an already loaded configuration.
/// Logging is left to the caller.
pub fn bootstrap(
    config: Arc<ConfigV1>,
    navigator: Arc<dyn Navigator>,
) -> Result<AppState, StartupError> {
    config.api.validate()?;

    let storage = create_storage(&config.storage)?;
    let session = Arc::new(SessionContext::load(storage.clone()));
    let client = Arc::new(ApiClient::new(&config.api, session.clone())?);
    let routes = Arc::new(RouteTable::new(&config.navigation));
    let sign_in = Arc::new(SignInFlow::new(
        client.clone(),
        routes.clone(),
        navigator.clone(),
    ));

    info!(
        event_name = "startup.ready",
        event_domain = "startup",
        authenticated = session.is_authenticated(),
        "console state ready"
    );

    Ok(AppState {
        preferences: Arc::new(Preferences::new(storage.clone())),
        users: Arc::new(UsersApi::new(client.clone())),
        roles: Arc::new(RolesApi::new(client.clone())),
        stats: Arc::new(StatsApi::new(client.clone())),
        config,
        storage,
        session,
        client,
        routes,
        navigator,
        sign_in,
    })
}

/// Loads the configuration at `path`, installs logging from it and builds
/// the console state.
pub fn start(
    path: impl AsRef<Path>,
    navigator: Arc<dyn Navigator>,
) -> Result<AppState, StartupError> {
    let config = load_config(path)?;
    init_logging(&config.logging)?;
    bootstrap(Arc::new(config), navigator)
}
