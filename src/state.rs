//! Shared console state.
//!
//! Everything the console's views need, built once at startup and handed
//! around by cheap clone.

use std::sync::Arc;

use crate::api::{RolesApi, StatsApi, UsersApi};
use crate::client::ApiClient;
use crate::config::ConfigV1;
use crate::guard::RouteGuard;
use crate::preferences::Preferences;
use crate::routes::{Navigator, RouteTable};
use crate::session::SessionContext;
use crate::sign_in::SignInFlow;
use crate::store::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigV1>,
    pub storage: Arc<dyn Storage>,
    /// The one session every component reads from.
    pub session: Arc<SessionContext>,
    pub client: Arc<ApiClient>,
    pub routes: Arc<RouteTable>,
    pub navigator: Arc<dyn Navigator>,
    pub sign_in: Arc<SignInFlow>,
    pub preferences: Arc<Preferences>,
    pub users: Arc<UsersApi>,
    pub roles: Arc<RolesApi>,
    pub stats: Arc<StatsApi>,
}

impl AppState {
    /// A guard for `path`, or `None` when the route is public.
    pub fn guard(&self, path: &str) -> Option<RouteGuard> {
        RouteGuard::for_path(&self.routes, path, &self.session, self.navigator.clone())
    }

    /// Whether the current profile may open `path`.
    pub fn can_visit(&self, path: &str) -> bool {
        self.routes
            .is_permitted(path, self.session.profile().as_ref())
    }
}
