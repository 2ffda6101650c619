//! Role guards over console routes.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::{Profile, Role};
use crate::routes::{Navigator, RouteTable};
use crate::session::{SessionContext, SessionSnapshot};

/// The outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("session context is gone")]
    SessionClosed,
}

/// Gates a subtree on the session profile's role.
///
/// The guard follows the session: every profile change is re-evaluated, so a
/// role downgrade revokes access while the guard stays mounted. Entering the
/// denied state redirects once to the unauthorized route; staying denied does
/// not redirect again.
pub struct RouteGuard {
    required: BTreeSet<Role>,
    session: watch::Receiver<SessionSnapshot>,
    navigator: Arc<dyn Navigator>,
    unauthorized_route: String,
    last: Option<Access>,
}

impl RouteGuard {
    pub fn new(
        required: impl IntoIterator<Item = Role>,
        session: &SessionContext,
        navigator: Arc<dyn Navigator>,
        unauthorized_route: impl Into<String>,
    ) -> Self {
        RouteGuard {
            required: required.into_iter().collect(),
            session: session.subscribe(),
            navigator,
            unauthorized_route: unauthorized_route.into(),
            last: None,
        }
    }

    /// A guard for `path` as described by the route table, or `None` when
    /// the path is public.
    pub fn for_path(
        table: &RouteTable,
        path: &str,
        session: &SessionContext,
        navigator: Arc<dyn Navigator>,
    ) -> Option<Self> {
        let required = table.required_roles(path)?;
        Some(RouteGuard::new(
            required,
            session,
            navigator,
            table.unauthorized_route(),
        ))
    }

    pub fn required_roles(&self) -> &BTreeSet<Role> {
        &self.required
    }

    /// Evaluates the current profile.
    pub fn check(&mut self) -> Access {
        self.evaluate().0
    }

    /// Renders `subtree` with the authorized profile, or nothing.
    pub fn render<T>(&mut self, subtree: impl FnOnce(&Profile) -> T) -> Option<T> {
        match self.evaluate() {
            (Access::Granted, Some(profile)) => Some(subtree(&profile)),
            _ => None,
        }
    }

    pub fn set_required_roles(&mut self, roles: impl IntoIterator<Item = Role>) -> Access {
        self.required = roles.into_iter().collect();
        self.check()
    }

    /// Waits for the next session change and re-evaluates.
    pub async fn changed(&mut self) -> Result<Access, GuardError> {
        self.session
            .changed()
            .await
            .map_err(|_| GuardError::SessionClosed)?;
        Ok(self.check())
    }

    fn evaluate(&mut self) -> (Access, Option<Profile>) {
        let profile = self.session.borrow_and_update().profile.clone();
        let access = match &profile {
            Some(p) if p.has_role_in(&self.required) => Access::Granted,
            _ => Access::Denied,
        };

        if access == Access::Denied && self.last != Some(Access::Denied) {
            info!(
                event_name = "guard.redirect",
                event_domain = "guard",
                role = profile.as_ref().and_then(Profile::role).map(|r| r.as_str()).unwrap_or(""),
                required = ?self.required,
                "access denied, redirecting to {}",
                self.unauthorized_route
            );
            self.navigator.navigate(&self.unauthorized_route, true);
        } else {
            debug!(?access, "guard evaluated");
        }
        self.last = Some(access);
        (access, profile)
    }
}
