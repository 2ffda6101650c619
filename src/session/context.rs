use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::token_store::TokenStore;
use crate::models::{Profile, SessionToken};
use crate::store::{Storage, StorageError, PROFILE_KEY};

/// A point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub token: Option<SessionToken>,
    pub profile: Option<Profile>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.profile.is_some()
    }
}

/// The process-wide session: token, profile and the derived authentication
/// flag, shared by `Arc` with every component that needs it.
///
/// Only the sign-in flow, the HTTP client's token refresh, and sign-out
/// mutate it. Everyone else reads a [`SessionSnapshot`] or subscribes to
/// changes.
pub struct SessionContext {
    storage: Arc<dyn Storage>,
    tokens: TokenStore,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionContext {
    /// Rehydrates the session from durable storage. Missing or corrupt
    /// entries leave the session unauthenticated; this never fails.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let tokens = TokenStore::new(storage.clone());
        let token = tokens.get();
        let profile = match &token {
            Some(_) => load_profile(storage.as_ref()),
            None => {
                // a profile without a token is not a session
                if let Err(e) = storage.remove(PROFILE_KEY) {
                    warn!("Could not discard orphaned profile: {}", e);
                }
                None
            }
        };

        let snapshot = SessionSnapshot { token, profile };
        info!(
            event_name = "session.load",
            event_domain = "session",
            authenticated = snapshot.is_authenticated(),
            durable = storage.is_durable(),
            "session state loaded"
        );
        let (state, _) = watch::channel(snapshot);

        SessionContext {
            storage,
            tokens,
            state,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// A receiver that observes every subsequent session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state.borrow().profile.clone()
    }

    /// The token to attach to outbound requests.
    pub fn token(&self) -> Option<SessionToken> {
        self.tokens.get()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Installs a freshly signed-in session: token first, then the profile,
    /// published to observers as a single change. On a storage failure
    /// nothing stays installed.
    pub(crate) fn establish(
        &self,
        token: SessionToken,
        profile: Profile,
    ) -> Result<(), StorageError> {
        if let Err(e) = self.tokens.set(Some(token.clone())) {
            self.rollback();
            return Err(e);
        }
        let persisted = serde_json::to_string(&profile)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
            .and_then(|serialized| self.storage.save(PROFILE_KEY, &serialized));
        if let Err(e) = persisted {
            self.rollback();
            return Err(e);
        }

        debug!("Session established for '{}'", profile.username);
        self.state.send_modify(|state| {
            state.token = Some(token);
            state.profile = Some(profile);
        });
        Ok(())
    }

    /// Swaps in a refreshed token while keeping the profile.
    pub(crate) fn replace_token(&self, token: SessionToken) {
        if let Err(e) = self.tokens.set(Some(token.clone())) {
            warn!("Refreshed token could not be persisted: {}", e);
        }
        self.state.send_modify(|state| state.token = Some(token));
    }

    /// Clears the profile and then the token, in memory and in storage.
    /// Safe to call when already signed out.
    pub fn sign_out(&self) {
        let was_authenticated = self.is_authenticated();
        self.state.send_modify(|state| {
            state.profile = None;
            state.token = None;
        });
        if let Err(e) = self.storage.remove(PROFILE_KEY) {
            warn!("Could not remove stored profile: {}", e);
        }
        if let Err(e) = self.tokens.set(None) {
            warn!("Could not remove stored token: {}", e);
        }
        if was_authenticated {
            info!(
                event_name = "session.sign_out",
                event_domain = "session",
                "session cleared"
            );
        }
    }

    /// Leaves the session signed out after a failed establish. Memory is
    /// cleared even if storage keeps failing.
    fn rollback(&self) {
        let _ = self.storage.remove(PROFILE_KEY);
        let _ = self.tokens.set(None);
        self.state.send_if_modified(|state| {
            let had_session = state.token.is_some() || state.profile.is_some();
            state.token = None;
            state.profile = None;
            had_session
        });
    }
}

fn load_profile(storage: &dyn Storage) -> Option<Profile> {
    let raw = match storage.load(PROFILE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read stored profile: {}", e);
            return None;
        }
    };
    match serde_json::from_str::<Profile>(&raw) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("Ignoring corrupt stored profile: {}", e);
            None
        }
    }
}
