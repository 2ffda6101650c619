use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::models::SessionToken;
use crate::store::{Storage, StorageError, TOKEN_KEY};

/// Holds the current session token and mirrors it to durable storage.
///
/// The HTTP client reads the token from here on every request. Each change
/// bumps an epoch so callers can tell whether the token moved on since they
/// last looked.
pub struct TokenStore {
    storage: Arc<dyn Storage>,
    /// `None` until the slot is first read from storage or set. Once
    /// populated, memory is authoritative even if persisting failed.
    current: RwLock<Option<Option<SessionToken>>>,
    epoch: AtomicU64,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        TokenStore {
            storage,
            current: RwLock::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Installs or clears the token. Memory is always updated; the storage
    /// error, if any, is returned after the fact.
    pub fn set(&self, token: Option<SessionToken>) -> Result<(), StorageError> {
        let persisted = match &token {
            Some(t) => self.storage.save(TOKEN_KEY, t.as_str()),
            None => self.storage.remove(TOKEN_KEY),
        };
        debug!(has_token = token.is_some(), "Updating session token");
        match self.current.write() {
            Ok(mut slot) => *slot = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        persisted
    }

    /// The in-memory token. The durable copy is read only once, when
    /// nothing has been set yet (e.g. right after a restart).
    pub fn get(&self) -> Option<SessionToken> {
        let cached = match self.current.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        if let Some(token) = cached {
            return token;
        }

        let stored = match self.storage.load(TOKEN_KEY) {
            Ok(stored) => stored.filter(|t| !t.is_empty()).map(SessionToken::new),
            Err(e) => {
                warn!("Could not read session token from storage: {}", e);
                None
            }
        };
        let mut slot = match self.current.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        // a concurrent set wins over the rehydrated value
        slot.get_or_insert(stored).clone()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}
