use std::sync::Mutex;

use tracing::debug;

/// Moves the user between console routes. Guards and the sign-in flow only
/// ever talk to this port, never to a concrete router.
pub trait Navigator: Send + Sync {
    /// Go to `route`. With `replace`, the current history entry is replaced
    /// instead of pushing a new one.
    fn navigate(&self, route: &str, replace: bool);
    fn current(&self) -> String;
}

/// An in-memory navigation history.
pub struct History {
    entries: Mutex<Vec<String>>,
}

impl History {
    pub fn new(initial: impl Into<String>) -> Self {
        History {
            entries: Mutex::new(vec![initial.into()]),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for History {
    fn default() -> Self {
        History::new("/")
    }
}

impl Navigator for History {
    fn navigate(&self, route: &str, replace: bool) {
        debug!("Navigating to '{}' (replace={})", route, replace);
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        if replace {
            entries.pop();
        }
        entries.push(route.to_string());
    }

    fn current(&self) -> String {
        self.entries().last().cloned().unwrap_or_else(|| "/".to_string())
    }
}
