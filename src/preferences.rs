//! Per-client UI preferences kept next to the session in durable storage.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::{Storage, StorageError, THEME_KEY};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
    /// Follow the host's color scheme.
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Theme> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            "system" => Some(Theme::System),
            _ => None,
        }
    }

    /// The concrete theme to apply, given whether the host prefers dark.
    pub fn resolve(&self, host_prefers_dark: bool) -> Theme {
        match self {
            Theme::System if host_prefers_dark => Theme::Dark,
            Theme::System => Theme::Light,
            other => *other,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Preferences {
    storage: Arc<dyn Storage>,
}

impl Preferences {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Preferences { storage }
    }

    /// The stored theme. Missing, unknown or unreadable values read as
    /// [`Theme::System`].
    pub fn theme(&self) -> Theme {
        match self.storage.load(THEME_KEY) {
            Ok(Some(raw)) => Theme::parse(raw.trim()).unwrap_or_else(|| {
                debug!(value = raw.as_str(), "ignoring unknown theme preference");
                Theme::System
            }),
            Ok(None) => Theme::System,
            Err(e) => {
                warn!("Could not read theme preference: {}", e);
                Theme::System
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.storage.save(THEME_KEY, theme.as_str())
    }
}
