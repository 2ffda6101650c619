use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LoggingConfig;
use super::navigation::NavigationConfig;
use super::store::StorageConfig;

/// Errors raised while loading configuration or applying it at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid logging configuration: {0}")]
    Logging(String),
    #[error("invalid api configuration: {0}")]
    Api(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the remote REST API lives and which endpoints handle credentials.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_sign_in_path")]
    pub sign_in_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

fn default_sign_in_path() -> String {
    "/auth".to_string()
}

fn default_refresh_path() -> String {
    "/auth/refresh".to_string()
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiConfig {
            base_url: base_url.into(),
            sign_in_path: default_sign_in_path(),
            refresh_path: default_refresh_path(),
            timeout_in_ms: default_timeout_in_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Api(format!(
                "base_url '{}' must be an http(s) URL",
                self.base_url
            )));
        }
        if self.sign_in_path == self.refresh_path {
            return Err(ConfigError::Api(
                "sign_in_path and refresh_path must differ".to_string(),
            ));
        }
        if self.timeout_in_ms == 0 {
            return Err(ConfigError::Api("timeout_in_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Load config from a YAML file. Values can be overridden with
/// `GATEKEEP_`-prefixed environment variables, using `__` for nesting
/// (e.g. `GATEKEEP_API__BASE_URL`).
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, ConfigError> {
    let figment = Figment::new()
        .merge(Yaml::file(path.as_ref()))
        .merge(Env::prefixed("GATEKEEP_").split("__"));
    let config = match figment.extract::<Config>()? {
        Config::ConfigV1(c) => c,
    };
    config.api.validate()?;
    Ok(config)
}

/// Render the JSON schema of the configuration.
pub fn config_schema() -> Result<String, serde_json::Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::models::Role;

    fn parse(yaml: &str) -> ConfigV1 {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml))
            .extract()
            .expect("config should parse");
        match config {
            Config::ConfigV1(c) => c,
        }
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(
            r#"
version: "1.0.0"
api:
  base_url: "http://localhost:3000/api"
logging:
  level: "info"
  format: "console"
"#,
        );
        assert_eq!(config.api.sign_in_path, "/auth");
        assert_eq!(config.api.refresh_path, "/auth/refresh");
        assert!(!config.storage.enabled);
        assert_eq!(config.navigation.unauthorized_route, "/unauthorized");
        assert_eq!(
            config.navigation.landing.get(&Role::Admin).map(String::as_str),
            Some("/admin")
        );
    }

    #[test]
    fn test_file_storage_backend() {
        let config = parse(
            r#"
version: "1.0.0"
api:
  base_url: "http://localhost:3000/api"
  timeout_in_ms: 2500
storage:
  enabled: true
  type: file
  path: "/tmp/gatekeep-session.json"
logging:
  level: "debug"
  format: "json"
"#,
        );
        assert_eq!(config.api.timeout_in_ms, 2500);
        assert!(config.storage.enabled);
        assert!(config.storage.backend.is_some());
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let result: Result<Config, _> = Figment::new()
            .merge(Yaml::string("version: \"9.9.9\"\n"))
            .extract();
        assert!(result.is_err());
    }

    #[test]
    fn test_api_validation() {
        assert!(ApiConfig::new("http://localhost:3000/api").validate().is_ok());
        assert!(matches!(
            ApiConfig::new("localhost:3000").validate(),
            Err(ConfigError::Api(_))
        ));
        let mut same_paths = ApiConfig::new("https://api.example.com");
        same_paths.refresh_path = same_paths.sign_in_path.clone();
        assert!(same_paths.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatekeep.yaml");
        std::fs::write(
            &path,
            "version: \"1.0.0\"\napi:\n  base_url: \"https://api.example.com\"\n",
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_schema_renders() {
        let schema = config_schema().unwrap();
        assert!(schema.contains("base_url"));
    }
}
