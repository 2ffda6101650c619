#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use figment::{
    providers::{Format, Yaml},
    Figment,
};
use gatekeep::config::{Config, ConfigV1};
use gatekeep::routes::History;
use gatekeep::startup::bootstrap;
use gatekeep::state::AppState;
use serde_json::json;

/// Test config pointing at `base_url`. With `storage_path` the session is
/// kept in a file there, otherwise in memory.
pub fn load_test_config(base_url: &str, storage_path: Option<&Path>) -> ConfigV1 {
    let storage = match storage_path {
        Some(path) => format!(
            "storage:\n  enabled: true\n  type: file\n  path: \"{}\"\n",
            path.display()
        ),
        None => "storage:\n  enabled: false\n".to_string(),
    };
    let yaml = format!(
        r#"
version: "1.0.0"
api:
  base_url: "{}"
  timeout_in_ms: 3000
{}
logging:
  level: "debug"
  format: "json"
"#,
        base_url, storage
    );

    let config: Config = Figment::new()
        .merge(Yaml::string(&yaml))
        .extract()
        .expect("Failed to parse test config YAML");

    match config {
        Config::ConfigV1(cfg) => cfg,
    }
}

pub fn build_state(config: ConfigV1, start_at: &str) -> (AppState, Arc<History>) {
    let history = Arc::new(History::new(start_at));
    let state = bootstrap(Arc::new(config), history.clone()).expect("bootstrap should succeed");
    (state, history)
}

pub fn auth_body(token: &str, username: &str, role: &str) -> String {
    json!({
        "accessToken": token,
        "user": {
            "_id": format!("id-{}", username),
            "username": username,
            "email": format!("{}@example.com", username),
            "isActive": true,
            "role": {"_id": format!("role-{}", role), "name": role, "permissions": ["read"], "isActive": true},
            "createdAt": "2024-01-01T00:00:00Z"
        }
    })
    .to_string()
}
