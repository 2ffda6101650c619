use std::collections::BTreeSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// The fixed set of roles a console principal can hold.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Manager,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::User, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Manager => "manager",
        }
    }

    /// Parses a role name as sent by the API. Unknown or empty names yield `None`.
    pub fn parse(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permission string attached to a role. Strings the console does not know
/// about are kept verbatim so a profile round-trips through storage unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
    Other(String),
}

impl Permission {
    pub fn as_str(&self) -> &str {
        match self {
            Permission::Create => "create",
            Permission::Read => "read",
            Permission::Update => "update",
            Permission::Delete => "delete",
            Permission::Other(s) => s,
        }
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        match value {
            "create" => Permission::Create,
            "read" => Permission::Read,
            "update" => Permission::Update,
            "delete" => Permission::Delete,
            other => Permission::Other(other.to_string()),
        }
    }
}

impl Serialize for Permission {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Permission::from(raw.as_str()))
    }
}

/// Role snapshot embedded in a profile. The authoritative copy lives server-side.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleAndPermissions {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `None` when the API sent an empty or unknown role name.
    #[serde(default, deserialize_with = "lenient_role", serialize_with = "role_name")]
    pub name: Option<Role>,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
    #[serde(default)]
    pub is_active: bool,
}

fn lenient_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Role>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Role::parse))
}

fn role_name<S: serde::Serializer>(role: &Option<Role>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(role.map(|r| r.as_str()).unwrap_or_default())
}

/// The authenticated principal as returned by `POST /auth`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub role: RoleAndPermissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Profile {
    pub fn role(&self) -> Option<Role> {
        self.role.name
    }

    pub fn has_role_in<'a>(&self, roles: impl IntoIterator<Item = &'a Role>) -> bool {
        match self.role.name {
            Some(own) => roles.into_iter().any(|r| *r == own),
            None => false,
        }
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.role.permissions.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_from_api_payload() {
        let payload = json!({
            "_id": "64f0",
            "username": "alice",
            "email": "alice@example.com",
            "isActive": true,
            "role": {
                "_id": "r1",
                "name": "admin",
                "permissions": ["read", "create", "audit"],
                "isActive": true
            },
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let profile: Profile = serde_json::from_value(payload).unwrap();
        assert_eq!(profile.id.as_deref(), Some("64f0"));
        assert_eq!(profile.role(), Some(Role::Admin));
        assert!(profile.has_permission(&Permission::Read));
        assert!(profile.has_permission(&Permission::Other("audit".to_string())));
        assert!(!profile.has_permission(&Permission::Delete));
    }

    #[test]
    fn test_unknown_or_empty_role_is_no_role() {
        let empty: Profile = serde_json::from_value(json!({"role": {"name": ""}})).unwrap();
        assert_eq!(empty.role(), None);
        let unknown: Profile = serde_json::from_value(json!({"role": {"name": "auditor"}})).unwrap();
        assert_eq!(unknown.role(), None);
        assert!(!unknown.has_role_in(&Role::ALL));
    }

    #[test]
    fn test_default_profile_matches_no_role() {
        let profile = Profile::default();
        assert!(!profile.has_role_in(&[Role::Admin, Role::User, Role::Manager]));
    }

    #[test]
    fn test_profile_serializes_in_api_shape() {
        let mut profile = Profile {
            username: "bob".to_string(),
            ..Default::default()
        };
        profile.role.name = Some(Role::Manager);
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["role"]["name"], "manager");
        assert_eq!(value["isActive"], false);
        assert!(value.get("_id").is_none());
    }
}
