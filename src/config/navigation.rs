use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Navigation targets and the role rules that gate each console route.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct NavigationConfig {
    #[serde(default = "default_unauthorized_route")]
    pub unauthorized_route: String,
    /// Where an explicit sign-out sends the user.
    #[serde(default = "default_home_route")]
    pub home_route: String,
    /// Landing route per role after a successful sign-in. Roles missing from
    /// this map stay on the current page.
    #[serde(default = "default_landing")]
    pub landing: BTreeMap<Role, String>,
    #[serde(default = "default_route_rules")]
    pub routes: Vec<RouteRule>,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            unauthorized_route: default_unauthorized_route(),
            home_route: default_home_route(),
            landing: default_landing(),
            routes: default_route_rules(),
        }
    }
}

/// How a rule's path is compared to a requested path.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PathMatch {
    #[default]
    Exact,
    /// The path itself and everything below it, on segment boundaries.
    Prefix,
}

/// A role requirement attached to a route or a subtree of routes.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct RouteRule {
    pub path: String,
    #[serde(rename = "match", default)]
    pub path_match: PathMatch,
    pub roles: BTreeSet<Role>,
}

impl RouteRule {
    pub fn exact(path: &str, roles: &[Role]) -> Self {
        RouteRule {
            path: path.to_string(),
            path_match: PathMatch::Exact,
            roles: roles.iter().copied().collect(),
        }
    }

    pub fn prefix(path: &str, roles: &[Role]) -> Self {
        RouteRule {
            path: path.to_string(),
            path_match: PathMatch::Prefix,
            roles: roles.iter().copied().collect(),
        }
    }
}

fn default_unauthorized_route() -> String {
    "/unauthorized".to_string()
}

fn default_home_route() -> String {
    "/".to_string()
}

fn default_landing() -> BTreeMap<Role, String> {
    BTreeMap::from([
        (Role::Admin, "/admin".to_string()),
        (Role::User, "/users".to_string()),
        (Role::Manager, "/manager".to_string()),
    ])
}

fn default_route_rules() -> Vec<RouteRule> {
    vec![
        RouteRule::exact("/users", &[Role::User]),
        // dashboard layout shared by the admin and manager areas
        RouteRule::prefix("/admin", &[Role::Admin, Role::Manager]),
        RouteRule::prefix("/manager", &[Role::Admin, Role::Manager]),
        RouteRule::exact("/admin", &[Role::Admin]),
        RouteRule::exact("/admin/manage-users", &[Role::Admin]),
        RouteRule::exact("/admin/manage-roles", &[Role::Admin]),
        RouteRule::exact("/admin/api-testing", &[Role::Admin]),
        RouteRule::exact("/manager", &[Role::Manager]),
    ]
}
