use std::collections::{BTreeMap, BTreeSet};

use crate::config::{NavigationConfig, PathMatch, RouteRule};
use crate::models::{Profile, Role};

/// The console's route tree as role rules, plus the role landing routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    landing: BTreeMap<Role, String>,
    unauthorized_route: String,
    home_route: String,
}

impl RouteTable {
    pub fn new(config: &NavigationConfig) -> Self {
        RouteTable {
            rules: config.routes.clone(),
            landing: config.landing.clone(),
            unauthorized_route: config.unauthorized_route.clone(),
            home_route: config.home_route.clone(),
        }
    }

    pub fn unauthorized_route(&self) -> &str {
        &self.unauthorized_route
    }

    pub fn home_route(&self) -> &str {
        &self.home_route
    }

    /// Landing route after sign-in. `None` means stay where you are.
    pub fn landing_for(&self, role: Option<Role>) -> Option<&str> {
        role.and_then(|r| self.landing.get(&r)).map(String::as_str)
    }

    /// The roles allowed on `path`: the intersection of every rule covering
    /// it. `None` when no rule covers the path (public route).
    pub fn required_roles(&self, path: &str) -> Option<BTreeSet<Role>> {
        let path = normalize(path);
        self.rules
            .iter()
            .filter(|rule| covers(rule, path))
            .fold(None, |acc: Option<BTreeSet<Role>>, rule| match acc {
                None => Some(rule.roles.clone()),
                Some(acc) => Some(acc.intersection(&rule.roles).copied().collect()),
            })
    }

    pub fn is_permitted(&self, path: &str, profile: Option<&Profile>) -> bool {
        match self.required_roles(path) {
            None => true,
            Some(required) => profile.is_some_and(|p| p.has_role_in(&required)),
        }
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

fn covers(rule: &RouteRule, path: &str) -> bool {
    let rule_path = normalize(&rule.path);
    match rule.path_match {
        PathMatch::Exact => rule_path == path,
        PathMatch::Prefix => {
            rule_path == "/"
                || path == rule_path
                || path
                    .strip_prefix(rule_path)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
    }
}
