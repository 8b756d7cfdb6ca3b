//! Naming and selector authority
//!
//! Every resource name, label set and selector map is derived here from the
//! descriptor identity. Renderers never format names themselves, so a
//! Service and the workload it fronts always agree on the `app` selector.

use std::collections::BTreeMap;

use super::release::{Identity, Strategy};

pub const APP_LABEL: &str = "app";
pub const ROLE_LABEL: &str = "role";
pub const ENV_LABEL: &str = "env";
pub const TYPE_LABEL: &str = "type";

/// A role qualifying the base workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Blue-green live revision
    Active,
    /// Blue-green candidate revision
    Preview,
    /// Canary baseline subset
    Stable,
    /// Canary candidate subset
    Canary,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Preview => "preview",
            Self::Stable => "stable",
            Self::Canary => "canary",
        }
    }
}

/// How config bundles are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigScope {
    /// `{app}-{group}-{environment}`
    #[default]
    PerGroup,
    /// `{app}`: the source has one config root with no group or environment split
    Unscoped,
}

/// Names and selector derived for one (identity, role) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub base: String,
    pub qualified: String,
    pub selector: BTreeMap<String, String>,
}

/// Derives names and labels for one release
#[derive(Debug, Clone, Copy)]
pub struct Naming<'a> {
    identity: &'a Identity,
    strategy: Strategy,
}

impl<'a> Naming<'a> {
    pub fn new(identity: &'a Identity, strategy: Strategy) -> Self {
        Self { identity, strategy }
    }

    pub fn base_name(&self) -> &'a str {
        &self.identity.name
    }

    pub fn namespace(&self) -> Option<String> {
        if self.identity.namespace.is_empty() {
            None
        } else {
            Some(self.identity.namespace.clone())
        }
    }

    /// Base name, role-qualified name and selector for a role
    pub fn resolve(&self, role: Option<Role>) -> ResourceNames {
        ResourceNames {
            base: self.base_name().to_string(),
            qualified: self.qualified_name(role),
            selector: self.selector(role),
        }
    }

    /// `{base}-{role}`, or the base name when no role is given
    pub fn qualified_name(&self, role: Option<Role>) -> String {
        match role {
            Some(role) => format!("{}-{}", self.base_name(), role.as_str()),
            None => self.base_name().to_string(),
        }
    }

    /// `{"app": name}` plus `{"role": role}` when a role is present
    pub fn selector(&self, role: Option<Role>) -> BTreeMap<String, String> {
        let mut selector = BTreeMap::new();
        selector.insert(APP_LABEL.to_string(), self.base_name().to_string());
        if let Some(role) = role {
            selector.insert(ROLE_LABEL.to_string(), role.as_str().to_string());
        }
        selector
    }

    /// Labels stamped on ConfigMaps, routing resources and rollouts
    pub fn resource_labels(&self, environment: &str) -> BTreeMap<String, String> {
        let mut labels = self.selector(None);
        if !environment.is_empty() {
            labels.insert(ENV_LABEL.to_string(), environment.to_string());
        }
        labels
    }

    /// Labels carried by every pod of the release
    pub fn pod_labels(&self, environment: &str) -> BTreeMap<String, String> {
        let mut labels = self.resource_labels(environment);
        labels.insert(TYPE_LABEL.to_string(), self.strategy.as_str().to_string());
        labels
    }

    pub fn config_bundle_name(&self, group: &str, environment: &str, scope: ConfigScope) -> String {
        match scope {
            ConfigScope::PerGroup => format!("{}-{}-{}", self.base_name(), group, environment),
            ConfigScope::Unscoped => self.base_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            name: "orders".to_string(),
            namespace: "shop".to_string(),
        }
    }

    #[test]
    fn test_selector_without_role() {
        let identity = identity();
        let naming = Naming::new(&identity, Strategy::Normal);
        let names = naming.resolve(None);

        assert_eq!(names.base, "orders");
        assert_eq!(names.qualified, "orders");
        assert_eq!(names.selector.len(), 1);
        assert_eq!(names.selector.get("app").unwrap(), "orders");
    }

    #[test]
    fn test_role_is_suffix_and_label() {
        let identity = identity();
        let naming = Naming::new(&identity, Strategy::BlueGreen);
        let names = naming.resolve(Some(Role::Preview));

        assert_eq!(names.base, "orders");
        assert_eq!(names.qualified, "orders-preview");
        assert_eq!(names.selector.get("app").unwrap(), "orders");
        assert_eq!(names.selector.get("role").unwrap(), "preview");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let identity = identity();
        let naming = Naming::new(&identity, Strategy::Canary);
        for role in [None, Some(Role::Stable), Some(Role::Canary)] {
            assert_eq!(naming.resolve(role), naming.resolve(role));
        }
    }

    #[test]
    fn test_pod_labels_carry_type_and_env() {
        let identity = identity();
        let labels = Naming::new(&identity, Strategy::BlueGreen).pod_labels("prod");

        assert_eq!(labels.get("app").unwrap(), "orders");
        assert_eq!(labels.get("env").unwrap(), "prod");
        assert_eq!(labels.get("type").unwrap(), "blue-green");
        assert!(!labels.contains_key("role"));
    }

    #[test]
    fn test_config_bundle_names() {
        let identity = identity();
        let naming = Naming::new(&identity, Strategy::Normal);

        assert_eq!(
            naming.config_bundle_name("db", "prod", ConfigScope::PerGroup),
            "orders-db-prod"
        );
        assert_eq!(
            naming.config_bundle_name("db", "prod", ConfigScope::Unscoped),
            "orders"
        );
    }

    #[test]
    fn test_empty_namespace_is_omitted() {
        let identity = Identity {
            name: "orders".to_string(),
            namespace: String::new(),
        };
        assert!(Naming::new(&identity, Strategy::Normal).namespace().is_none());
    }
}
