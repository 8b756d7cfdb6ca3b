//! Release descriptor types
//!
//! The descriptor is the immutable input of one compilation run. It is
//! deserialized from the release API (JSON) or from a descriptor file in a
//! checked-out repository (YAML); both use the same wire field names.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use crate::error::RenderError;

/// Port name that marks the HTTP routing entry point
pub const HTTP_PORT: &str = "http";
/// Port name that enables scrape annotations
pub const METRICS_PORT: &str = "metrics";

/// Progressive-delivery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Plain rolling update via a Deployment
    Normal,
    /// Weighted traffic shift via an Argo Rollout
    Canary,
    /// Active/preview cutover via an Argo Rollout
    #[serde(alias = "bluegreen")]
    BlueGreen,
}

impl Strategy {
    /// Wire value, also used as the `type` pod label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Canary => "canary",
            Self::BlueGreen => "blue-green",
        }
    }

    pub fn all() -> [Strategy; 3] {
        [Self::Normal, Self::Canary, Self::BlueGreen]
    }
}

/// Whether the release is reachable from outside the cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    #[default]
    Internal,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

/// Container image reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Full repository; empty means `{registry}/{app}`
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub tag: String,
}

impl ImageRef {
    /// Resolve the pullable image string
    pub fn resolve(&self, app: &str, default_registry: &str) -> String {
        let repository = if self.repository.is_empty() {
            format!("{}/{}", default_registry.trim_end_matches('/'), app)
        } else {
            self.repository.clone()
        };

        if self.tag.is_empty() {
            repository
        } else {
            format!("{}:{}", repository, self.tag)
        }
    }
}

/// A declared service port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    pub name: String,
    pub port: i32,
    #[serde(default)]
    pub target_port: i32,
}

impl PortSpec {
    pub fn new(name: impl Into<String>, port: i32, target_port: i32) -> Self {
        Self {
            name: name.into(),
            port,
            target_port,
        }
    }

    /// Container-side port, falling back to the service port
    pub fn container_port(&self) -> i32 {
        if self.target_port > 0 {
            self.target_port
        } else {
            self.port
        }
    }
}

/// A logical config group mounted into the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigGroup {
    pub name: String,
    pub mount_path: String,
    /// Environment key -> content locator (directory in a checkout)
    #[serde(default)]
    pub files_path: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVarSpec {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// One application's release intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDescriptor {
    #[serde(rename = "app", alias = "identity")]
    pub identity: Identity,

    #[serde(rename = "type", alias = "strategy")]
    pub strategy: Strategy,

    #[serde(rename = "internet", alias = "exposure", default)]
    pub exposure: Exposure,

    #[serde(default)]
    pub image: ImageRef,

    #[serde(rename = "replica", alias = "replicaCount", default)]
    pub replica_count: Option<i32>,

    #[serde(rename = "env", alias = "environment", default)]
    pub environment: String,

    #[serde(rename = "service", alias = "ports", default)]
    pub ports: Vec<PortSpec>,

    #[serde(rename = "configs", alias = "configGroups", default)]
    pub config_groups: Vec<ConfigGroup>,

    #[serde(rename = "envs", alias = "perEnvironmentVariables", default)]
    pub variables: BTreeMap<String, Vec<EnvVarSpec>>,
}

fn dns_label() -> &'static Regex {
    static DNS_LABEL: OnceLock<Regex> = OnceLock::new();
    DNS_LABEL.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("static regex is valid")
    })
}

/// RFC 1123 label: lowercase alphanumerics and `-`, at most 63 characters
pub fn is_dns_label(value: &str) -> bool {
    value.len() <= 63 && dns_label().is_match(value)
}

impl ReleaseDescriptor {
    /// Create a descriptor with defaults for everything but identity and strategy
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            identity: Identity {
                name: name.into(),
                namespace: namespace.into(),
            },
            strategy,
            exposure: Exposure::Internal,
            image: ImageRef::default(),
            replica_count: None,
            environment: String::new(),
            ports: Vec::new(),
            config_groups: Vec::new(),
            variables: BTreeMap::new(),
        }
    }

    /// Builder: set exposure
    pub fn with_exposure(mut self, exposure: Exposure) -> Self {
        self.exposure = exposure;
        self
    }

    /// Builder: set environment key
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Builder: set replica count
    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replica_count = Some(replicas);
        self
    }

    /// Builder: set image
    pub fn with_image(mut self, repository: impl Into<String>, tag: impl Into<String>) -> Self {
        self.image = ImageRef {
            repository: repository.into(),
            tag: tag.into(),
        };
        self
    }

    /// Builder: append a port
    pub fn with_port(mut self, port: PortSpec) -> Self {
        self.ports.push(port);
        self
    }

    /// Builder: append a config group
    pub fn with_config_group(mut self, group: ConfigGroup) -> Self {
        self.config_groups.push(group);
        self
    }

    /// Builder: append a variable for an environment
    pub fn with_variable(
        mut self,
        environment: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.variables
            .entry(environment.into())
            .or_default()
            .push(EnvVarSpec {
                name: name.into(),
                value: value.into(),
            });
        self
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Replica count, falling back to the configured default
    pub fn replicas(&self, default: i32) -> i32 {
        self.replica_count.unwrap_or(default)
    }

    pub fn port(&self, name: &str) -> Option<&PortSpec> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// The routing entry point, if declared
    pub fn http_port(&self) -> Option<&PortSpec> {
        self.port(HTTP_PORT)
    }

    pub fn metrics_port(&self) -> Option<&PortSpec> {
        self.port(METRICS_PORT)
    }

    /// Custom variables for the active environment
    pub fn active_variables(&self) -> &[EnvVarSpec] {
        self.variables
            .get(&self.environment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check what the compiler needs to render a consistent bundle
    pub fn validate(&self) -> Result<(), RenderError> {
        let name = self.name();
        if name.is_empty() {
            return Err(RenderError::invalid("application name is empty"));
        }
        if !is_dns_label(name) {
            return Err(RenderError::invalid(format!(
                "application name '{}' is not a DNS-1123 label",
                name
            )));
        }

        if let Some(replicas) = self.replica_count {
            if replicas < 1 {
                return Err(RenderError::invalid(format!(
                    "replica count must be positive, got {}",
                    replicas
                )));
            }
        }

        let mut seen = HashSet::new();
        for port in &self.ports {
            if !seen.insert(port.name.as_str()) {
                return Err(RenderError::invalid(format!(
                    "duplicate port name '{}'",
                    port.name
                )));
            }
            if !(1..=65535).contains(&port.port) || !(0..=65535).contains(&port.target_port) {
                return Err(RenderError::invalid(format!(
                    "port '{}' is out of range",
                    port.name
                )));
            }
        }

        let mut groups = HashSet::new();
        for group in &self.config_groups {
            if !groups.insert(group.name.as_str()) {
                return Err(RenderError::invalid(format!(
                    "duplicate config group name '{}'",
                    group.name
                )));
            }
            if !is_dns_label(&group.name) {
                return Err(RenderError::invalid(format!(
                    "config group name '{}' is not a DNS-1123 label",
                    group.name
                )));
            }
        }

        if self.strategy == Strategy::BlueGreen && self.ports.is_empty() {
            return Err(RenderError::invalid(
                "blue-green releases need at least one port for the active and preview services",
            ));
        }

        Ok(())
    }
}
