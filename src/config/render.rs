//! Rendering settings: ingress domain, gateway, default image registry.

use serde::{Deserialize, Serialize};

/// Settings consumed by the release compiler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Public DNS suffix for externally exposed hosts (`{app}.{public_domain}`)
    #[serde(default = "default_public_domain")]
    pub public_domain: String,

    /// Ingress gateway bound by external VirtualServices (`namespace/name`)
    #[serde(default = "default_gateway")]
    pub gateway: String,

    /// Registry prefix used when a descriptor names no image repository
    #[serde(default = "default_registry")]
    pub registry: String,

    /// Replica count when the descriptor leaves it out
    #[serde(default = "default_replicas")]
    pub default_replicas: i32,
}

fn default_public_domain() -> String {
    "bei.com".to_string()
}

fn default_gateway() -> String {
    "istio-system/devflow-gateway".to_string()
}

fn default_registry() -> String {
    "registry.cn-hangzhou.aliyuncs.com/devflow".to_string()
}

fn default_replicas() -> i32 {
    1
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            public_domain: default_public_domain(),
            gateway: default_gateway(),
            registry: default_registry(),
            default_replicas: default_replicas(),
        }
    }
}

impl RenderSettings {
    /// Host reachable from outside the cluster
    pub fn public_host(&self, app: &str) -> String {
        format!("{}.{}", app, self.public_domain.trim_start_matches('.'))
    }
}
