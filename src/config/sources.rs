//! Source configuration: where descriptors and config content come from.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Endpoints and paths used by the descriptor and config collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Release metadata API base URL
    #[serde(default = "default_release_api")]
    pub release_api: String,

    /// Consul HTTP address for config content
    #[serde(default = "default_consul_address")]
    pub consul_address: String,

    /// Request timeout for both HTTP collaborators (humantime, e.g. "30s")
    #[serde(default = "default_http_timeout")]
    pub http_timeout: String,

    /// Directory that holds git checkouts
    #[serde(default = "default_checkout_root")]
    pub checkout_root: String,

    /// Descriptor file path relative to a checkout
    #[serde(default = "default_descriptor_file")]
    pub descriptor_file: String,
}

fn default_release_api() -> String {
    "http://devflow-api.devflow.svc.cluster.local:8080".to_string()
}

fn default_consul_address() -> String {
    "https://consul.bei.com:30000".to_string()
}

fn default_http_timeout() -> String {
    "30s".to_string()
}

fn default_checkout_root() -> String {
    "/tmp/forge-render".to_string()
}

fn default_descriptor_file() -> String {
    "release.yaml".to_string()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            release_api: default_release_api(),
            consul_address: default_consul_address(),
            http_timeout: default_http_timeout(),
            checkout_root: default_checkout_root(),
            descriptor_file: default_descriptor_file(),
        }
    }
}

impl SourcesConfig {
    /// Parsed request timeout
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.http_timeout).map_err(|_| ConfigError::InvalidValue {
            field: "sources.http_timeout".to_string(),
            value: self.http_timeout.clone(),
        })
    }
}
