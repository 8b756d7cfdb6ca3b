//! # Render Configuration
//!
//! Layered configuration loading: defaults → settings file → environment
//!
//! ## Settings File
//!
//! Optional YAML file (`--settings` or `FORGE_RENDER_SETTINGS`):
//!
//! ```yaml
//! render:
//!   public_domain: example.com
//!   gateway: istio-system/public-gateway
//!   registry: ghcr.io/acme
//!   default_replicas: 2
//! sources:
//!   release_api: http://devflow-api:8080
//!   consul_address: http://consul:8500
//!   http_timeout: 10s
//! ```
//!
//! ## Environment Overrides
//!
//! `FORGE_RENDER_PUBLIC_DOMAIN`, `FORGE_RENDER_GATEWAY`, `FORGE_RENDER_REGISTRY`
//! take precedence over the file. CLI flags are applied last by the caller.

mod render;
mod sources;

pub use render::RenderSettings;
pub use sources::SourcesConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgeRenderConfig {
    #[serde(default)]
    pub render: RenderSettings,

    #[serde(default)]
    pub sources: SourcesConfig,
}

impl ForgeRenderConfig {
    /// Load defaults, the optional settings file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            message: format!("{}: {}", path.display(), e),
        })?;
        debug!("Loaded settings from {}", path.display());
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    /// Apply `FORGE_RENDER_*` overrides from a variable lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(domain) = non_empty("FORGE_RENDER_PUBLIC_DOMAIN") {
            self.render.public_domain = domain;
        }
        if let Some(gateway) = non_empty("FORGE_RENDER_GATEWAY") {
            self.render.gateway = gateway;
        }
        if let Some(registry) = non_empty("FORGE_RENDER_REGISTRY") {
            self.render.registry = registry;
        }
    }
}
