//! Subcommand implementations
//!
//! Each command resolves its sources, runs the render service and writes the
//! manifest stream to stdout.

pub mod compile;
pub mod render;
pub mod render_repo;

use anyhow::{Context, Result};
use forge_render::config::ForgeRenderConfig;
use std::io::Write;

use crate::cli::SettingsArgs;

/// Settings file and environment, then command-line overrides
pub fn load_config(args: &SettingsArgs) -> Result<ForgeRenderConfig> {
    let mut config =
        ForgeRenderConfig::load(args.path.as_deref()).context("Failed to load settings")?;

    if let Some(domain) = &args.public_domain {
        config.render.public_domain = domain.clone();
    }
    if let Some(gateway) = &args.gateway {
        config.render.gateway = gateway.clone();
    }
    if let Some(registry) = &args.registry {
        config.render.registry = registry.clone();
    }

    Ok(config)
}

/// Write the manifest stream; stdout carries nothing else
pub fn emit(manifests: &str) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(manifests.as_bytes())
        .and_then(|_| out.flush())
        .context("Failed to write manifests to stdout")
}
