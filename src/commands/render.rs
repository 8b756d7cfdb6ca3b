//! `render`: descriptor from the release API, config from Consul KV

use anyhow::{Context, Result};
use forge_render::config::ForgeRenderConfig;
use forge_render::infrastructure::{ConsulKvClient, ReleaseApiClient};
use forge_render::services::RenderService;
use tracing::info;

pub async fn execute(
    config: ForgeRenderConfig,
    manifest_id: String,
    env: Option<String>,
    api: Option<String>,
    consul: Option<String>,
) -> Result<String> {
    if manifest_id.is_empty() {
        anyhow::bail!("manifest id is required (--manifest-id or ARGOCD_PLUGIN_MANIFEST_ID)");
    }

    let timeout = config.sources.timeout()?;
    let api = api
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| config.sources.release_api.clone());
    let consul = consul
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| config.sources.consul_address.clone());

    info!(
        "manifest_id={}, env={}, api={}",
        manifest_id,
        env.as_deref().unwrap_or(""),
        api
    );

    let descriptors = ReleaseApiClient::new(api, manifest_id, timeout)?;
    let configs = ConsulKvClient::new(consul, timeout)?;

    RenderService::new(&config.render)
        .with_environment(env)
        .render(&descriptors, &configs)
        .await
        .context("Render failed")
}
