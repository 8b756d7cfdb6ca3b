//! `compile`: local descriptor file and local config tree, no network

use anyhow::{Context, Result};
use forge_render::config::ForgeRenderConfig;
use forge_render::infrastructure::RepoSource;
use forge_render::services::RenderService;
use std::path::{Path, PathBuf};

pub async fn execute(
    config: ForgeRenderConfig,
    descriptor: PathBuf,
    env: Option<String>,
    config_root: Option<PathBuf>,
) -> Result<String> {
    let file_name = descriptor
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file path", descriptor.display()))?;
    let base = descriptor
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut source = RepoSource::new(base, file_name);
    if let Some(root) = config_root {
        source = source.with_config_root(root);
    }

    RenderService::new(&config.render)
        .with_environment(env)
        .render(&source, &source)
        .await
        .context("Compile failed")
}
