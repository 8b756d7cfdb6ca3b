//! `render-repo`: descriptor and config files from a git checkout

use anyhow::{Context, Result};
use forge_render::config::ForgeRenderConfig;
use forge_render::infrastructure::{GitClient, RepoSource};
use forge_render::services::RenderService;
use std::path::PathBuf;

pub struct RepoArgs {
    pub repo: String,
    pub branch: String,
    pub env: Option<String>,
    pub descriptor_file: Option<String>,
    pub checkout_root: Option<PathBuf>,
    pub config_root: Option<PathBuf>,
}

pub async fn execute(config: ForgeRenderConfig, args: RepoArgs) -> Result<String> {
    let checkout_root = args
        .checkout_root
        .unwrap_or_else(|| PathBuf::from(&config.sources.checkout_root));
    let checkout = GitClient::checkout_path(&checkout_root, &args.repo);

    GitClient::new()
        .clone_or_pull(&args.repo, &args.branch, &checkout)
        .await
        .with_context(|| format!("Failed to sync {} into {}", args.repo, checkout.display()))?;

    let descriptor_file = args
        .descriptor_file
        .unwrap_or_else(|| config.sources.descriptor_file.clone());
    let mut source = RepoSource::new(&checkout, descriptor_file);
    if let Some(root) = args.config_root {
        source = source.with_config_root(checkout.join(root));
    }

    RenderService::new(&config.render)
        .with_environment(args.env)
        .render(&source, &source)
        .await
        .context("Render failed")
}
