//! CLI definitions for forge-render
//!
//! This module contains all CLI argument parsing structures using clap.
//! Argument environment variables follow the Argo CD config-management plugin
//! conventions so the binary can run as a plugin `generate` command unchanged.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "forge-render",
    version,
    about = "Release manifest compiler for progressive delivery",
    long_about = "Compiles a release descriptor into Kubernetes, Argo Rollouts and Istio manifests.\nManifests are written to stdout as one multi-document YAML stream; logs go to stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,
}

/// Rendering settings shared by every subcommand
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// Settings file (YAML)
    #[arg(long = "settings", env = "FORGE_RENDER_SETTINGS", global = true)]
    pub path: Option<PathBuf>,

    /// Public DNS suffix for externally exposed hosts
    #[arg(long, global = true)]
    pub public_domain: Option<String>,

    /// Ingress gateway bound by external routing (`namespace/name`)
    #[arg(long, global = true)]
    pub gateway: Option<String>,

    /// Registry prefix for descriptors without an image repository
    #[arg(long, global = true)]
    pub registry: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a release fetched from the release API, config from Consul
    Render {
        /// Release manifest id
        #[arg(long, env = "ARGOCD_PLUGIN_MANIFEST_ID")]
        manifest_id: String,

        /// Target environment (overrides the descriptor's)
        #[arg(long, env = "ARGOCD_PLUGIN_ENV")]
        env: Option<String>,

        /// Release API base URL
        #[arg(long, env = "ARGOCD_PLUGIN_DEVFLOW_API")]
        api: Option<String>,

        /// Consul HTTP address
        #[arg(long, env = "ARGOCD_PLUGIN_CONSUL_ADDR")]
        consul: Option<String>,
    },

    /// Render a release from a git repository checkout
    RenderRepo {
        /// Repository URL
        #[arg(long, env = "ARGOCD_APP_SOURCE_REPO_URL")]
        repo: String,

        /// Branch to clone or pull
        #[arg(long, env = "ARGOCD_APP_SOURCE_TARGET_REVISION", default_value = "main")]
        branch: String,

        /// Target environment (overrides the descriptor's)
        #[arg(long, env = "ARGOCD_PLUGIN_ENV")]
        env: Option<String>,

        /// Descriptor path inside the checkout
        #[arg(long)]
        descriptor_file: Option<String>,

        /// Directory holding checkouts
        #[arg(long)]
        checkout_root: Option<PathBuf>,

        /// Config directory inside the checkout, mounted as one unscoped bundle
        #[arg(long)]
        config_root: Option<PathBuf>,
    },

    /// Compile a local descriptor file without any network access
    Compile {
        /// Descriptor file (YAML)
        #[arg(long, short = 'f')]
        descriptor: PathBuf,

        /// Target environment (overrides the descriptor's)
        #[arg(long)]
        env: Option<String>,

        /// Config directory mounted as one unscoped bundle; otherwise groups
        /// are read from `filesPath` relative to the descriptor
        #[arg(long)]
        config_root: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_compile() {
        let cli = Cli::try_parse_from([
            "forge-render",
            "compile",
            "-f",
            "release.yaml",
            "--env",
            "prod",
            "--public-domain",
            "example.com",
        ])
        .unwrap();

        assert_eq!(cli.settings.public_domain.as_deref(), Some("example.com"));
        match cli.command {
            Commands::Compile {
                descriptor, env, ..
            } => {
                assert_eq!(descriptor, PathBuf::from("release.yaml"));
                assert_eq!(env.as_deref(), Some("prod"));
            }
            _ => panic!("expected compile"),
        }
    }

    #[test]
    fn test_parse_render_repo_defaults() {
        let cli = Cli::try_parse_from([
            "forge-render",
            "render-repo",
            "--repo",
            "https://github.com/acme/orders.git",
        ])
        .unwrap();

        match cli.command {
            Commands::RenderRepo {
                branch, config_root, ..
            } => {
                assert_eq!(branch, "main");
                assert!(config_root.is_none());
            }
            _ => panic!("expected render-repo"),
        }
    }
}
