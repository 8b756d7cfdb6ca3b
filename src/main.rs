use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::render_repo::RepoArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    // stdout carries manifests only
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();

    let config = commands::load_config(&cli.settings)?;

    let manifests = match cli.command {
        Commands::Render {
            manifest_id,
            env,
            api,
            consul,
        } => commands::render::execute(config, manifest_id, env, api, consul).await?,
        Commands::RenderRepo {
            repo,
            branch,
            env,
            descriptor_file,
            checkout_root,
            config_root,
        } => {
            commands::render_repo::execute(
                config,
                RepoArgs {
                    repo,
                    branch,
                    env,
                    descriptor_file,
                    checkout_root,
                    config_root,
                },
            )
            .await?
        }
        Commands::Compile {
            descriptor,
            env,
            config_root,
        } => commands::compile::execute(config, descriptor, env, config_root).await?,
    };

    commands::emit(&manifests)
}
