//! Git operations
//!
//! Keeps a checkout of a descriptor repository current: clone on first use,
//! `pull` afterwards. Git output is captured so stdout stays reserved for
//! rendered manifests.

use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::SourceError;

/// Client for git operations; every command names its checkout explicitly
#[derive(Debug, Default)]
pub struct GitClient;

impl GitClient {
    pub fn new() -> Self {
        Self
    }

    /// Checkout location for a repository under `root`
    pub fn checkout_path(root: impl AsRef<Path>, repo_url: &str) -> PathBuf {
        root.as_ref().join(repo_dir_name(repo_url))
    }

    /// Clone `branch` into `checkout` when missing, otherwise pull it
    pub async fn clone_or_pull(
        &self,
        repo_url: &str,
        branch: &str,
        checkout: &Path,
    ) -> Result<(), SourceError> {
        if let Some(parent) = checkout.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SourceError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let dir = checkout.display().to_string();
        if tokio::fs::try_exists(checkout).await.unwrap_or(false) {
            info!("Pulling {} (branch: {}) in {}", repo_url, branch, dir);
            self.run(&["-C", &dir, "-c", "http.version=HTTP/1.1", "pull", "origin", branch])
                .await
        } else {
            info!("Cloning {} (branch: {}) into {}", repo_url, branch, dir);
            self.run(&["-c", "http.version=HTTP/1.1", "clone", "-b", branch, repo_url, &dir])
                .await
        }
    }

    async fn run(&self, args: &[&str]) -> Result<(), SourceError> {
        let command = format!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .output()
            .await
            .map_err(|e| SourceError::Git {
                command: format!("{} ({})", command, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Git {
                command: format!("{}: {}", command, stderr.trim()),
            });
        }

        debug!("{} succeeded", command);
        Ok(())
    }
}

/// `{owner}-{repo}` from an HTTPS or scp-style repository URL
pub fn repo_dir_name(repo_url: &str) -> String {
    let trimmed = repo_url.trim_end_matches('/').trim_end_matches(".git");
    let parts: Vec<&str> = trimmed.split(['/', ':']).collect();
    if parts.len() >= 2 {
        format!("{}-{}", parts[parts.len() - 2], parts[parts.len() - 1])
    } else {
        trimmed.replace('/', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_dir_name() {
        assert_eq!(
            repo_dir_name("https://github.com/acme/orders.git"),
            "acme-orders"
        );
        assert_eq!(repo_dir_name("https://github.com/acme/orders/"), "acme-orders");
        assert_eq!(repo_dir_name("orders"), "orders");
    }

    #[test]
    fn test_checkout_path() {
        let path = GitClient::checkout_path("/tmp/forge-render", "git@host:acme/orders.git");
        assert_eq!(path, PathBuf::from("/tmp/forge-render/acme-orders"));
    }

    #[tokio::test]
    async fn test_clone_failure_is_a_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let checkout = dir.path().join("missing-repo");
        let missing_remote = dir.path().join("nope").display().to_string();

        let err = GitClient::new()
            .clone_or_pull(&missing_remote, "main", &checkout)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Git { .. }));
    }
}
