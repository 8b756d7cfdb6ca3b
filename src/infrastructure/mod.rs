//! Infrastructure layer - external I/O adapters
//!
//! Everything that talks to the outside world lives here:
//! - Release metadata API (descriptor by manifest id)
//! - Consul KV (config content per group and environment)
//! - Git checkouts (descriptor file and config directories)
//!
//! The compiler never calls into this module; sources are resolved first and
//! their results handed over as plain values.

pub mod consul;
pub mod git;
pub mod release_api;
pub mod repo;

// Re-export commonly used types
pub use consul::ConsulKvClient;
pub use git::GitClient;
pub use release_api::ReleaseApiClient;
pub use repo::RepoSource;

use crate::domain::{ReleaseDescriptor, ResolvedConfig};
use crate::error::SourceError;

/// Produces the release descriptor for one run
#[allow(async_fn_in_trait)]
pub trait DescriptorSource {
    async fn resolve_descriptor(&self) -> Result<ReleaseDescriptor, SourceError>;
}

/// Produces config content for a descriptor's groups in its environment
#[allow(async_fn_in_trait)]
pub trait ConfigSource {
    async fn resolve_config(
        &self,
        descriptor: &ReleaseDescriptor,
    ) -> Result<ResolvedConfig, SourceError>;
}

/// A descriptor already in memory
impl DescriptorSource for ReleaseDescriptor {
    async fn resolve_descriptor(&self) -> Result<ReleaseDescriptor, SourceError> {
        Ok(self.clone())
    }
}

/// Config content already in memory
impl ConfigSource for ResolvedConfig {
    async fn resolve_config(
        &self,
        _descriptor: &ReleaseDescriptor,
    ) -> Result<ResolvedConfig, SourceError> {
        Ok(self.clone())
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response; the handle yields the request line
    pub async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{}", addr), handle)
    }
}
