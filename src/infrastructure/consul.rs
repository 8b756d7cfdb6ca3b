//! Consul KV config source
//!
//! Config content lives under `app/{app}/{group}/{environment}/`, one key per
//! file. Values arrive base64-encoded from the HTTP API; content that was
//! itself stored as base64 text is decoded once more.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ConfigSource;
use crate::domain::{ConfigFiles, ReleaseDescriptor, ResolvedConfig};
use crate::error::SourceError;

/// One entry of a recursive KV listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KvPair {
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Client for the Consul KV HTTP API
pub struct ConsulKvClient {
    client: Client,
    address: String,
}

impl ConsulKvClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let address = address.into();
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| SourceError::Http {
                url: address.clone(),
                source,
            })?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
        })
    }

    /// KV prefix holding one group's files
    pub fn prefix(app: &str, group: &str, environment: &str) -> String {
        format!("app/{}/{}/{}", app, group, environment)
    }

    pub fn list_url(&self, prefix: &str) -> String {
        let path = prefix
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/v1/kv/{}?recurse=true", self.address, path)
    }

    /// All files under a prefix; a missing prefix yields no files
    pub async fn list(&self, prefix: &str) -> Result<ConfigFiles, SourceError> {
        let url = self.list_url(prefix);
        debug!("Listing Consul KV {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ConfigFiles::new());
        }
        if !response.status().is_success() {
            return Err(SourceError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| SourceError::Http {
            url: url.clone(),
            source,
        })?;
        let pairs: Vec<KvPair> = serde_json::from_str(&body).map_err(|e| SourceError::Decode {
            what: format!("KV listing from {}", url),
            message: e.to_string(),
        })?;

        files_from_pairs(pairs)
    }
}

/// Reduce KV pairs to `file name -> content`
pub fn files_from_pairs(pairs: Vec<KvPair>) -> Result<ConfigFiles, SourceError> {
    let mut files = ConfigFiles::new();

    for pair in pairs {
        let Some(encoded) = pair.value.filter(|v| !v.is_empty()) else {
            continue;
        };
        let Some(name) = file_name(&pair.key) else {
            continue;
        };

        let raw = STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| SourceError::Decode {
                what: format!("KV value {}", pair.key),
                message: e.to_string(),
            })?;
        if raw.is_empty() {
            continue;
        }
        let text = String::from_utf8(raw).map_err(|e| SourceError::Decode {
            what: format!("KV value {}", pair.key),
            message: e.to_string(),
        })?;

        files.insert(name.to_string(), unwrap_base64_text(text));
    }

    Ok(files)
}

/// Last path segment of a key, ignoring a trailing slash
fn file_name(key: &str) -> Option<&str> {
    key.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
}

/// Decode content stored as base64 text; anything else is kept verbatim
pub fn unwrap_base64_text(text: String) -> String {
    let compact: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    if compact.is_empty() {
        return text;
    }

    match STANDARD.decode(compact.as_bytes()) {
        Ok(decoded) => String::from_utf8(decoded).unwrap_or(text),
        Err(_) => text,
    }
}

impl ConfigSource for ConsulKvClient {
    async fn resolve_config(
        &self,
        descriptor: &ReleaseDescriptor,
    ) -> Result<ResolvedConfig, SourceError> {
        let mut resolved = ResolvedConfig::new();

        for group in &descriptor.config_groups {
            let prefix = Self::prefix(descriptor.name(), &group.name, &descriptor.environment);
            let files = self.list(&prefix).await?;
            if files.is_empty() {
                warn!("No config content under {}", prefix);
            } else {
                info!("Resolved {} files under {}", files.len(), prefix);
            }
            resolved.insert(group.name.clone(), files);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigGroup, Strategy};
    use crate::infrastructure::test_server::serve_once;
    use std::collections::BTreeMap;

    fn pair(key: &str, value: Option<&str>) -> KvPair {
        KvPair {
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    #[test]
    fn test_prefix_and_url() {
        let client = ConsulKvClient::new("https://consul:8500/", Duration::from_secs(5)).unwrap();
        let prefix = ConsulKvClient::prefix("orders", "app", "prod");
        assert_eq!(prefix, "app/orders/app/prod");
        assert_eq!(
            client.list_url(&prefix),
            "https://consul:8500/v1/kv/app/orders/app/prod?recurse=true"
        );
    }

    #[test]
    fn test_pairs_reduce_to_file_names() {
        let files = files_from_pairs(vec![
            pair("app/orders/app/prod/", None),
            pair("app/orders/app/prod/app.yaml", Some(&STANDARD.encode("port: 8080\n"))),
            pair("app/orders/app/prod/empty.yaml", Some("")),
        ])
        .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files["app.yaml"], "port: 8080\n");
    }

    #[test]
    fn test_double_encoded_content_is_unwrapped() {
        let inner = STANDARD.encode("debug: true\n");
        let files = files_from_pairs(vec![pair(
            "app/orders/app/prod/app.yaml",
            Some(&STANDARD.encode(&inner)),
        )])
        .unwrap();

        assert_eq!(files["app.yaml"], "debug: true\n");
    }

    #[test]
    fn test_plain_text_is_kept() {
        assert_eq!(unwrap_base64_text("key: value\n".to_string()), "key: value\n");
    }

    #[test]
    fn test_invalid_api_payload_is_a_decode_error() {
        let err = files_from_pairs(vec![pair("app/orders/app/prod/a.yaml", Some("%%%"))])
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_missing_prefix_is_empty() {
        let (address, request) = serve_once(404, "").await;
        let client = ConsulKvClient::new(address, Duration::from_secs(5)).unwrap();

        let files = client.list("app/orders/app/prod").await.unwrap();
        assert!(files.is_empty());
        assert_eq!(
            request.await.unwrap(),
            "GET /v1/kv/app/orders/app/prod?recurse=true HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn test_resolve_config_for_groups() {
        // "cG9ydDogODA4MAo=" is base64 for "port: 8080\n"
        let body = r#"[{"Key": "app/orders/app/prod/app.yaml", "Value": "cG9ydDogODA4MAo="}]"#;
        let (address, _request) = serve_once(200, body).await;
        let client = ConsulKvClient::new(address, Duration::from_secs(5)).unwrap();
        let descriptor = ReleaseDescriptor::new("orders", "shop", Strategy::Normal)
            .with_environment("prod")
            .with_config_group(ConfigGroup {
                name: "app".to_string(),
                mount_path: "/etc/orders".to_string(),
                files_path: BTreeMap::new(),
            });

        let resolved = client.resolve_config(&descriptor).await.unwrap();
        assert_eq!(
            resolved.files("app").unwrap()["app.yaml"],
            "port: 8080\n"
        );
    }
}
