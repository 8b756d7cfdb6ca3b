//! Centralized error types for forge-render
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for a compilation run
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid release descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    #[error("Failed to serialize {kind} {name}: {source}")]
    Serialization {
        kind: &'static str,
        name: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Source error: {0}")]
    Collaborator(#[from] SourceError),
}

impl RenderError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            reason: reason.into(),
        }
    }
}

/// Errors raised by descriptor and config sources (HTTP API, Consul KV, git checkout)
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Git command failed: {command}")]
    Git { command: String },
}

/// Settings errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },
}
