//! forge-render: compiles release descriptors into progressive-delivery manifests
//!
//! Layers:
//! - `domain` - descriptor model, naming authority, traffic plans (pure)
//! - `render` - per-resource renderers and the manifest assembler (pure)
//! - `compiler` - the entry point wiring renderers together (pure)
//! - `infrastructure` - descriptor and config sources (HTTP, Consul, git, files)
//! - `services` - orchestration of sources and compiler

pub mod compiler;
pub mod config;
pub mod crd;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod render;
pub mod services;

pub use compiler::ReleaseCompiler;
pub use error::{ConfigError, RenderError, SourceError};
