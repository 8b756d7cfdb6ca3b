//! Render service - orchestrates one render run
//!
//! resolve descriptor -> apply environment override -> resolve config -> compile

use std::time::Instant;
use tracing::info;

use crate::compiler::ReleaseCompiler;
use crate::config::RenderSettings;
use crate::error::RenderError;
use crate::infrastructure::{ConfigSource, DescriptorSource};

/// Service for rendering one release from its sources
pub struct RenderService<'a> {
    compiler: ReleaseCompiler<'a>,
    environment: Option<String>,
}

impl<'a> RenderService<'a> {
    pub fn new(settings: &'a RenderSettings) -> Self {
        Self {
            compiler: ReleaseCompiler::new(settings),
            environment: None,
        }
    }

    /// Environment that replaces the descriptor's own; empty values are ignored
    pub fn with_environment(mut self, environment: Option<String>) -> Self {
        self.environment = environment.filter(|e| !e.is_empty());
        self
    }

    /// Resolve both sources and compile the manifest stream
    pub async fn render<D, C>(&self, descriptors: &D, configs: &C) -> Result<String, RenderError>
    where
        D: DescriptorSource,
        C: ConfigSource,
    {
        let start = Instant::now();

        let mut descriptor = descriptors.resolve_descriptor().await?;
        if let Some(environment) = &self.environment {
            descriptor = descriptor.with_environment(environment.clone());
        }
        info!(
            "Rendering {} for environment '{}'",
            descriptor.name(),
            descriptor.environment
        );

        let resolved = configs.resolve_config(&descriptor).await?;
        let output = self.compiler.compile(&descriptor, &resolved)?;

        info!(
            "Rendered {} in {:.1}s",
            descriptor.name(),
            start.elapsed().as_secs_f64()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::release::fixtures;
    use crate::domain::{ConfigGroup, Exposure, ReleaseDescriptor, ResolvedConfig, Strategy};
    use crate::error::SourceError;
    use std::collections::BTreeMap;

    struct Unreachable;

    impl DescriptorSource for Unreachable {
        async fn resolve_descriptor(&self) -> Result<ReleaseDescriptor, SourceError> {
            Err(SourceError::Status {
                url: "http://devflow-api/api/v1/manifests/7".to_string(),
                status: 503,
            })
        }
    }

    fn with_app_config() -> (ReleaseDescriptor, ResolvedConfig) {
        let descriptor =
            fixtures::orders(Strategy::Normal, Exposure::Internal).with_config_group(ConfigGroup {
                name: "app".to_string(),
                mount_path: "/etc/orders".to_string(),
                files_path: BTreeMap::new(),
            });
        let resolved = ResolvedConfig::new().with_group(
            "app",
            [("app.yaml".to_string(), "port: 8080\n".to_string())].into(),
        );
        (descriptor, resolved)
    }

    #[tokio::test]
    async fn test_render_in_memory() {
        let settings = RenderSettings::default();
        let (descriptor, resolved) = with_app_config();

        let output = RenderService::new(&settings)
            .render(&descriptor, &resolved)
            .await
            .unwrap();

        assert!(output.starts_with("---\n"));
        assert!(output.contains("name: orders-app-prod"));
        assert!(output.contains("kind: Deployment"));
    }

    #[tokio::test]
    async fn test_environment_override() {
        let settings = RenderSettings::default();
        let (descriptor, resolved) = with_app_config();

        let output = RenderService::new(&settings)
            .with_environment(Some("staging".to_string()))
            .render(&descriptor, &resolved)
            .await
            .unwrap();

        assert!(output.contains("name: orders-app-staging"));
        assert!(!output.contains("orders-app-prod"));
    }

    #[tokio::test]
    async fn test_empty_override_keeps_descriptor_environment() {
        let settings = RenderSettings::default();
        let (descriptor, resolved) = with_app_config();

        let output = RenderService::new(&settings)
            .with_environment(Some(String::new()))
            .render(&descriptor, &resolved)
            .await
            .unwrap();

        assert!(output.contains("name: orders-app-prod"));
    }

    #[tokio::test]
    async fn test_source_failure_surfaces_unchanged() {
        let settings = RenderSettings::default();

        let err = RenderService::new(&settings)
            .render(&Unreachable, &ResolvedConfig::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RenderError::Collaborator(SourceError::Status { status: 503, .. })
        ));
    }
}
