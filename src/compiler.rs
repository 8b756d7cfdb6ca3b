//! Release compiler
//!
//! Pure entry point: one descriptor plus its resolved config in, one
//! multi-document manifest out. Performs no I/O; collaborators resolve
//! everything beforehand.

use tracing::{debug, info};

use crate::config::RenderSettings;
use crate::domain::{ReleaseDescriptor, ResolvedConfig, TrafficPlan};
use crate::error::RenderError;
use crate::render::{
    assemble, materialize, render_destination_rule, render_services, render_virtual_service,
    render_workload, ManifestBundle,
};

/// Compiles release descriptors against a fixed set of render settings
#[derive(Debug, Clone)]
pub struct ReleaseCompiler<'a> {
    settings: &'a RenderSettings,
}

impl<'a> ReleaseCompiler<'a> {
    pub fn new(settings: &'a RenderSettings) -> Self {
        Self { settings }
    }

    /// Render every resource for the release without serializing
    pub fn build(
        &self,
        descriptor: &ReleaseDescriptor,
        resolved: &ResolvedConfig,
    ) -> Result<ManifestBundle, RenderError> {
        descriptor.validate()?;

        let plan = TrafficPlan::for_release(descriptor);
        debug!(
            "Compiling {} with strategy {}",
            descriptor.name(),
            descriptor.strategy.as_str()
        );

        let configs = materialize(descriptor, resolved)?;
        let services = render_services(descriptor, &plan);
        let workload = render_workload(descriptor, &plan, self.settings, &configs);
        let virtual_service = render_virtual_service(descriptor, &plan, self.settings);
        let destination_rule = render_destination_rule(descriptor, &plan);

        Ok(ManifestBundle {
            config_maps: configs.into_iter().map(|c| c.config_map).collect(),
            services,
            workload: Some(workload),
            virtual_service,
            destination_rule,
        })
    }

    /// Render and serialize the release into one YAML stream
    pub fn compile(
        &self,
        descriptor: &ReleaseDescriptor,
        resolved: &ResolvedConfig,
    ) -> Result<String, RenderError> {
        let bundle = self.build(descriptor, resolved)?;
        let output = assemble(&bundle)?;
        info!(
            "Compiled {} ({} documents)",
            descriptor.name(),
            bundle.document_count()
        );
        Ok(output)
    }
}
