//! Config materializer: resolved config content -> ConfigMaps

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use crate::domain::release::is_dns_label;
use crate::domain::{ConfigScope, Naming, ReleaseDescriptor, ResolvedConfig};
use crate::error::RenderError;

/// A rendered config bundle and where the workload mounts it
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedConfig {
    pub group: String,
    pub name: String,
    pub mount_path: String,
    pub config_map: ConfigMap,
}

/// One ConfigMap per non-empty group, in descriptor order
pub fn materialize(
    descriptor: &ReleaseDescriptor,
    resolved: &ResolvedConfig,
) -> Result<Vec<MaterializedConfig>, RenderError> {
    let naming = Naming::new(&descriptor.identity, descriptor.strategy);
    let environment = descriptor.environment.as_str();
    let mut bundles = Vec::new();

    for group in &descriptor.config_groups {
        let Some(files) = resolved.files(&group.name) else {
            debug!("Config group {} has no content, skipping", group.name);
            continue;
        };

        if resolved.scope == ConfigScope::PerGroup && environment.is_empty() {
            return Err(RenderError::invalid(format!(
                "config group '{}' has content but no environment is set",
                group.name
            )));
        }
        if resolved.scope == ConfigScope::Unscoped && !bundles.is_empty() {
            return Err(RenderError::invalid(format!(
                "config group '{}' would share the unscoped bundle name '{}'",
                group.name,
                naming.base_name()
            )));
        }

        let name = naming.config_bundle_name(&group.name, environment, resolved.scope);
        // Also the pod volume name, so the tighter label rule applies
        if !is_dns_label(&name) {
            return Err(RenderError::invalid(format!(
                "config bundle name '{}' for group '{}' is not a DNS-1123 label",
                name, group.name
            )));
        }
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: naming.namespace(),
                labels: Some(naming.resource_labels(environment)),
                ..Default::default()
            },
            data: Some(files.clone()),
            ..Default::default()
        };

        bundles.push(MaterializedConfig {
            group: group.name.clone(),
            name,
            mount_path: group.mount_path.clone(),
            config_map,
        });
    }

    Ok(bundles)
}
