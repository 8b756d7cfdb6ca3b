//! Manifest assembler: fixed ordering, status stripping, multi-document output

use k8s_openapi::api::core::v1::{ConfigMap, Service};
use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

use super::workload::Workload;
use crate::crd::{DestinationRule, VirtualService};
use crate::error::RenderError;

/// Document boundary written before every document
pub const DOCUMENT_MARKER: &str = "---\n";

/// Every resource produced for one release
#[derive(Debug, Clone, Default)]
pub struct ManifestBundle {
    pub config_maps: Vec<ConfigMap>,
    pub services: Vec<Service>,
    pub workload: Option<Workload>,
    pub virtual_service: Option<VirtualService>,
    pub destination_rule: Option<DestinationRule>,
}

impl ManifestBundle {
    /// Number of documents the bundle renders to
    pub fn document_count(&self) -> usize {
        self.config_maps.len()
            + self.services.len()
            + usize::from(self.workload.is_some())
            + usize::from(self.virtual_service.is_some())
            + usize::from(self.destination_rule.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.document_count() == 0
    }
}

/// Serialize the bundle in emission order: config, services, workload, routing, subsets
pub fn assemble(bundle: &ManifestBundle) -> Result<String, RenderError> {
    let mut documents = Vec::with_capacity(bundle.document_count());

    for config_map in &bundle.config_maps {
        documents.push(render_document(
            "ConfigMap",
            name_of(&config_map.metadata.name),
            config_map,
        )?);
    }
    for service in &bundle.services {
        documents.push(render_document("Service", name_of(&service.metadata.name), service)?);
    }
    match &bundle.workload {
        Some(Workload::Deployment(deployment)) => documents.push(render_document(
            "Deployment",
            name_of(&deployment.metadata.name),
            deployment,
        )?),
        Some(Workload::Rollout(rollout)) => documents.push(render_document(
            "Rollout",
            name_of(&rollout.metadata.name),
            rollout,
        )?),
        None => {}
    }
    if let Some(virtual_service) = &bundle.virtual_service {
        documents.push(render_document(
            "VirtualService",
            name_of(&virtual_service.metadata.name),
            virtual_service,
        )?);
    }
    if let Some(destination_rule) = &bundle.destination_rule {
        documents.push(render_document(
            "DestinationRule",
            name_of(&destination_rule.metadata.name),
            destination_rule,
        )?);
    }

    Ok(join_documents(&documents))
}

/// Concatenate documents, each preceded by a boundary marker; empty ones are dropped
pub fn join_documents(documents: &[String]) -> String {
    let mut out = String::new();
    for document in documents.iter().filter(|d| !d.trim().is_empty()) {
        out.push_str(DOCUMENT_MARKER);
        out.push_str(document);
        if !document.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

fn name_of(name: &Option<String>) -> String {
    name.clone().unwrap_or_default()
}

fn render_document<T: Serialize>(
    kind: &'static str,
    name: String,
    resource: &T,
) -> Result<String, RenderError> {
    let serialization = |source| RenderError::Serialization {
        kind,
        name: name.clone(),
        source,
    };

    let mut value = serde_yaml::to_value(resource).map_err(serialization)?;
    strip_empty_status(&mut value);
    let yaml = serde_yaml::to_string(&value).map_err(serialization)?;
    debug!("Rendered {} {}", kind, name);
    Ok(yaml)
}

/// Drop `status` and `metadata.creationTimestamp` when they carry nothing
pub fn strip_empty_status(value: &mut Value) {
    let Some(root) = value.as_mapping_mut() else {
        return;
    };

    if root.get("status").is_some_and(is_empty) {
        root.remove("status");
    }
    if let Some(metadata) = root.get_mut("metadata").and_then(Value::as_mapping_mut) {
        if metadata.get("creationTimestamp").is_some_and(Value::is_null) {
            metadata.remove("creationTimestamp");
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Mapping(mapping) => mapping.is_empty(),
        _ => false,
    }
}
