//! Workload renderer: pod template, then a Deployment or a Rollout
//!
//! The pod template is identical across strategies; only the wrapper and
//! its `strategy` field change with the [`TrafficPlan`].

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, EnvVar, EnvVarSource, ObjectFieldSelector, PodSpec,
    PodTemplateSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

use super::config_map::MaterializedConfig;
use crate::config::RenderSettings;
use crate::crd::{
    BlueGreenStrategy, CanaryStepSpec, CanaryStrategy, IstioDestinationRule, IstioTrafficRouting,
    IstioVirtualService, Rollout, RolloutPause, RolloutSpec, RolloutStrategy,
    RolloutTrafficRouting,
};
use crate::domain::{
    BlueGreenPlan, CanaryPlan, CanaryStep, Naming, ReleaseDescriptor, TrafficPlan,
};

const REVISION_HISTORY_LIMIT: i32 = 10;
const TERMINATION_GRACE_PERIOD_SECONDS: i64 = 30;
const CONFIG_VOLUME_MODE: i32 = 0o644;

/// Label selecting pods for ServiceMonitor / PodMonitor
pub const MONITORING_LABEL: &str = "monitoring";

/// Downward-API variables resolved when the pod starts
const FIELD_REF_VARS: [(&str, &str); 5] = [
    ("POD_NAME", "metadata.name"),
    ("POD_NAMESPACE", "metadata.namespace"),
    ("POD_UID", "metadata.uid"),
    ("NODE_NAME", "spec.nodeName"),
    ("POD_IP", "status.podIP"),
];

/// The rendered workload resource
#[derive(Debug, Clone)]
pub enum Workload {
    Deployment(Deployment),
    Rollout(Rollout),
}

impl Workload {
    pub fn pod_template(&self) -> Option<&PodTemplateSpec> {
        match self {
            Self::Deployment(deployment) => deployment.spec.as_ref().map(|spec| &spec.template),
            Self::Rollout(rollout) => Some(&rollout.spec.template),
        }
    }
}

/// Render the workload for the plan
pub fn render_workload(
    descriptor: &ReleaseDescriptor,
    plan: &TrafficPlan,
    settings: &RenderSettings,
    configs: &[MaterializedConfig],
) -> Workload {
    let naming = Naming::new(&descriptor.identity, descriptor.strategy);
    let template = pod_template(descriptor, settings, configs);
    let replicas = Some(descriptor.replicas(settings.default_replicas));
    let selector = LabelSelector {
        match_labels: Some(naming.selector(None)),
        ..Default::default()
    };
    let metadata = ObjectMeta {
        name: Some(naming.base_name().to_string()),
        namespace: naming.namespace(),
        labels: Some(naming.resource_labels(&descriptor.environment)),
        ..Default::default()
    };

    let strategy = match plan {
        TrafficPlan::Rolling => {
            return Workload::Deployment(Deployment {
                metadata,
                spec: Some(DeploymentSpec {
                    replicas,
                    selector,
                    template,
                    ..Default::default()
                }),
                ..Default::default()
            });
        }
        TrafficPlan::Canary(canary) => canary_strategy(canary),
        TrafficPlan::BlueGreen(blue_green) => blue_green_strategy(blue_green),
    };

    let mut rollout = Rollout::new(
        naming.base_name(),
        RolloutSpec {
            replicas,
            revision_history_limit: Some(REVISION_HISTORY_LIMIT),
            selector,
            template,
            strategy: Some(strategy),
        },
    );
    rollout.metadata = metadata;
    Workload::Rollout(rollout)
}

/// Pod template shared by every strategy
pub fn pod_template(
    descriptor: &ReleaseDescriptor,
    settings: &RenderSettings,
    configs: &[MaterializedConfig],
) -> PodTemplateSpec {
    let naming = Naming::new(&descriptor.identity, descriptor.strategy);
    let app = naming.base_name();

    let mut labels = naming.pod_labels(&descriptor.environment);
    let mut annotations = None;
    if let Some(metrics) = descriptor.metrics_port() {
        labels.insert(MONITORING_LABEL.to_string(), "enabled".to_string());
        annotations = Some(scrape_annotations(app, metrics.container_port()));
    }

    let (volumes, volume_mounts) = config_volumes(configs);

    let container = Container {
        name: app.to_string(),
        image: Some(descriptor.image.resolve(app, &settings.registry)),
        image_pull_policy: Some("IfNotPresent".to_string()),
        env: Some(env_vars(descriptor)),
        volume_mounts: (!volume_mounts.is_empty()).then_some(volume_mounts),
        ..Default::default()
    };

    PodTemplateSpec {
        metadata: Some(ObjectMeta {
            labels: Some(labels),
            annotations,
            ..Default::default()
        }),
        spec: Some(PodSpec {
            containers: vec![container],
            volumes: (!volumes.is_empty()).then_some(volumes),
            restart_policy: Some("Always".to_string()),
            dns_policy: Some("ClusterFirst".to_string()),
            scheduler_name: Some("default-scheduler".to_string()),
            termination_grace_period_seconds: Some(TERMINATION_GRACE_PERIOD_SECONDS),
            ..Default::default()
        }),
    }
}

/// Fixed identity vars, downward-API vars, then the environment's custom list.
/// Duplicates are kept; the kubelet applies last-wins.
fn env_vars(descriptor: &ReleaseDescriptor) -> Vec<EnvVar> {
    let mut vars = vec![
        EnvVar {
            name: "ENV".to_string(),
            value: Some(descriptor.environment.clone()),
            ..Default::default()
        },
        EnvVar {
            name: "SERVICE_NAME".to_string(),
            value: Some(descriptor.name().to_string()),
            ..Default::default()
        },
    ];

    vars.extend(FIELD_REF_VARS.iter().map(|(name, field_path)| EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }));

    vars.extend(descriptor.active_variables().iter().map(|var| EnvVar {
        name: var.name.clone(),
        value: Some(var.value.clone()),
        ..Default::default()
    }));

    vars
}

fn config_volumes(configs: &[MaterializedConfig]) -> (Vec<Volume>, Vec<VolumeMount>) {
    configs
        .iter()
        .map(|config| {
            let volume = Volume {
                name: config.name.clone(),
                config_map: Some(ConfigMapVolumeSource {
                    name: config.name.clone(),
                    default_mode: Some(CONFIG_VOLUME_MODE),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let mount = VolumeMount {
                name: config.name.clone(),
                mount_path: config.mount_path.clone(),
                read_only: Some(true),
                ..Default::default()
            };
            (volume, mount)
        })
        .unzip()
}

fn scrape_annotations(app: &str, port: i32) -> BTreeMap<String, String> {
    [
        ("prometheus.io/scrape", "true".to_string()),
        ("prometheus.io/path", "/metrics".to_string()),
        ("prometheus.io/port", port.to_string()),
        ("prometheus.io/scheme", "http".to_string()),
        ("prometheus.io/job", app.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn canary_strategy(plan: &CanaryPlan) -> RolloutStrategy {
    let steps = plan
        .steps
        .iter()
        .map(|step| match step {
            CanaryStep::SetWeight(weight) => CanaryStepSpec {
                set_weight: Some(*weight),
                ..Default::default()
            },
            CanaryStep::Pause(seconds) => CanaryStepSpec {
                pause: Some(RolloutPause {
                    duration: Some(IntOrString::Int(*seconds)),
                }),
                ..Default::default()
            },
        })
        .collect();

    let traffic_routing = plan.routing.as_ref().map(|routing| RolloutTrafficRouting {
        istio: Some(IstioTrafficRouting {
            virtual_service: Some(IstioVirtualService {
                name: routing.virtual_service.clone(),
                routes: vec![routing.route.clone()],
            }),
            destination_rule: Some(IstioDestinationRule {
                name: routing.destination_rule.clone(),
                canary_subset_name: routing.subsets.canary_name().to_string(),
                stable_subset_name: routing.subsets.stable_name().to_string(),
            }),
        }),
    });

    RolloutStrategy {
        canary: Some(CanaryStrategy {
            steps,
            traffic_routing,
        }),
        ..Default::default()
    }
}

fn blue_green_strategy(plan: &BlueGreenPlan) -> RolloutStrategy {
    RolloutStrategy {
        blue_green: Some(BlueGreenStrategy {
            active_service: plan.active_service.clone(),
            preview_service: plan.preview_service.clone(),
            auto_promotion_enabled: Some(plan.auto_promotion_enabled),
            scale_down_delay_seconds: Some(plan.scale_down_delay_seconds),
        }),
        ..Default::default()
    }
}
