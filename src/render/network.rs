//! Network topology renderer: Services, VirtualService, DestinationRule
//!
//! Subset names, route names and blue-green service names come from the
//! [`TrafficPlan`]; this module never spells them out itself.

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::config::RenderSettings;
use crate::crd::{
    Destination, DestinationRule, DestinationRuleSpec, HttpRoute, HttpRouteDestination,
    PortSelector, Subset, VirtualService, VirtualServiceSpec,
};
use crate::domain::{
    CanaryRouting, Exposure, Naming, PortSpec, ReleaseDescriptor, Role, TrafficPlan,
};

/// Services fronting the workload
///
/// Normal and canary get one Service named after the app. Blue-green gets the
/// active and preview Services named by the plan, selectors scoped by role.
pub fn render_services(descriptor: &ReleaseDescriptor, plan: &TrafficPlan) -> Vec<Service> {
    if descriptor.ports.is_empty() {
        return Vec::new();
    }
    let naming = Naming::new(&descriptor.identity, descriptor.strategy);

    match plan {
        TrafficPlan::Rolling | TrafficPlan::Canary(_) => vec![service(
            &naming,
            naming.base_name().to_string(),
            None,
            &descriptor.ports,
        )],
        TrafficPlan::BlueGreen(blue_green) => vec![
            service(
                &naming,
                blue_green.active_service.clone(),
                Some(Role::Active),
                &descriptor.ports,
            ),
            service(
                &naming,
                blue_green.preview_service.clone(),
                Some(Role::Preview),
                &descriptor.ports,
            ),
        ],
    }
}

fn service(naming: &Naming<'_>, name: String, role: Option<Role>, ports: &[PortSpec]) -> Service {
    let selector = naming.selector(role);
    let ports = ports
        .iter()
        .map(|p| ServicePort {
            name: Some(p.name.clone()),
            port: p.port,
            target_port: Some(IntOrString::Int(p.container_port())),
            protocol: Some("TCP".to_string()),
            ..Default::default()
        })
        .collect();

    Service {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: naming.namespace(),
            labels: Some(selector.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ports: Some(ports),
            type_: Some("ClusterIP".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Routing resource, built only when an `http` port exists and the release is
/// either externally exposed or a canary
pub fn render_virtual_service(
    descriptor: &ReleaseDescriptor,
    plan: &TrafficPlan,
    settings: &RenderSettings,
) -> Option<VirtualService> {
    let http = descriptor.http_port()?;
    let external = descriptor.exposure == Exposure::External;
    if !external && !matches!(plan, TrafficPlan::Canary(_)) {
        return None;
    }

    let naming = Naming::new(&descriptor.identity, descriptor.strategy);
    let app = naming.base_name();
    let port = Some(PortSelector {
        number: http.port as u32,
    });

    let (name, route) = match plan {
        TrafficPlan::Rolling => (
            app.to_string(),
            vec![HttpRouteDestination {
                destination: Destination {
                    host: app.to_string(),
                    subset: None,
                    port,
                },
                weight: 100,
            }],
        ),
        TrafficPlan::Canary(canary) => {
            let routing = canary.routing.as_ref()?;
            (
                routing.virtual_service.clone(),
                vec![
                    HttpRouteDestination {
                        destination: Destination {
                            host: app.to_string(),
                            subset: Some(routing.subsets.stable_name().to_string()),
                            port: port.clone(),
                        },
                        weight: canary.stable_weight(),
                    },
                    HttpRouteDestination {
                        destination: Destination {
                            host: app.to_string(),
                            subset: Some(routing.subsets.canary_name().to_string()),
                            port,
                        },
                        weight: canary.current_weight(),
                    },
                ],
            )
        }
        TrafficPlan::BlueGreen(blue_green) => (
            app.to_string(),
            vec![HttpRouteDestination {
                destination: Destination {
                    host: blue_green.active_service.clone(),
                    subset: None,
                    port,
                },
                weight: 100,
            }],
        ),
    };

    let (hosts, gateways) = if external {
        (
            vec![settings.public_host(app), app.to_string()],
            vec![settings.gateway.clone()],
        )
    } else {
        (vec![app.to_string()], Vec::new())
    };

    let mut virtual_service = VirtualService::new(
        &name,
        VirtualServiceSpec {
            hosts,
            gateways,
            http: vec![HttpRoute {
                name: plan.route_name().unwrap_or(app).to_string(),
                route,
            }],
        },
    );
    virtual_service.metadata.namespace = naming.namespace();
    virtual_service.metadata.labels = Some(naming.resource_labels(&descriptor.environment));
    Some(virtual_service)
}

/// Subset-destination resource for a routed canary
pub fn render_destination_rule(
    descriptor: &ReleaseDescriptor,
    plan: &TrafficPlan,
) -> Option<DestinationRule> {
    let routing = match plan {
        TrafficPlan::Canary(canary) => canary.routing.as_ref()?,
        TrafficPlan::Rolling | TrafficPlan::BlueGreen(_) => return None,
    };
    let naming = Naming::new(&descriptor.identity, descriptor.strategy);

    let mut rule = DestinationRule::new(
        &routing.destination_rule,
        DestinationRuleSpec {
            host: naming.base_name().to_string(),
            subsets: subsets(routing),
        },
    );
    rule.metadata.namespace = naming.namespace();
    rule.metadata.labels = Some(naming.resource_labels(&descriptor.environment));
    Some(rule)
}

fn subsets(routing: &CanaryRouting) -> Vec<Subset> {
    routing
        .subsets
        .names()
        .into_iter()
        .map(|name| Subset {
            name: name.to_string(),
            labels: Default::default(),
        })
        .collect()
}
