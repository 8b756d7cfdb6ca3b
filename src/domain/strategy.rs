//! Traffic strategy engine
//!
//! Computes one [`TrafficPlan`] per release. The plan owns every name the
//! rollout and the routing resources must agree on (subsets, route, active
//! and preview services), and both renderers read it by reference.

use super::naming::{Naming, Role};
use super::release::{Exposure, ReleaseDescriptor, Strategy};

/// Route name shared by the VirtualService and the rollout's traffic routing
pub const CANARY_ROUTE: &str = "primary";
/// Seconds the previous active revision stays up after a blue-green cutover
pub const SCALE_DOWN_DELAY_SECONDS: i32 = 30;

/// One step of a canary schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanaryStep {
    /// Percentage of traffic sent to the canary subset
    SetWeight(i32),
    /// Pause in seconds
    Pause(i32),
}

/// The progressive schedule interpreted by the rollout controller
pub fn canary_schedule() -> Vec<CanaryStep> {
    vec![
        CanaryStep::SetWeight(20),
        CanaryStep::Pause(30),
        CanaryStep::SetWeight(50),
        CanaryStep::Pause(60),
        CanaryStep::SetWeight(100),
    ]
}

/// Subset identifiers addressed by the routing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetNames {
    pub stable: Role,
    pub canary: Role,
}

impl Default for SubsetNames {
    fn default() -> Self {
        Self {
            stable: Role::Stable,
            canary: Role::Canary,
        }
    }
}

impl SubsetNames {
    pub fn stable_name(&self) -> &'static str {
        self.stable.as_str()
    }

    pub fn canary_name(&self) -> &'static str {
        self.canary.as_str()
    }

    /// Stable first, then canary
    pub fn names(&self) -> [&'static str; 2] {
        [self.stable_name(), self.canary_name()]
    }
}

/// References from the rollout to the mesh resources it steers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanaryRouting {
    pub virtual_service: String,
    pub route: String,
    pub destination_rule: String,
    pub subsets: SubsetNames,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanaryPlan {
    pub steps: Vec<CanaryStep>,
    /// `None` without an http port: the rollout falls back to replica-weighted canary
    pub routing: Option<CanaryRouting>,
}

impl CanaryPlan {
    /// Canary weight in effect once `completed` steps have run
    pub fn weight_after(&self, completed: usize) -> i32 {
        self.steps
            .iter()
            .take(completed)
            .filter_map(|step| match step {
                CanaryStep::SetWeight(weight) => Some(*weight),
                CanaryStep::Pause(_) => None,
            })
            .last()
            .unwrap_or(0)
    }

    /// Canary weight at render time, before the controller runs any step
    pub fn current_weight(&self) -> i32 {
        self.weight_after(0)
    }

    pub fn stable_weight(&self) -> i32 {
        100 - self.current_weight()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlueGreenPlan {
    pub active_service: String,
    pub preview_service: String,
    pub auto_promotion_enabled: bool,
    pub scale_down_delay_seconds: i32,
}

/// Strategy-specific parameters for one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficPlan {
    Rolling,
    Canary(CanaryPlan),
    BlueGreen(BlueGreenPlan),
}

impl TrafficPlan {
    /// Build the plan for a descriptor
    pub fn for_release(descriptor: &ReleaseDescriptor) -> Self {
        let naming = Naming::new(&descriptor.identity, descriptor.strategy);

        match descriptor.strategy {
            Strategy::Normal => Self::Rolling,
            Strategy::Canary => {
                let routing = descriptor.http_port().map(|_| CanaryRouting {
                    virtual_service: naming.base_name().to_string(),
                    route: CANARY_ROUTE.to_string(),
                    destination_rule: naming.base_name().to_string(),
                    subsets: SubsetNames::default(),
                });
                Self::Canary(CanaryPlan {
                    steps: canary_schedule(),
                    routing,
                })
            }
            Strategy::BlueGreen => Self::BlueGreen(BlueGreenPlan {
                active_service: naming.qualified_name(Some(Role::Active)),
                preview_service: naming.qualified_name(Some(Role::Preview)),
                // Internal releases promote on their own; external ones wait for a manual promote
                auto_promotion_enabled: descriptor.exposure == Exposure::Internal,
                scale_down_delay_seconds: SCALE_DOWN_DELAY_SECONDS,
            }),
        }
    }

    /// Route name the VirtualService must use, if the plan pins one
    pub fn route_name(&self) -> Option<&str> {
        match self {
            Self::Canary(CanaryPlan {
                routing: Some(routing),
                ..
            }) => Some(&routing.route),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::release::fixtures;

    #[test]
    fn test_canary_schedule_is_fixed() {
        let plan =
            TrafficPlan::for_release(&fixtures::orders(Strategy::Canary, Exposure::External));
        let TrafficPlan::Canary(canary) = plan else {
            panic!("expected canary plan");
        };

        assert_eq!(
            canary.steps,
            vec![
                CanaryStep::SetWeight(20),
                CanaryStep::Pause(30),
                CanaryStep::SetWeight(50),
                CanaryStep::Pause(60),
                CanaryStep::SetWeight(100),
            ]
        );
        let routing = canary.routing.unwrap();
        assert_eq!(routing.subsets.names(), ["stable", "canary"]);
        assert_eq!(routing.route, "primary");
        assert_eq!(routing.virtual_service, "orders");
        assert_eq!(routing.destination_rule, "orders");
    }

    #[test]
    fn test_canary_weights() {
        let canary = CanaryPlan {
            steps: canary_schedule(),
            routing: None,
        };
        assert_eq!(canary.current_weight(), 0);
        assert_eq!(canary.stable_weight(), 100);
        assert_eq!(canary.weight_after(1), 20);
        assert_eq!(canary.weight_after(2), 20);
        assert_eq!(canary.weight_after(3), 50);
        assert_eq!(canary.weight_after(5), 100);
    }

    #[test]
    fn test_canary_without_http_port_has_no_routing() {
        let mut descriptor = fixtures::orders(Strategy::Canary, Exposure::External);
        descriptor.ports.clear();
        let TrafficPlan::Canary(canary) = TrafficPlan::for_release(&descriptor) else {
            panic!("expected canary plan");
        };
        assert!(canary.routing.is_none());
        assert_eq!(canary.steps.len(), 5);
    }

    #[test]
    fn test_auto_promotion_matrix() {
        for exposure in [Exposure::Internal, Exposure::External] {
            for strategy in Strategy::all() {
                let plan = TrafficPlan::for_release(&fixtures::orders(strategy, exposure));
                match (strategy, plan) {
                    (Strategy::BlueGreen, TrafficPlan::BlueGreen(bg)) => {
                        assert_eq!(bg.auto_promotion_enabled, exposure == Exposure::Internal);
                        assert_eq!(bg.active_service, "orders-active");
                        assert_eq!(bg.preview_service, "orders-preview");
                        assert_eq!(bg.scale_down_delay_seconds, 30);
                    }
                    (Strategy::Canary, TrafficPlan::Canary(_)) => {}
                    (Strategy::Normal, TrafficPlan::Rolling) => {}
                    (strategy, plan) => panic!("{:?} produced {:?}", strategy, plan),
                }
            }
        }
    }

    #[test]
    fn test_route_name_only_for_routed_canary() {
        let canary =
            TrafficPlan::for_release(&fixtures::orders(Strategy::Canary, Exposure::Internal));
        assert_eq!(canary.route_name(), Some("primary"));

        let rolling =
            TrafficPlan::for_release(&fixtures::orders(Strategy::Normal, Exposure::External));
        assert_eq!(rolling.route_name(), None);
    }
}
