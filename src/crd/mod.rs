//! Third-party custom resource types targeted by the compiler
//!
//! Only the fields the compiler writes are modeled. Schemas are not derived:
//! these types are rendered, never installed as CRDs.

mod istio;
mod rollout;

pub use istio::{
    Destination, DestinationRule, DestinationRuleSpec, HttpRoute, HttpRouteDestination,
    PortSelector, Subset, VirtualService, VirtualServiceSpec,
};
pub use rollout::{
    BlueGreenStrategy, CanaryStepSpec, CanaryStrategy, IstioDestinationRule, IstioTrafficRouting,
    IstioVirtualService, Rollout, RolloutPause, RolloutSpec, RolloutStatus, RolloutStrategy,
    RolloutTrafficRouting,
};
