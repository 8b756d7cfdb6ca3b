//! Domain layer - pure business logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod content;
pub mod naming;
pub mod release;
pub mod strategy;

// Re-export commonly used types
pub use content::{ConfigFiles, ResolvedConfig};
pub use naming::{ConfigScope, Naming, ResourceNames, Role};
pub use release::{
    ConfigGroup, EnvVarSpec, Exposure, Identity, ImageRef, PortSpec, ReleaseDescriptor, Strategy,
};
pub use strategy::{BlueGreenPlan, CanaryPlan, CanaryRouting, CanaryStep, SubsetNames, TrafficPlan};
