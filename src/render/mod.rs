//! Renderers turning a descriptor and its traffic plan into cluster resources

pub mod config_map;
pub mod manifest;
pub mod network;
pub mod workload;

pub use config_map::{materialize, MaterializedConfig};
pub use manifest::{assemble, ManifestBundle};
pub use network::{render_destination_rule, render_services, render_virtual_service};
pub use workload::{render_workload, Workload};
