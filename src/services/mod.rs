//! Services layer - orchestration logic
//!
//! This module coordinates between domain logic and infrastructure.
//! Services resolve sources through infrastructure adapters, then hand plain
//! values to the compiler.

pub mod render_service;

// Re-export commonly used types
pub use render_service::RenderService;
