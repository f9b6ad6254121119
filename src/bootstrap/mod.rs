//! Process bootstrap: configuration loading, tracing setup and dependency wiring.

pub mod config;
pub mod tracing;
pub mod wiring;

pub use wiring::{wire_dependencies, AppRuntime, AttachmentRepository};
