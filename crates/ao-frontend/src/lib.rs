//! ao Frontend
//!
//! Headless preview: loads configuration, schedules renders for edited
//! shapes and uploads finished meshes.

pub mod backend;
pub mod config;
pub mod demo;
pub mod error;
pub mod preview;

// Re-exports for convenience
pub use backend::{CpuBackend, CpuBuffers};
pub use config::{AppConfig, ConfigError, ConfigManager, SharedConfig};
pub use demo::{Demo, DemoShape};
pub use error::FrontendError;
pub use preview::Preview;
