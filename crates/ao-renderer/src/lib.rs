//! ao Renderer
//!
//! Turns shape expression graphs into drawable meshes without blocking the
//! thread that owns the graphics context.
//!
//! # Architecture
//!
//! - [`shape::Shape`] - Per-shape state machine (Idle, Computing, Ready, Stale, Failed)
//! - [`worker::RenderDispatcher`] - Background mesh workers and their completion channel
//! - [`scene::Scene`] - Shape registry, drains completions on the owning thread
//! - [`backend::GraphicsBackend`] - One-shot buffer upload, with a wgpu implementation
//! - [`vertex`] - Vertex layout shared by all backends

pub mod backend;
pub mod config;
pub mod constants;
pub mod scene;
pub mod shape;
pub mod vertex;
pub mod worker;

#[cfg(test)]
mod test_util;

// Re-exports for convenience
pub use backend::{GpuMesh, GraphicsBackend, WgpuBackend};
pub use config::RenderConfig;
pub use scene::{Scene, ShapeEvent};
pub use shape::{CompletionOutcome, PipelineError, RenderState, Shape};
pub use vertex::{MeshVertex, vertex_data};
pub use worker::{Completion, JobId, RenderDispatcher, RenderStats, SharedRenderStats};
