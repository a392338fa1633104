//! Global constants for ao-renderer

/// Placeholder vertex color (white, RGB)
pub const DEFAULT_VERTEX_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Prefix for mesh worker thread names
pub const WORKER_THREAD_PREFIX: &str = "ao-mesh";
