//! Renderer configuration structures
//!
//! Serializable settings for the meshing pipeline, loaded by the frontend
//! from its configuration file.

use ao_core::Region;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_VERTEX_COLOR;

/// Meshing and upload configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Region handed to the mesher for every render
    pub region: Region,
    /// Placeholder color written into every uploaded vertex (RGB)
    pub vertex_color: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            region: Region::default(),
            vertex_color: DEFAULT_VERTEX_COLOR,
        }
    }
}

impl RenderConfig {
    /// Use a different evaluation region
    pub fn with_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }
}
