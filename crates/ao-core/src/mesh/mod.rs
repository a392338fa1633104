//! Meshes and the meshing collaborator
//!
//! The pipeline only sees meshing through the [`Mesher`] trait. A simple
//! [`VoxelMesher`] is provided for previews and tests.

mod voxel;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_REGION_HALF_SIZE, DEFAULT_REGION_RESOLUTION, MAX_REGION_VOXELS};
use crate::graph::{ExprGraph, NodeId};

pub use voxel::VoxelMesher;

/// Triangle mesh produced by a [`Mesher`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub vertices: Vec<[f32; 3]>,
    /// Triangles as vertex index triples
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the mesh has nothing to draw
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounds of the vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.vertices.iter().map(|v| Vec3::from_array(*v));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("Region of {0:?} voxels exceeds the limit of {max}", max = MAX_REGION_VOXELS)]
    TooLarge([u32; 3]),
}

/// Axis-aligned evaluation region with a sampling resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min: Vec3,
    pub max: Vec3,
    /// Voxels per unit length
    pub resolution: u32,
}

impl Default for Region {
    fn default() -> Self {
        Self::cube(DEFAULT_REGION_HALF_SIZE, DEFAULT_REGION_RESOLUTION)
    }
}

impl Region {
    pub fn new(min: Vec3, max: Vec3, resolution: u32) -> Self {
        Self {
            min,
            max,
            resolution,
        }
    }

    /// Cube centered on the origin
    pub fn cube(half_size: f32, resolution: u32) -> Self {
        Self::new(Vec3::splat(-half_size), Vec3::splat(half_size), resolution)
    }

    /// Number of voxels along each axis (at least one)
    pub fn voxel_counts(&self) -> [u32; 3] {
        let size = (self.max - self.min).max(Vec3::ZERO) * self.resolution as f32;
        size.ceil().to_array().map(|n| (n as u32).max(1))
    }

    /// Total number of voxels sampled by a mesher
    pub fn voxel_count(&self) -> Result<usize, RegionError> {
        let counts = self.voxel_counts();
        counts
            .iter()
            .try_fold(1usize, |total, &n| total.checked_mul(n as usize))
            .filter(|&total| total <= MAX_REGION_VOXELS)
            .ok_or(RegionError::TooLarge(counts))
    }

    /// Edge lengths of a single voxel
    pub fn voxel_size(&self) -> Vec3 {
        let [nx, ny, nz] = self.voxel_counts();
        (self.max - self.min) / Vec3::new(nx as f32, ny as f32, nz as f32)
    }
}

/// Turns an implicit function into a triangle mesh
///
/// Implementations run on background workers and must treat the graph as
/// read-only. Returning `None` means the function has no surface in the
/// region, which is not an error.
pub trait Mesher: Send + Sync {
    fn render(&self, graph: &ExprGraph, root: NodeId, region: &Region) -> Option<Mesh>;
}
