//! Global constants for ao-core

/// Half edge length of the default evaluation cube
pub const DEFAULT_REGION_HALF_SIZE: f32 = 1.0;

/// Default voxels per unit length
pub const DEFAULT_REGION_RESOLUTION: u32 = 10;

/// Upper bound on the voxels a region may sample
pub const MAX_REGION_VOXELS: usize = 1 << 26;
