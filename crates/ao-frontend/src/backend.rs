//! Headless graphics backend
//!
//! Packs meshes into byte buffers laid out exactly as the GPU backend would
//! upload them.

use ao_renderer::{GraphicsBackend, MeshVertex};

/// CPU-side copy of an uploaded mesh
#[derive(Debug, Clone, PartialEq)]
pub struct CpuBuffers {
    pub vertex_bytes: Vec<u8>,
    pub index_bytes: Vec<u8>,
    pub index_count: u32,
}

/// Backend keeping uploads in memory
#[derive(Debug, Default)]
pub struct CpuBackend {
    uploads: usize,
    bytes_uploaded: usize,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of uploads performed
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// Total bytes packed across all uploads
    pub fn bytes_uploaded(&self) -> usize {
        self.bytes_uploaded
    }
}

impl GraphicsBackend for CpuBackend {
    type Buffers = CpuBuffers;

    fn upload(&mut self, vertices: &[MeshVertex], indices: &[u32]) -> CpuBuffers {
        let buffers = CpuBuffers {
            vertex_bytes: bytemuck::cast_slice(vertices).to_vec(),
            index_bytes: bytemuck::cast_slice(indices).to_vec(),
            index_count: indices.len() as u32,
        };
        self.uploads += 1;
        self.bytes_uploaded += buffers.vertex_bytes.len() + buffers.index_bytes.len();
        tracing::debug!(
            "Packed {} vertices, {} indices",
            vertices.len(),
            indices.len()
        );
        buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_layout() {
        let mut backend = CpuBackend::new();
        let vertices = [
            MeshVertex {
                position: [1.0, 2.0, 3.0],
                color: [1.0, 1.0, 1.0],
            };
            3
        ];
        let buffers = backend.upload(&vertices, &[0, 1, 2]);

        assert_eq!(buffers.vertex_bytes.len(), 3 * 24);
        assert_eq!(buffers.index_bytes.len(), 12);
        assert_eq!(buffers.index_count, 3);
        let expected: &[u8] = bytemuck::cast_slice(&[1.0f32, 2.0, 3.0, 1.0, 1.0, 1.0]);
        assert_eq!(&buffers.vertex_bytes[..24], expected);
        assert_eq!(backend.uploads(), 1);
        assert_eq!(backend.bytes_uploaded(), 84);
    }
}
