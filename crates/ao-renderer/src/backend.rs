//! Graphics backends
//!
//! Buffer creation is hidden behind [`GraphicsBackend`] so the pipeline can
//! run against wgpu or a headless implementation. Backends are only ever
//! called from the thread that owns the scene.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::vertex::MeshVertex;

/// Creates GPU resources for a finished mesh.
pub trait GraphicsBackend {
    /// Resources owned by a shape once its mesh has been uploaded.
    type Buffers;

    /// Upload vertex and index data, returning the created resources.
    fn upload(&mut self, vertices: &[MeshVertex], indices: &[u32]) -> Self::Buffers;
}

/// GPU buffers for one shape mesh.
pub struct GpuMesh {
    /// Vertex buffer containing mesh geometry.
    pub vertex_buffer: wgpu::Buffer,
    /// Index buffer for indexed drawing.
    pub index_buffer: wgpu::Buffer,
    /// Number of indices.
    pub index_count: u32,
}

impl GpuMesh {
    /// Record the draw call into a pass whose pipeline is already bound.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Backend creating static wgpu buffers.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
}

impl WgpuBackend {
    /// Create a backend uploading to `device`.
    pub fn new(device: Arc<wgpu::Device>) -> Self {
        Self { device }
    }
}

impl GraphicsBackend for WgpuBackend {
    type Buffers = GpuMesh;

    fn upload(&mut self, vertices: &[MeshVertex], indices: &[u32]) -> GpuMesh {
        tracing::info!(
            "Uploading shape mesh: {} vertices, {} indices",
            vertices.len(),
            indices.len()
        );

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Shape Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Shape Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}
