//! Vertex layout for shape meshes
//!
//! Attribute offsets are computed with `std::mem::offset_of!` so they stay
//! correct if the struct layout changes.

use ao_core::Mesh;

/// Creates a vertex attribute with the offset calculated from the struct field.
#[macro_export]
macro_rules! vertex_attr {
    ($struct:ty, $field:ident, $location:expr, $format:ident) => {
        wgpu::VertexAttribute {
            offset: std::mem::offset_of!($struct, $field) as u64,
            shader_location: $location,
            format: wgpu::VertexFormat::$format,
        }
    };
}

/// Vertex uploaded for shape meshes: position plus a placeholder color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Vertex position in model space.
    pub position: [f32; 3],
    /// Vertex color (RGB).
    pub color: [f32; 3],
}

impl MeshVertex {
    /// Vertex attribute descriptors for the shader.
    pub const ATTRIBUTES: &'static [wgpu::VertexAttribute] = &[
        vertex_attr!(MeshVertex, position, 0, Float32x3),
        vertex_attr!(MeshVertex, color, 1, Float32x3),
    ];

    /// Returns the vertex buffer layout for this vertex type.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: Self::ATTRIBUTES,
        }
    }
}

/// Flatten a mesh into vertex and index arrays ready for upload.
pub fn vertex_data(mesh: &Mesh, color: [f32; 3]) -> (Vec<MeshVertex>, Vec<u32>) {
    let vertices = mesh
        .vertices
        .iter()
        .map(|&position| MeshVertex { position, color })
        .collect();
    let indices = mesh.triangles.iter().flatten().copied().collect();
    (vertices, indices)
}
