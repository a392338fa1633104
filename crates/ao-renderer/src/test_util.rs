//! Meshers and backends for pipeline tests

use std::sync::mpsc::Receiver;

use ao_core::{ExprGraph, Mesh, Mesher, NodeId, Region, TokenTree};
use parking_lot::Mutex;

use crate::backend::GraphicsBackend;
use crate::vertex::MeshVertex;

/// sqrt(x*x + y*y)
pub fn radius_graph() -> ExprGraph {
    let mut tree = TokenTree::new();
    let x = tree.x();
    let y = tree.y();
    let xx = tree.mul(x, x);
    let yy = tree.mul(y, y);
    let sum = tree.add(xx, yy);
    let root = tree.sqrt(sum);
    ExprGraph::build(&tree, root)
}

pub fn triangle() -> Mesh {
    Mesh {
        vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        triangles: vec![[0, 1, 2]],
    }
}

/// Returns the same result for every graph
pub struct StaticMesher(pub Option<Mesh>);

impl Mesher for StaticMesher {
    fn render(&self, _graph: &ExprGraph, _root: NodeId, _region: &Region) -> Option<Mesh> {
        self.0.clone()
    }
}

/// Blocks each render until the test sends on the gate
pub struct GatedMesher {
    gate: Mutex<Receiver<()>>,
    mesh: Option<Mesh>,
}

impl GatedMesher {
    pub fn new(gate: Receiver<()>, mesh: Option<Mesh>) -> Self {
        Self {
            gate: Mutex::new(gate),
            mesh,
        }
    }
}

impl Mesher for GatedMesher {
    fn render(&self, _graph: &ExprGraph, _root: NodeId, _region: &Region) -> Option<Mesh> {
        let _ = self.gate.lock().recv();
        self.mesh.clone()
    }
}

pub struct PanicMesher;

impl Mesher for PanicMesher {
    fn render(&self, _graph: &ExprGraph, _root: NodeId, _region: &Region) -> Option<Mesh> {
        panic!("mesher exploded")
    }
}

/// Counts uploads; buffers are the uploaded index count
#[derive(Default)]
pub struct RecordingBackend {
    pub uploads: usize,
}

impl GraphicsBackend for RecordingBackend {
    type Buffers = usize;

    fn upload(&mut self, _vertices: &[MeshVertex], indices: &[u32]) -> usize {
        self.uploads += 1;
        indices.len()
    }
}
