//! Core data model for function-represented solids
//!
//! - [`opcode`] - The closed operator set shared by tokens and nodes
//! - [`token`] - Token trees produced by the parser
//! - [`graph`] - Deduplicated expression DAG, serialization and evaluation
//! - [`mesh`] - Meshes, evaluation regions and the meshing interface

pub mod constants;
pub mod graph;
pub mod mesh;
pub mod opcode;
pub mod token;

// Re-exports for convenience
pub use graph::{Atom, Evaluator, ExprDisplay, ExprGraph, GraphError, NodeId};
pub use mesh::{Mesh, Mesher, Region, RegionError, VoxelMesher};
pub use opcode::Opcode;
pub use token::{Token, TokenError, TokenId, TokenTree};
