//! Voxel boundary mesher
//!
//! Samples the function at voxel centres and emits a quad for every face
//! between an inside voxel (value < 0) and an outside one. Voxels beyond the
//! region count as outside, so the result is always closed.

use std::collections::HashMap;

use glam::{UVec3, Vec3};

use super::{Mesh, Mesher, Region};
use crate::graph::{ExprGraph, NodeId};

/// Blocky reference mesher
///
/// # Panics
/// If the region exceeds the voxel limit; see [`Region::voxel_count`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelMesher;

impl Mesher for VoxelMesher {
    fn render(&self, graph: &ExprGraph, root: NodeId, region: &Region) -> Option<Mesh> {
        let counts = UVec3::from_array(region.voxel_counts());
        let step = region.voxel_size();
        let mut eval = graph.evaluator(root);

        let total = match region.voxel_count() {
            Ok(total) => total,
            Err(err) => panic!("{}", err),
        };

        let (nx, ny) = (counts.x as usize, counts.y as usize);
        let index = |c: UVec3| c.x as usize + nx * (c.y as usize + ny * c.z as usize);
        let mut inside = vec![false; total];
        for z in 0..counts.z {
            for y in 0..counts.y {
                for x in 0..counts.x {
                    let cell = UVec3::new(x, y, z);
                    let centre = region.min + (cell.as_vec3() + 0.5) * step;
                    inside[index(cell)] = eval.eval(centre) < 0.0;
                }
            }
        }

        let mut faces = FaceBuilder::new(region.min, step);
        for z in 0..counts.z {
            for y in 0..counts.y {
                for x in 0..counts.x {
                    let cell = UVec3::new(x, y, z);
                    if !inside[index(cell)] {
                        continue;
                    }
                    for axis in 0..3 {
                        for positive in [false, true] {
                            let neighbour = if positive {
                                (cell[axis] + 1 < counts[axis]).then(|| {
                                    let mut n = cell;
                                    n[axis] += 1;
                                    n
                                })
                            } else {
                                cell[axis].checked_sub(1).map(|v| {
                                    let mut n = cell;
                                    n[axis] = v;
                                    n
                                })
                            };
                            if neighbour.is_none_or(|n| !inside[index(n)]) {
                                faces.push(cell, axis, positive);
                            }
                        }
                    }
                }
            }
        }

        tracing::debug!(
            "Voxel mesher: {:?} voxels -> {} triangles",
            counts,
            faces.mesh.triangles.len()
        );

        let mesh = faces.mesh;
        (!mesh.is_empty()).then_some(mesh)
    }
}

/// Accumulates quads on the voxel lattice, sharing corner vertices
struct FaceBuilder {
    origin: Vec3,
    step: Vec3,
    corners: HashMap<UVec3, u32>,
    mesh: Mesh,
}

impl FaceBuilder {
    fn new(origin: Vec3, step: Vec3) -> Self {
        Self {
            origin,
            step,
            corners: HashMap::new(),
            mesh: Mesh::new(),
        }
    }

    fn corner(&mut self, lattice: UVec3) -> u32 {
        if let Some(&i) = self.corners.get(&lattice) {
            return i;
        }
        let i = self.mesh.vertices.len() as u32;
        let position = self.origin + lattice.as_vec3() * self.step;
        self.mesh.vertices.push(position.to_array());
        self.corners.insert(lattice, i);
        i
    }

    /// Add the face of `cell` facing along `axis`, wound outward
    fn push(&mut self, cell: UVec3, axis: usize, positive: bool) {
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;

        let mut base = cell;
        if positive {
            base[axis] += 1;
        }
        let offset = |du: u32, dv: u32| {
            let mut c = base;
            c[u] += du;
            c[v] += dv;
            c
        };

        let mut quad = [
            self.corner(offset(0, 0)),
            self.corner(offset(1, 0)),
            self.corner(offset(1, 1)),
            self.corner(offset(0, 1)),
        ];
        if !positive {
            quad.reverse();
        }

        self.mesh.triangles.push([quad[0], quad[1], quad[2]]);
        self.mesh.triangles.push([quad[0], quad[2], quad[3]]);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::token::TokenTree;

    fn sphere(radius: f32) -> ExprGraph {
        let mut tree = TokenTree::new();
        let x = tree.x();
        let y = tree.y();
        let z = tree.z();
        let xx = tree.mul(x, x);
        let yy = tree.mul(y, y);
        let zz = tree.mul(z, z);
        let xy = tree.add(xx, yy);
        let sum = tree.add(xy, zz);
        let len = tree.sqrt(sum);
        let r = tree.mutable(radius);
        let root = tree.sub(len, r);
        ExprGraph::build(&tree, root)
    }

    #[test]
    fn test_sphere_mesh() {
        let graph = sphere(0.5);
        let mesh = VoxelMesher
            .render(&graph, graph.root().unwrap(), &Region::default())
            .unwrap();

        assert!(!mesh.is_empty());
        for tri in &mesh.triangles {
            for &i in tri {
                assert!((i as usize) < mesh.vertices.len());
            }
        }

        let (min, max) = mesh.bounds().unwrap();
        assert!(min.cmpge(Vec3::splat(-0.65)).all());
        assert!(max.cmple(Vec3::splat(0.65)).all());
        assert!(max.x > 0.35 && min.x < -0.35);
    }

    #[test]
    fn test_mesh_is_closed() {
        let graph = sphere(0.4);
        let mesh = VoxelMesher
            .render(&graph, graph.root().unwrap(), &Region::default())
            .unwrap();

        // Every directed edge must be matched by its reverse
        let mut edges: HashMap<(u32, u32), i32> = HashMap::new();
        for [a, b, c] in &mesh.triangles {
            for (p, q) in [(*a, *b), (*b, *c), (*c, *a)] {
                *edges.entry((p.min(q), p.max(q))).or_default() += if p < q { 1 } else { -1 };
            }
        }
        assert!(edges.values().all(|&n| n == 0));
    }

    #[test]
    fn test_empty_function() {
        let mut tree = TokenTree::new();
        let c = tree.constant(1.0);
        let graph = ExprGraph::build(&tree, c);
        assert!(
            VoxelMesher
                .render(&graph, graph.root().unwrap(), &Region::default())
                .is_none()
        );
    }

    #[test]
    fn test_full_region_is_boxed() {
        let mut tree = TokenTree::new();
        let c = tree.constant(-1.0);
        let graph = ExprGraph::build(&tree, c);
        let region = Region::cube(1.0, 2);
        let mesh = VoxelMesher
            .render(&graph, graph.root().unwrap(), &region)
            .unwrap();

        // 4x4 faces on each of the 6 sides, two triangles each
        assert_eq!(mesh.triangle_count(), 6 * 16 * 2);
        assert_eq!(mesh.vertices.len(), 5 * 5 * 5 - 3 * 3 * 3);
    }
}
