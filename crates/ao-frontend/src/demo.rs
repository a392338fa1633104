//! Built-in demo shapes

use std::str::FromStr;

use ao_core::{ExprGraph, NodeId, TokenId, TokenTree};

use crate::error::FrontendError;

/// Shapes the preview can build without a parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// Sphere with a tunable radius
    Sphere,
    /// Capped cylinder along Z with a tunable radius
    Cylinder,
    /// Cube from `max`/`abs`
    Cube,
}

/// A demo graph and its tunable parameter, if any
pub struct DemoShape {
    pub graph: ExprGraph,
    pub parameter: Option<NodeId>,
}

impl Demo {
    pub const ALL: [Demo; 3] = [Demo::Sphere, Demo::Cylinder, Demo::Cube];

    pub fn name(self) -> &'static str {
        match self {
            Demo::Sphere => "sphere",
            Demo::Cylinder => "cylinder",
            Demo::Cube => "cube",
        }
    }

    pub fn build(self) -> DemoShape {
        let mut tree = TokenTree::new();
        let (root, parameter) = match self {
            Demo::Sphere => {
                let r = tree.mutable(0.6);
                let x = tree.x();
                let y = tree.y();
                let z = tree.z();
                let xx = tree.mul(x, x);
                let yy = tree.mul(y, y);
                let zz = tree.mul(z, z);
                let xy = tree.add(xx, yy);
                let sum = tree.add(xy, zz);
                let len = tree.sqrt(sum);
                (tree.sub(len, r), Some(r))
            }
            Demo::Cylinder => {
                let r = tree.mutable(0.5);
                let radius = radius_2d(&mut tree);
                let side = tree.sub(radius, r);
                let z = tree.z();
                let az = tree.abs(z);
                let h = tree.constant(0.8);
                let cap = tree.sub(az, h);
                (tree.max(side, cap), Some(r))
            }
            Demo::Cube => {
                let h = tree.constant(0.5);
                let axes = [tree.x(), tree.y(), tree.z()];
                let faces = axes.map(|axis| {
                    let a = tree.abs(axis);
                    tree.sub(a, h)
                });
                let xy = tree.max(faces[0], faces[1]);
                (tree.max(xy, faces[2]), None)
            }
        };

        let graph = ExprGraph::build(&tree, root);
        let parameter = parameter.and_then(|p| graph.node_for_token(p));
        DemoShape { graph, parameter }
    }
}

/// sqrt(x*x + y*y)
fn radius_2d(tree: &mut TokenTree) -> TokenId {
    let x = tree.x();
    let y = tree.y();
    let xx = tree.mul(x, x);
    let yy = tree.mul(y, y);
    let sum = tree.add(xx, yy);
    tree.sqrt(sum)
}

impl FromStr for Demo {
    type Err = FrontendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Demo::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| FrontendError::UnknownDemo(s.to_string()))
    }
}
