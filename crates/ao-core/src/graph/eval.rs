//! Point evaluation of expression graphs

use glam::Vec3;

use super::{ExprGraph, NodeId};
use crate::opcode::Opcode;

#[derive(Debug, Clone, Copy)]
struct Step {
    op: Opcode,
    value: f32,
    a: usize,
    b: usize,
}

/// Flattened evaluator for the function rooted at one node
///
/// Only nodes reachable from the root are kept, in arena order. `Mutable`
/// values are captured when the evaluator is created.
#[derive(Debug, Clone)]
pub struct Evaluator {
    steps: Vec<Step>,
    slots: Vec<f32>,
}

impl Evaluator {
    pub fn new(graph: &ExprGraph, root: NodeId) -> Self {
        let mut reachable = vec![false; graph.len()];
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut reachable[node.index()], true) {
                continue;
            }
            let atom = graph.atom(node);
            stack.extend(atom.left);
            stack.extend(atom.right);
        }

        // Arena index -> slot
        let mut slot_of = vec![usize::MAX; graph.len()];
        let mut steps = Vec::new();
        for (node, atom) in graph.iter().filter(|(n, _)| reachable[n.index()]) {
            let slot = |child: Option<NodeId>| child.map_or(0, |c| slot_of[c.index()]);
            steps.push(Step {
                op: atom.op,
                value: graph.value(node).unwrap_or(f32::NAN),
                a: slot(atom.left),
                b: slot(atom.right),
            });
            slot_of[node.index()] = steps.len() - 1;
        }

        let slots = vec![0.0; steps.len()];
        Self { steps, slots }
    }

    /// Number of operations evaluated per point
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Evaluate the function at `p`
    pub fn eval(&mut self, p: Vec3) -> f32 {
        for (i, step) in self.steps.iter().enumerate() {
            let a = self.slots[step.a];
            let b = self.slots[step.b];
            self.slots[i] = match step.op {
                Opcode::Const | Opcode::Mutable => step.value,
                Opcode::AxisX => p.x,
                Opcode::AxisY => p.y,
                Opcode::AxisZ => p.z,
                Opcode::Add => a + b,
                Opcode::Sub => a - b,
                Opcode::Mul => a * b,
                Opcode::Div => a / b,
                Opcode::Min => a.min(b),
                Opcode::Max => a.max(b),
                Opcode::Sqrt => a.sqrt(),
                Opcode::Neg => -a,
                Opcode::Abs => a.abs(),
                Opcode::Invalid => unreachable!("Invalid opcode in expression graph"),
            };
        }
        self.slots.last().copied().unwrap_or(f32::NAN)
    }
}
