//! Canonical text form of expression nodes

use std::fmt;

use super::{ExprGraph, NodeId};
use crate::opcode::Opcode;

/// Displays the expression rooted at a node
///
/// Arithmetic is infix and fully parenthesized, `min`/`max`/`sqrt`/`abs`
/// use call syntax, negation is prefix and literals use the shortest
/// representation that round-trips.
pub struct ExprDisplay<'a> {
    graph: &'a ExprGraph,
    node: NodeId,
}

impl<'a> ExprDisplay<'a> {
    pub(super) fn new(graph: &'a ExprGraph, node: NodeId) -> Self {
        Self { graph, node }
    }
}

/// Pending output while walking the graph
enum Item {
    Node(NodeId),
    Text(&'static str),
}

fn operand(parent: NodeId, node: Option<NodeId>) -> Item {
    match node {
        Some(node) => Item::Node(node),
        None => panic!("{:?} is missing an operand", parent),
    }
}

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Explicit stack so deep graphs cannot overflow the call stack.
        // Items are pushed in reverse output order.
        let mut stack = vec![Item::Node(self.node)];

        while let Some(item) = stack.pop() {
            let node = match item {
                Item::Text(text) => {
                    f.write_str(text)?;
                    continue;
                }
                Item::Node(node) => node,
            };
            let atom = self.graph.atom(node);

            let (open, separator) = match atom.op {
                Opcode::Add => ("(", Some(" + ")),
                Opcode::Sub => ("(", Some(" - ")),
                Opcode::Mul => ("(", Some(" * ")),
                Opcode::Div => ("(", Some(" / ")),
                Opcode::Min => ("min(", Some(", ")),
                Opcode::Max => ("max(", Some(", ")),
                Opcode::Sqrt => ("sqrt(", None),
                Opcode::Abs => ("abs(", None),
                Opcode::Neg => ("(-", None),
                Opcode::Const | Opcode::Mutable => {
                    match self.graph.value(node) {
                        Some(value) => write!(f, "{}", value)?,
                        None => panic!("{:?} has no value", node),
                    }
                    continue;
                }
                Opcode::AxisX => {
                    f.write_str("X")?;
                    continue;
                }
                Opcode::AxisY => {
                    f.write_str("Y")?;
                    continue;
                }
                Opcode::AxisZ => {
                    f.write_str("Z")?;
                    continue;
                }
                Opcode::Invalid => unreachable!("Invalid opcode in expression graph"),
            };

            stack.push(Item::Text(")"));
            if let Some(separator) = separator {
                stack.push(operand(node, atom.right));
                stack.push(Item::Text(separator));
            }
            stack.push(operand(node, atom.left));
            stack.push(Item::Text(open));
        }
        Ok(())
    }
}
