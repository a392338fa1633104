//! Expression graph
//!
//! Converts a [`TokenTree`] into a deduplicated DAG of [`Atom`]s stored in an
//! arena. Each token identity maps to at most one node, so sub-expressions
//! shared by the parser stay shared here. Construction is strictly bottom-up,
//! which also makes arena order a valid evaluation order.
//!
//! Atoms never change after construction. The current values of `Mutable`
//! leaves live in a separate table owned by the graph.

mod eval;
mod serialize;

use std::collections::HashMap;

use thiserror::Error;

use crate::opcode::Opcode;
use crate::token::{TokenId, TokenTree};

pub use eval::Evaluator;
pub use serialize::ExprDisplay;

/// Index of a node within an [`ExprGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of the expression DAG
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    pub op: Opcode,
    /// Literal for `Const`, initial value for `Mutable`, `None` otherwise
    pub value: Option<f32>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

/// Errors for editor-level graph operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),

    #[error("Node {0:?} is {1:?}, not Mutable")]
    NotMutable(NodeId, Opcode),
}

/// Arena-backed expression DAG built from a token tree
#[derive(Debug, Clone, Default)]
pub struct ExprGraph {
    atoms: Vec<Atom>,
    /// Token identity -> node built for it
    tokens: HashMap<TokenId, NodeId>,
    /// Current value of every `Mutable` node
    mutables: HashMap<NodeId, f32>,
    root: Option<NodeId>,
}

impl ExprGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for the sub-tree rooted at `root`
    pub fn build(tree: &TokenTree, root: TokenId) -> Self {
        let mut graph = Self::new();
        let node = graph.insert_subtree(tree, root);
        graph.root = Some(node);

        tracing::debug!(
            "Built expression graph: {} tokens -> {} nodes ({} mutable)",
            tree.len(),
            graph.atoms.len(),
            graph.mutables.len()
        );
        graph
    }

    /// Insert every token reachable from `root`, children first
    pub fn insert_subtree(&mut self, tree: &TokenTree, root: TokenId) -> NodeId {
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if self.tokens.contains_key(&id) {
                continue;
            }
            if expanded {
                self.insert_token(tree, id);
                continue;
            }

            let token = tree
                .get(id)
                .unwrap_or_else(|| panic!("Token {} is not in the tree", id.index()));
            stack.push((id, true));
            for child in [token.b, token.a].into_iter().flatten() {
                assert!(
                    child.index() < id.index(),
                    "Token {} refers forward to token {}",
                    id.index(),
                    child.index()
                );
                if !self.tokens.contains_key(&child) {
                    stack.push((child, false));
                }
            }
        }

        self.tokens[&root]
    }

    /// Construct the node for a single token
    ///
    /// Returns the existing node if the token was already inserted.
    ///
    /// # Panics
    /// If an operand token has no node yet. Callers must insert tokens in
    /// bottom-up order (see [`ExprGraph::insert_subtree`]).
    pub fn insert_token(&mut self, tree: &TokenTree, id: TokenId) -> NodeId {
        if let Some(&node) = self.tokens.get(&id) {
            return node;
        }

        let token = *tree
            .get(id)
            .unwrap_or_else(|| panic!("Token {} is not in the tree", id.index()));
        assert!(token.op != Opcode::Invalid, "Invalid opcode in token tree");
        let operands = token.a.is_some() as usize + token.b.is_some() as usize;
        assert_eq!(
            operands,
            token.op.arity(),
            "{:?} token {} has {} operands",
            token.op,
            id.index(),
            operands
        );

        let left = token.a.map(|child| self.operand(id, child));
        let right = token.b.map(|child| self.operand(id, child));

        let node = NodeId(self.atoms.len() as u32);
        self.atoms.push(Atom {
            op: token.op,
            value: token.value,
            left,
            right,
        });

        if token.op == Opcode::Mutable
            && let Some(value) = token.value
        {
            self.mutables.insert(node, value);
        }

        let previous = self.tokens.insert(id, node);
        assert!(
            previous.is_none(),
            "Token {} was built twice",
            id.index()
        );
        node
    }

    fn operand(&self, parent: TokenId, child: TokenId) -> NodeId {
        match self.tokens.get(&child) {
            Some(&node) => node,
            None => panic!(
                "Token {} built before its operand {}",
                parent.index(),
                child.index()
            ),
        }
    }

    /// Node built for `root` by [`ExprGraph::build`]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Node built for a token, if any
    pub fn node_for_token(&self, id: TokenId) -> Option<NodeId> {
        self.tokens.get(&id).copied()
    }

    pub fn get(&self, node: NodeId) -> Option<&Atom> {
        self.atoms.get(node.index())
    }

    /// Look up a node
    ///
    /// # Panics
    /// If `node` does not belong to this graph.
    pub fn atom(&self, node: NodeId) -> &Atom {
        &self.atoms[node.index()]
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Iterate over nodes in construction order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Atom)> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(i, atom)| (NodeId(i as u32), atom))
    }

    /// Current numeric value of a `Const` or `Mutable` node
    pub fn value(&self, node: NodeId) -> Option<f32> {
        let atom = self.get(node)?;
        match atom.op {
            Opcode::Mutable => self.mutables.get(&node).copied(),
            Opcode::Const => atom.value,
            _ => None,
        }
    }

    /// Update a `Mutable` node's value in place
    ///
    /// Node identities and topology are unaffected.
    pub fn set_mutable(&mut self, node: NodeId, value: f32) -> Result<(), GraphError> {
        let atom = self.get(node).ok_or(GraphError::UnknownNode(node))?;
        let op = atom.op;
        match self.mutables.get_mut(&node) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(GraphError::NotMutable(node, op)),
        }
    }

    /// Iterate over `Mutable` nodes and their current values
    pub fn mutables(&self) -> impl Iterator<Item = (NodeId, f32)> + '_ {
        let mut nodes: Vec<_> = self.mutables.iter().map(|(&n, &v)| (n, v)).collect();
        nodes.sort_by_key(|(n, _)| *n);
        nodes.into_iter()
    }

    /// Render a node as canonical text
    pub fn serialize(&self, node: NodeId) -> String {
        self.display(node).to_string()
    }

    /// `Display` adapter for a node
    pub fn display(&self, node: NodeId) -> ExprDisplay<'_> {
        ExprDisplay::new(self, node)
    }

    /// Compile an evaluator for the function rooted at `node`
    pub fn evaluator(&self, node: NodeId) -> Evaluator {
        Evaluator::new(self, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// sqrt(x*x + y*y)
    fn radius_tree() -> (TokenTree, TokenId) {
        let mut tree = TokenTree::new();
        let x = tree.x();
        let y = tree.y();
        let xx = tree.mul(x, x);
        let yy = tree.mul(y, y);
        let sum = tree.add(xx, yy);
        let root = tree.sqrt(sum);
        (tree, root)
    }

    #[test]
    fn test_build_shares_tokens() {
        let (tree, root) = radius_tree();
        let graph = ExprGraph::build(&tree, root);

        // One node per token; `x` is used twice by the same token identity
        assert_eq!(graph.len(), tree.len());

        let x = graph.node_for_token(tree.iter().next().unwrap().0).unwrap();
        let xx = graph
            .iter()
            .find(|(_, a)| a.op == Opcode::Mul)
            .map(|(_, a)| *a)
            .unwrap();
        assert_eq!(xx.left, Some(x));
        assert_eq!(xx.right, Some(x));
    }

    #[test]
    fn test_insert_token_is_idempotent() {
        let (tree, root) = radius_tree();
        let mut graph = ExprGraph::build(&tree, root);
        let len = graph.len();

        for (id, _) in tree.iter() {
            let first = graph.node_for_token(id).unwrap();
            let again = graph.insert_token(&tree, id);
            assert_eq!(first, again);
        }
        assert_eq!(graph.len(), len);
    }

    #[test]
    fn test_identical_content_not_merged() {
        let mut tree = TokenTree::new();
        let a = tree.x();
        let b = tree.x();
        let root = tree.add(a, b);
        let graph = ExprGraph::build(&tree, root);

        assert_eq!(graph.len(), 3);
        assert_ne!(graph.node_for_token(a), graph.node_for_token(b));
    }

    #[test]
    fn test_arity_matches_opcode() {
        let mut tree = TokenTree::new();
        let x = tree.x();
        let y = tree.y();
        let z = tree.z();
        let c = tree.constant(2.0);
        let m = tree.mutable(0.5);
        let a = tree.abs(x);
        let n = tree.neg(y);
        let s = tree.sqrt(z);
        let d = tree.div(a, c);
        let sub = tree.sub(n, m);
        let lo = tree.min(d, sub);
        let root = tree.max(lo, s);
        let graph = ExprGraph::build(&tree, root);

        for (_, atom) in graph.iter() {
            let operands = atom.left.is_some() as usize + atom.right.is_some() as usize;
            assert_eq!(operands, atom.op.arity(), "{:?}", atom.op);
            assert!(atom.right.is_none() || atom.left.is_some());
            assert_eq!(atom.value.is_some(), atom.op.is_leaf_value());
        }
    }

    #[test]
    fn test_children_precede_parents() {
        let (tree, root) = radius_tree();
        let graph = ExprGraph::build(&tree, root);
        for (id, atom) in graph.iter() {
            for child in [atom.left, atom.right].into_iter().flatten() {
                assert!(child < id);
            }
        }
        assert_eq!(graph.root(), graph.node_for_token(root));
    }

    #[test]
    #[should_panic(expected = "built before its operand")]
    fn test_out_of_order_insert_panics() {
        let (tree, root) = radius_tree();
        let mut graph = ExprGraph::new();
        graph.insert_token(&tree, root);
    }

    #[test]
    fn test_build_from_loaded_tree() {
        let text = "(tokens: [\
            (op: AxisX, value: None, a: None, b: None),\
            (op: Mutable, value: Some(0.25), a: None, b: None),\
            (op: Min, value: None, a: Some(TokenId(0)), b: Some(TokenId(1))),\
        ])";
        let tree: TokenTree = ron::from_str(text).unwrap();
        let (root, _) = tree.iter().last().unwrap();
        let graph = ExprGraph::build(&tree, root);
        assert_eq!(graph.serialize(graph.root().unwrap()), "min(X, 0.25)");
    }

    #[test]
    fn test_unreachable_tokens_skipped() {
        let mut tree = TokenTree::new();
        let x = tree.x();
        let _unused = tree.constant(9.0);
        let root = tree.neg(x);
        let graph = ExprGraph::build(&tree, root);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_set_mutable_keeps_identity() {
        let mut tree = TokenTree::new();
        let x = tree.x();
        let r = tree.mutable(1.0);
        let root = tree.sub(x, r);
        let mut graph = ExprGraph::build(&tree, root);

        let r_node = graph.node_for_token(r).unwrap();
        let root_node = graph.root().unwrap();
        let before = graph.serialize(root_node);
        let atoms_before: Vec<Atom> = graph.iter().map(|(_, a)| *a).collect();

        graph.set_mutable(r_node, 2.5).unwrap();

        assert_eq!(graph.node_for_token(r), Some(r_node));
        assert_eq!(graph.root(), Some(root_node));
        assert_eq!(graph.value(r_node), Some(2.5));
        let atoms_after: Vec<Atom> = graph.iter().map(|(_, a)| *a).collect();
        assert_eq!(atoms_before, atoms_after);

        assert_eq!(before, "(X - 1)");
        assert_eq!(graph.serialize(root_node), "(X - 2.5)");
    }

    #[test]
    fn test_set_mutable_rejects_other_nodes() {
        let mut tree = TokenTree::new();
        let c = tree.constant(1.0);
        let mut graph = ExprGraph::build(&tree, c);
        let node = graph.root().unwrap();

        assert_eq!(
            graph.set_mutable(node, 3.0),
            Err(GraphError::NotMutable(node, Opcode::Const))
        );
        assert_eq!(
            graph.set_mutable(NodeId(42), 3.0),
            Err(GraphError::UnknownNode(NodeId(42)))
        );
        assert_eq!(graph.value(node), Some(1.0));
    }

    #[test]
    fn test_mutables_listed() {
        let mut tree = TokenTree::new();
        let a = tree.mutable(1.0);
        let b = tree.mutable(2.0);
        let root = tree.max(a, b);
        let graph = ExprGraph::build(&tree, root);

        let values: Vec<f32> = graph.mutables().map(|(_, v)| v).collect();
        assert_eq!(values, vec![1.0, 2.0]);
    }
}
