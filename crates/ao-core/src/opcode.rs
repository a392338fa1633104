//! Opcode algebra shared by tokens and graph nodes

use serde::{Deserialize, Serialize};

/// Operation carried by a token or an expression node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Reserved sentinel, never present in a valid graph
    Invalid,

    /// Fixed numeric literal
    Const,
    /// Tunable parameter whose value may change after construction
    Mutable,
    AxisX,
    AxisY,
    AxisZ,

    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,

    Sqrt,
    Neg,
    Abs,
}

impl Opcode {
    /// Every opcode that may appear in a valid graph
    pub const ALL: [Opcode; 14] = [
        Opcode::Const,
        Opcode::Mutable,
        Opcode::AxisX,
        Opcode::AxisY,
        Opcode::AxisZ,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Min,
        Opcode::Max,
        Opcode::Sqrt,
        Opcode::Neg,
        Opcode::Abs,
    ];

    /// Number of child operands (0, 1 or 2)
    ///
    /// `Invalid` reports 0 so the table stays total; it is rejected
    /// wherever a node or token is constructed.
    pub fn arity(self) -> usize {
        match self {
            Opcode::Invalid
            | Opcode::Const
            | Opcode::Mutable
            | Opcode::AxisX
            | Opcode::AxisY
            | Opcode::AxisZ => 0,
            Opcode::Sqrt | Opcode::Neg | Opcode::Abs => 1,
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Min
            | Opcode::Max => 2,
        }
    }

    /// True for leaves that carry a numeric value
    pub fn is_leaf_value(self) -> bool {
        matches!(self, Opcode::Const | Opcode::Mutable)
    }

    /// Lower-case name, used for function-call syntax when serializing
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Invalid => "invalid",
            Opcode::Const => "const",
            Opcode::Mutable => "mutable",
            Opcode::AxisX => "x",
            Opcode::AxisY => "y",
            Opcode::AxisZ => "z",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Min => "min",
            Opcode::Max => "max",
            Opcode::Sqrt => "sqrt",
            Opcode::Neg => "neg",
            Opcode::Abs => "abs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_table() {
        let leaves = Opcode::ALL.iter().filter(|op| op.arity() == 0).count();
        let unary = Opcode::ALL.iter().filter(|op| op.arity() == 1).count();
        let binary = Opcode::ALL.iter().filter(|op| op.arity() == 2).count();
        assert_eq!((leaves, unary, binary), (5, 3, 6));
    }

    #[test]
    fn test_leaf_values() {
        for op in Opcode::ALL {
            let expected = op == Opcode::Const || op == Opcode::Mutable;
            assert_eq!(op.is_leaf_value(), expected, "{:?}", op);
        }
        assert!(!Opcode::Invalid.is_leaf_value());
    }

    #[test]
    fn test_invalid_not_in_all() {
        assert!(!Opcode::ALL.contains(&Opcode::Invalid));
    }
}
