//! Token trees handed over by the parser
//!
//! Tokens are stored in an append-only arena. A token's identity is its
//! [`TokenId`]; two tokens with identical content are still distinct.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::opcode::Opcode;

/// Identity of a token within a [`TokenTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(u32);

impl TokenId {
    /// Position of the token in its tree
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single parsed token
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub op: Opcode,
    /// Literal value for `Const` and `Mutable` tokens
    pub value: Option<f32>,
    pub a: Option<TokenId>,
    pub b: Option<TokenId>,
}

/// Reasons a token cannot join a tree
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TokenError {
    #[error("Invalid opcode in token")]
    InvalidOpcode,

    #[error("{op:?} token has {operands} operands")]
    Arity { op: Opcode, operands: usize },

    #[error("Token has a right operand without a left one")]
    RightWithoutLeft,

    #[error("{0:?} token literal mismatch")]
    Literal(Opcode),

    #[error("Forward reference to token {0}")]
    ForwardReference(usize),
}

/// Arena of tokens where children always precede their parents
///
/// Deserialization replays every token through [`TokenTree::try_push`], so a
/// loaded tree holds the same guarantees as one built in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTokenTree")]
pub struct TokenTree {
    tokens: Vec<Token>,
}

#[derive(Deserialize)]
#[serde(rename = "TokenTree")]
struct RawTokenTree {
    tokens: Vec<Token>,
}

impl TryFrom<RawTokenTree> for TokenTree {
    type Error = TokenError;

    fn try_from(raw: RawTokenTree) -> Result<Self, Self::Error> {
        let mut tree = TokenTree::new();
        for token in raw.tokens {
            tree.try_push(token)?;
        }
        Ok(tree)
    }
}

impl TokenTree {
    /// Create an empty token tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token and return its identity
    ///
    /// # Panics
    /// If the operand count or literal does not match `op`, if `op` is
    /// `Invalid`, or if a child refers to a token that does not exist yet.
    pub fn push(&mut self, token: Token) -> TokenId {
        match self.try_push(token) {
            Ok(id) => id,
            Err(err) => panic!("{}", err),
        }
    }

    /// Append a token after checking it against the tree
    pub fn try_push(&mut self, token: Token) -> Result<TokenId, TokenError> {
        if token.op == Opcode::Invalid {
            return Err(TokenError::InvalidOpcode);
        }

        let operands = token.a.is_some() as usize + token.b.is_some() as usize;
        if operands != token.op.arity() {
            return Err(TokenError::Arity {
                op: token.op,
                operands,
            });
        }
        if token.b.is_some() && token.a.is_none() {
            return Err(TokenError::RightWithoutLeft);
        }
        if token.value.is_some() != token.op.is_leaf_value() {
            return Err(TokenError::Literal(token.op));
        }

        for child in [token.a, token.b].into_iter().flatten() {
            if child.index() >= self.tokens.len() {
                return Err(TokenError::ForwardReference(child.index()));
            }
        }

        let id = TokenId(self.tokens.len() as u32);
        self.tokens.push(token);
        Ok(id)
    }

    /// Fixed literal
    pub fn constant(&mut self, value: f32) -> TokenId {
        self.push(Token {
            op: Opcode::Const,
            value: Some(value),
            a: None,
            b: None,
        })
    }

    /// Tunable parameter with an initial value
    pub fn mutable(&mut self, value: f32) -> TokenId {
        self.push(Token {
            op: Opcode::Mutable,
            value: Some(value),
            a: None,
            b: None,
        })
    }

    pub fn x(&mut self) -> TokenId {
        self.leaf(Opcode::AxisX)
    }

    pub fn y(&mut self) -> TokenId {
        self.leaf(Opcode::AxisY)
    }

    pub fn z(&mut self) -> TokenId {
        self.leaf(Opcode::AxisZ)
    }

    fn leaf(&mut self, op: Opcode) -> TokenId {
        self.push(Token {
            op,
            value: None,
            a: None,
            b: None,
        })
    }

    /// Unary operation over `a`
    pub fn unary(&mut self, op: Opcode, a: TokenId) -> TokenId {
        self.push(Token {
            op,
            value: None,
            a: Some(a),
            b: None,
        })
    }

    /// Binary operation over `a` and `b`
    pub fn binary(&mut self, op: Opcode, a: TokenId, b: TokenId) -> TokenId {
        self.push(Token {
            op,
            value: None,
            a: Some(a),
            b: Some(b),
        })
    }

    pub fn add(&mut self, a: TokenId, b: TokenId) -> TokenId {
        self.binary(Opcode::Add, a, b)
    }

    pub fn sub(&mut self, a: TokenId, b: TokenId) -> TokenId {
        self.binary(Opcode::Sub, a, b)
    }

    pub fn mul(&mut self, a: TokenId, b: TokenId) -> TokenId {
        self.binary(Opcode::Mul, a, b)
    }

    pub fn div(&mut self, a: TokenId, b: TokenId) -> TokenId {
        self.binary(Opcode::Div, a, b)
    }

    pub fn min(&mut self, a: TokenId, b: TokenId) -> TokenId {
        self.binary(Opcode::Min, a, b)
    }

    pub fn max(&mut self, a: TokenId, b: TokenId) -> TokenId {
        self.binary(Opcode::Max, a, b)
    }

    pub fn sqrt(&mut self, a: TokenId) -> TokenId {
        self.unary(Opcode::Sqrt, a)
    }

    pub fn neg(&mut self, a: TokenId) -> TokenId {
        self.unary(Opcode::Neg, a)
    }

    pub fn abs(&mut self, a: TokenId) -> TokenId {
        self.unary(Opcode::Abs, a)
    }

    /// Look up a token by identity
    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if the tree has no tokens
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over tokens in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Token)> {
        self.tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (TokenId(i as u32), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_tokens_are_distinct() {
        let mut tree = TokenTree::new();
        let a = tree.x();
        let b = tree.x();
        assert_ne!(a, b);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_children_recorded() {
        let mut tree = TokenTree::new();
        let x = tree.x();
        let one = tree.constant(1.0);
        let sum = tree.add(x, one);

        let token = tree.get(sum).unwrap();
        assert_eq!(token.op, Opcode::Add);
        assert_eq!(token.a, Some(x));
        assert_eq!(token.b, Some(one));
        assert_eq!(token.value, None);
    }

    #[test]
    #[should_panic(expected = "operands")]
    fn test_arity_mismatch_rejected() {
        let mut tree = TokenTree::new();
        let x = tree.x();
        tree.push(Token {
            op: Opcode::Add,
            value: None,
            a: Some(x),
            b: None,
        });
    }

    #[test]
    #[should_panic(expected = "Forward reference")]
    fn test_forward_reference_rejected() {
        let mut tree = TokenTree::new();
        let x = tree.x();
        tree.push(Token {
            op: Opcode::Neg,
            value: None,
            a: Some(TokenId(x.0 + 5)),
            b: None,
        });
    }

    #[test]
    fn test_try_push_reports_error() {
        let mut tree = TokenTree::new();
        let err = tree
            .try_push(Token {
                op: Opcode::Const,
                value: None,
                a: None,
                b: None,
            })
            .unwrap_err();
        assert_eq!(err, TokenError::Literal(Opcode::Const));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut tree = TokenTree::new();
        let x = tree.x();
        let r = tree.mutable(0.5);
        tree.sub(x, r);

        let text = ron::to_string(&tree).unwrap();
        let loaded: TokenTree = ron::from_str(&text).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.get(r), tree.get(r));
    }

    #[test]
    fn test_malformed_ron_rejected() {
        // Add with one operand
        let arity = "(tokens: [\
            (op: AxisX, value: None, a: None, b: None),\
            (op: Add, value: None, a: Some(TokenId(0)), b: None),\
        ])";
        assert!(ron::from_str::<TokenTree>(arity).is_err());

        // Token referring to itself
        let cycle = "(tokens: [(op: Neg, value: None, a: Some(TokenId(0)), b: None)])";
        let err = ron::from_str::<TokenTree>(cycle).unwrap_err();
        assert!(err.to_string().contains("Forward reference"));
    }

    #[test]
    #[should_panic(expected = "Invalid opcode")]
    fn test_invalid_opcode_rejected() {
        let mut tree = TokenTree::new();
        tree.push(Token {
            op: Opcode::Invalid,
            value: None,
            a: None,
            b: None,
        });
    }
}
