//! The Sable syntax forest.
//!
//! The parser and macro expander (external to this workspace) produce an
//! [`Ast`]: an arena of immutable nodes, each carrying a source
//! [`Position`] and a closed [`NodeKind`] describing the construct. The
//! type resolver walks this forest exactly once per compilation unit and
//! never mutates it.
//!
//! Node kinds form a closed sum type so every consumer matches
//! exhaustively; adding a node kind is a compile error everywhere a rule
//! is missing.

pub mod node;

pub use node::{MethodParam, NodeKind, WhenArm};

use sable_common::Position;

/// Index of a node in its [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct NodeId(pub u32);

/// One syntax node: a kind plus the source position it covers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
}

/// An arena of syntax nodes for one or more compilation units.
///
/// Children reference each other by [`NodeId`]; the arena owns every
/// node. Ids are stable for the lifetime of the arena, which is the
/// lifetime of the compilation.
#[derive(Debug, Default, serde::Serialize)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its id.
    pub fn push(&mut self, kind: NodeKind, position: Position) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, position });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize].kind
    }

    pub fn position(&self, id: NodeId) -> Position {
        self.nodes[id.0 as usize].position
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all node ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }
}
