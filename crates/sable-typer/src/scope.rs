//! Lexical scopes as seen by the type resolver.
//!
//! A scope maps variable names to their assignable slot futures, chains
//! to an enclosing scope, and knows the self type (and whether it is
//! the static view) of the context it belongs to. Scopes are created
//! when a binding-introducing node (script, class body, method body) is
//! first visited and live until the compilation does; there is no
//! explicit teardown.
//!
//! The resolver only consumes this contract; how scopes are carved out
//! of the source is the business of whoever builds the forest.

use rustc_hash::FxHashMap;
use sable_ast::NodeId;

use crate::future::FutureId;

/// Index of a scope in its [`SimpleScoper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    locals: FxHashMap<String, FutureId>,
    self_type: FutureId,
    is_static: bool,
}

/// Scope registry keyed by the node that introduced each scope.
#[derive(Debug, Default)]
pub struct SimpleScoper {
    scopes: Vec<Scope>,
    by_node: FxHashMap<NodeId, ScopeId>,
}

impl SimpleScoper {
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope introduced by `node`, creating it on first visit.
    /// Later visits return the same scope regardless of the other
    /// arguments.
    pub fn enter(
        &mut self,
        node: NodeId,
        parent: Option<ScopeId>,
        self_type: FutureId,
        is_static: bool,
    ) -> ScopeId {
        if let Some(id) = self.by_node.get(&node) {
            return *id;
        }
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            locals: FxHashMap::default(),
            self_type,
            is_static,
        });
        self.by_node.insert(node, id);
        id
    }

    /// The scope a node introduced, if it was ever visited.
    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.by_node.get(&node).copied()
    }

    /// Look up a name through the scope chain, innermost outward.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<FutureId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0 as usize];
            if let Some(slot) = s.locals.get(name) {
                return Some(*slot);
            }
            current = s.parent;
        }
        None
    }

    /// Bind a name to a slot in exactly this scope (shadowing any outer
    /// binding of the same name).
    pub fn declare(&mut self, scope: ScopeId, name: &str, slot: FutureId) {
        self.scopes[scope.0 as usize]
            .locals
            .insert(name.to_string(), slot);
    }

    /// The self type future of the scope's context.
    pub fn self_type(&self, scope: ScopeId) -> FutureId {
        self.scopes[scope.0 as usize].self_type
    }

    /// Whether the scope sees the static (meta) view of self.
    pub fn is_static(&self, scope: ScopeId) -> bool {
        self.scopes[scope.0 as usize].is_static
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }
}
