//! Sable type resolver: future-based inference over a lazily-populated
//! dependency graph.
//!
//! This crate assigns a type to every node of the syntax forest. It is
//! not a one-pass checker: definitions may appear in any order, calls
//! may target methods that have not been walked yet, and partial
//! failures become an absorbing error type instead of aborting. The
//! engine builds a graph of type futures, then drives it to a
//! deterministic fixpoint:
//!
//! - [`ty`]: types as immutable values, including the error type
//! - [`future`]: the future graph (arena, listener edges, dirty queue)
//! - [`slot`]: the assignable-slot protocol (declare/assign)
//! - [`catalog`]: interned nominals, member tables, coercion rules
//! - [`scope`]: the lexical-chain contract the driver consumes
//! - [`typer`]: per-node inference rules and the resolution loop
//! - [`session`]: shared state for parallel unit preparation
//! - [`error`]: the failure taxonomy
//! - [`diagnostics`]: rendered and machine-readable reports

pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod future;
pub mod scope;
pub mod session;
pub mod slot;
pub mod ty;
pub mod typer;

use rustc_hash::FxHashMap;
use sable_ast::{Ast, NodeId};
use sable_common::Diagnostic;

use crate::ty::Type;
pub use crate::typer::{Typer, TyperOptions};

/// The outcome of resolving a set of compilation units.
///
/// Codegen consumes `types` and refuses to run while `diagnostics` is
/// non-empty.
pub struct TyperResult {
    /// Every walked node's resolved type. Nodes whose futures never
    /// settled are absent here and explained in `diagnostics`.
    pub types: FxHashMap<NodeId, Type>,
    /// Collected problems, in deterministic order.
    pub diagnostics: Vec<Diagnostic>,
    /// The type of the last statement of the last unit, if it settled.
    pub result_type: Option<Type>,
}

impl TyperResult {
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Resolve `units` (script nodes) against a fresh typer. This is the
/// main entry point for embedders that do not need incremental healing
/// across calls.
pub fn check(ast: &Ast, units: &[NodeId]) -> TyperResult {
    check_with_options(ast, units, TyperOptions::default())
}

/// [`check`] with explicit inference options.
pub fn check_with_options(ast: &Ast, units: &[NodeId], options: TyperOptions) -> TyperResult {
    let mut typer = Typer::with_options(ast, options);
    for unit in units {
        typer.infer(*unit);
    }
    typer.resolve_all();
    typer.result()
}
