//! The type-future graph.
//!
//! Every program construct gets a future: a node that may not have a
//! type yet and that can change its mind when later information arrives
//! (a newly-seen method definition, a finally-resolved branch arm).
//! Futures live in one arena and reference each other by [`FutureId`];
//! listener edges are plain ids, never owning handles, so the cyclic
//! graphs produced by mutually recursive definitions cannot create
//! ownership cycles.
//!
//! Value transitions are driven exclusively by the resolution loop: a
//! change enqueues the future's dependents on the dirty queue, and the
//! loop recomputes them until a full pass observes no transition.

use std::collections::VecDeque;

use sable_common::Position;

use crate::ty::Type;

/// Index of a future in its [`FutureGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FutureId(pub u32);

/// The accumulated constraints of an assignable slot (local variable,
/// parameter, method return).
#[derive(Debug, Clone, Default)]
pub struct SlotState {
    /// Candidate declared types with the position of each declaration.
    pub declarations: Vec<(FutureId, Position)>,
    /// Assignment futures targeting this slot, in creation order.
    pub assignments: Vec<FutureId>,
}

/// A pending method call awaiting overload dispatch.
#[derive(Debug, Clone)]
pub struct CallState {
    pub receiver: FutureId,
    pub name: String,
    pub args: Vec<FutureId>,
    /// Whether this call has already seeded its argument types into an
    /// inferred-parameter method (done at most once per call).
    pub params_seeded: bool,
    /// Futures this call is currently blocked on (candidate parameter
    /// and return futures discovered during dispatch).
    pub watching: Vec<FutureId>,
}

/// The recompute rule of a future -- a closed sum, matched exhaustively
/// by the driver's resolution step.
#[derive(Debug, Clone)]
pub enum FutureKind {
    /// No rule; the value is set directly (literals, known errors).
    Simple,
    /// A named type reference, resolved against the catalog.
    Descriptor { name: String, meta: bool },
    /// A mutable binding: declared-or-inferred, poisoned on conflict.
    Assignable(SlotState),
    /// One assignment attempt against a slot.
    Assignment { slot: FutureId, value: FutureId },
    /// A local read copying its slot's type.
    LocalRead { slot: FutureId },
    /// A statement sequence typing as its last statement.
    Sequence { last: FutureId },
    /// A control-flow join over arm types.
    Branch { arms: Vec<FutureId> },
    /// A method call.
    Call(CallState),
    /// A method definition, resolving to its signature type.
    MethodDef { params: Vec<FutureId>, ret: FutureId },
    /// A cast checked against the coercion table.
    Cast { target: FutureId, value: FutureId },
}

impl FutureKind {
    /// The futures this rule reads. Used by the end-of-resolution
    /// report to tell blocked futures (some input unresolved) from
    /// root causes (all inputs resolved, still no value).
    pub fn inputs(&self) -> Vec<FutureId> {
        match self {
            FutureKind::Simple | FutureKind::Descriptor { .. } => vec![],
            FutureKind::Assignable(state) => {
                let mut ids: Vec<FutureId> =
                    state.declarations.iter().map(|(id, _)| *id).collect();
                ids.extend(&state.assignments);
                ids
            }
            FutureKind::Assignment { slot, value } => vec![*slot, *value],
            FutureKind::LocalRead { slot } => vec![*slot],
            FutureKind::Sequence { last } => vec![*last],
            FutureKind::Branch { arms } => arms.clone(),
            FutureKind::Call(state) => {
                let mut ids = vec![state.receiver];
                ids.extend(&state.args);
                ids.extend(&state.watching);
                ids
            }
            FutureKind::MethodDef { params, ret } => {
                let mut ids = params.clone();
                ids.push(*ret);
                ids
            }
            FutureKind::Cast { target, value } => vec![*target, *value],
        }
    }
}

#[derive(Debug)]
struct FutureNode {
    value: Option<Type>,
    dependents: Vec<FutureId>,
    kind: FutureKind,
    position: Position,
}

/// Arena of futures plus the dirty queue of the resolution loop.
#[derive(Debug, Default)]
pub struct FutureGraph {
    nodes: Vec<FutureNode>,
    queue: VecDeque<FutureId>,
    queued: Vec<bool>,
}

impl FutureGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a future with the given rule. New futures start
    /// unresolved and dirty (the loop gives every rule one initial
    /// attempt).
    pub fn new_future(&mut self, kind: FutureKind, position: Position) -> FutureId {
        let id = FutureId(self.nodes.len() as u32);
        self.nodes.push(FutureNode {
            value: None,
            dependents: Vec::new(),
            kind,
            position,
        });
        self.queued.push(false);
        self.mark_dirty(id);
        id
    }

    /// Create a future already resolved to `ty` (literals, wrapped
    /// known types, immediate errors).
    pub fn new_resolved(&mut self, ty: Type, position: Position) -> FutureId {
        let id = self.new_future(FutureKind::Simple, position);
        self.nodes[id.0 as usize].value = Some(ty);
        id
    }

    /// The future's current value. Never forces computation; only the
    /// resolution loop transitions values.
    pub fn value(&self, id: FutureId) -> Option<&Type> {
        self.nodes[id.0 as usize].value.as_ref()
    }

    pub fn kind(&self, id: FutureId) -> &FutureKind {
        &self.nodes[id.0 as usize].kind
    }

    pub fn kind_mut(&mut self, id: FutureId) -> &mut FutureKind {
        &mut self.nodes[id.0 as usize].kind
    }

    pub fn position(&self, id: FutureId) -> Position {
        self.nodes[id.0 as usize].position
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = FutureId> {
        (0..self.nodes.len() as u32).map(FutureId)
    }

    /// Register `dependent` as a listener of `source`: whenever
    /// `source`'s value transitions, `dependent` is re-enqueued for
    /// recomputation. Registering the same edge twice is a no-op, and
    /// registering against an already-resolved source schedules one
    /// catch-up recomputation so late listeners observe the current
    /// value.
    pub fn on_update(&mut self, source: FutureId, dependent: FutureId) {
        let node = &mut self.nodes[source.0 as usize];
        if node.dependents.contains(&dependent) {
            return;
        }
        node.dependents.push(dependent);
        if node.value.is_some() {
            self.mark_dirty(dependent);
        }
    }

    /// Directly resolve a future (used for trivially-known values).
    /// Equivalent to a recompute step producing `ty`.
    pub fn resolved(&mut self, id: FutureId, ty: Type) {
        self.set_value(id, ty);
    }

    /// Transition a future's value, notifying dependents. Returns
    /// whether the value actually changed; setting the current value
    /// again is a no-op with no listener side effects.
    ///
    /// A future never reverts to unresolved: rules that cannot produce
    /// a value simply leave the last one in place.
    pub fn set_value(&mut self, id: FutureId, ty: Type) -> bool {
        let node = &mut self.nodes[id.0 as usize];
        if node.value.as_ref() == Some(&ty) {
            return false;
        }
        node.value = Some(ty);
        let dependents = node.dependents.clone();
        for dep in dependents {
            self.mark_dirty(dep);
        }
        true
    }

    /// Enqueue a future for recomputation.
    pub fn mark_dirty(&mut self, id: FutureId) {
        if !self.queued[id.0 as usize] {
            self.queued[id.0 as usize] = true;
            self.queue.push_back(id);
        }
    }

    /// Whether any future is awaiting recomputation.
    pub fn has_dirty(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Next future awaiting recomputation, if any.
    pub fn pop_dirty(&mut self) -> Option<FutureId> {
        let id = self.queue.pop_front()?;
        self.queued[id.0 as usize] = false;
        Some(id)
    }

    /// Number of registered listener edges out of `id`. Exposed so
    /// tests can assert that re-resolution has no listener side
    /// effects.
    pub fn dependent_count(&self, id: FutureId) -> usize {
        self.nodes[id.0 as usize].dependents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{NominalKind, NominalType};

    fn int() -> Type {
        Type::Nominal(NominalType::new("int", NominalKind::Primitive, vec![]))
    }

    fn float() -> Type {
        Type::Nominal(NominalType::new("float", NominalKind::Primitive, vec![]))
    }

    #[test]
    fn new_future_starts_unresolved_and_dirty() {
        let mut graph = FutureGraph::new();
        let f = graph.new_future(FutureKind::Simple, Position::synthetic());
        assert!(graph.value(f).is_none());
        assert_eq!(graph.pop_dirty(), Some(f));
        assert_eq!(graph.pop_dirty(), None);
    }

    #[test]
    fn resolving_twice_to_same_value_is_idempotent() {
        let mut graph = FutureGraph::new();
        let f = graph.new_future(FutureKind::Simple, Position::synthetic());
        let dep = graph.new_future(FutureKind::Simple, Position::synthetic());
        graph.on_update(f, dep);
        while graph.pop_dirty().is_some() {}

        assert!(graph.set_value(f, int()));
        assert_eq!(graph.value(f), Some(&int()));
        // Dependent was notified once.
        assert_eq!(graph.pop_dirty(), Some(dep));
        assert_eq!(graph.pop_dirty(), None);

        // Same value again: no transition, no notification, no new edges.
        assert!(!graph.set_value(f, int()));
        assert_eq!(graph.value(f), Some(&int()));
        assert_eq!(graph.pop_dirty(), None);
        assert_eq!(graph.dependent_count(f), 1);
    }

    #[test]
    fn value_change_renotifies_dependents() {
        let mut graph = FutureGraph::new();
        let f = graph.new_future(FutureKind::Simple, Position::synthetic());
        let dep = graph.new_future(FutureKind::Simple, Position::synthetic());
        graph.on_update(f, dep);
        while graph.pop_dirty().is_some() {}

        graph.set_value(f, int());
        while graph.pop_dirty().is_some() {}

        // A later, different resolution fires listeners again.
        assert!(graph.set_value(f, float()));
        assert_eq!(graph.pop_dirty(), Some(dep));
    }

    #[test]
    fn duplicate_listener_edges_are_collapsed() {
        let mut graph = FutureGraph::new();
        let f = graph.new_future(FutureKind::Simple, Position::synthetic());
        let dep = graph.new_future(FutureKind::Simple, Position::synthetic());
        graph.on_update(f, dep);
        graph.on_update(f, dep);
        assert_eq!(graph.dependent_count(f), 1);
    }

    #[test]
    fn late_listener_catches_up_on_resolved_source() {
        let mut graph = FutureGraph::new();
        let f = graph.new_resolved(int(), Position::synthetic());
        while graph.pop_dirty().is_some() {}

        let dep = graph.new_future(FutureKind::Simple, Position::synthetic());
        while graph.pop_dirty().is_some() {}

        graph.on_update(f, dep);
        // The dependent is scheduled even though f resolved earlier.
        assert_eq!(graph.pop_dirty(), Some(dep));
    }

    #[test]
    fn cyclic_edges_are_representable() {
        let mut graph = FutureGraph::new();
        let a = graph.new_future(FutureKind::Simple, Position::synthetic());
        let b = graph.new_future(FutureKind::Simple, Position::synthetic());
        graph.on_update(a, b);
        graph.on_update(b, a);
        assert_eq!(graph.dependent_count(a), 1);
        assert_eq!(graph.dependent_count(b), 1);
    }
}
