//! The assignable-slot protocol.
//!
//! A slot is a mutable binding (local variable, parameter, method
//! return) represented as an assignable future: it may be declared (at
//! most one type), and it accumulates assignment attempts, each of
//! which is itself a future that settles once both the slot's effective
//! type and the assigned value's type are known.
//!
//! The protocol makes declaration order irrelevant: a slot may be
//! written before its declaration is seen, declared twice (a permanent,
//! reportable poisoning when the types differ), or never declared at
//! all (the first resolved assignment fixes its inferred type).

use sable_common::Position;

use crate::error::TypeError;
use crate::future::{FutureGraph, FutureId, FutureKind, SlotState};
use crate::ty::{ErrorType, Type};

/// Create a fresh, undeclared slot.
pub fn new_slot(graph: &mut FutureGraph, position: Position) -> FutureId {
    graph.new_future(FutureKind::Assignable(SlotState::default()), position)
}

/// Record `type_future` as a candidate declared type for `slot`.
///
/// When it resolves: adopted if the slot has no declared type, ignored
/// if equal to the existing one, and a permanent poisoning of the slot
/// if different -- every pending and future assignment against the slot
/// then resolves to the same conflict error.
pub fn declare(graph: &mut FutureGraph, slot: FutureId, type_future: FutureId, position: Position) {
    match graph.kind_mut(slot) {
        FutureKind::Assignable(state) => {
            state.declarations.push((type_future, position));
        }
        other => panic!("declare on non-assignable future: {:?}", other),
    }
    graph.on_update(type_future, slot);
    graph.mark_dirty(slot);
}

/// Record an assignment of `value` into `slot`, returning a fresh
/// future for the attempt. It resolves to the slot's effective type
/// when the value is acceptable, and to an incompatibility error
/// otherwise.
pub fn assign(
    graph: &mut FutureGraph,
    slot: FutureId,
    value: FutureId,
    position: Position,
) -> FutureId {
    let attempt = graph.new_future(FutureKind::Assignment { slot, value }, position);
    match graph.kind_mut(slot) {
        FutureKind::Assignable(state) => {
            state.assignments.push(attempt);
        }
        other => panic!("assign on non-assignable future: {:?}", other),
    }
    graph.on_update(slot, attempt);
    graph.on_update(value, attempt);
    // The slot itself infers from assigned values when undeclared.
    graph.on_update(value, slot);
    graph.mark_dirty(slot);
    attempt
}

/// Recompute a slot's effective type: declared if present, inferred
/// from the first resolved assignment otherwise, or the conflict error
/// once poisoned.
pub fn effective_type(graph: &FutureGraph, state: &SlotState) -> Option<Type> {
    // Declarations take precedence over inference.
    let resolved_decls: Vec<(Type, Position)> = state
        .declarations
        .iter()
        .filter_map(|(id, pos)| graph.value(*id).map(|t| (t.clone(), *pos)))
        .collect();

    if let Some((err, _)) = resolved_decls.iter().find(|(t, _)| t.is_error()) {
        return Some(err.clone());
    }

    if let Some((first_ty, first_pos)) = resolved_decls.first() {
        if let Some((other_ty, other_pos)) =
            resolved_decls.iter().find(|(t, _)| t != first_ty)
        {
            let conflict = TypeError::DeclarationConflict {
                declared: first_ty.to_string(),
                conflicting: other_ty.to_string(),
            };
            return Some(Type::Error(ErrorType::new(vec![
                (conflict.to_string(), *other_pos),
                (format!("first declared as `{}`", first_ty), *first_pos),
            ])));
        }
        return Some(first_ty.clone());
    }

    // Unresolved declarations still pending: wait for them rather than
    // inferring a type the declaration may contradict.
    if !state.declarations.is_empty() {
        return None;
    }

    // No declarations: the first assignment whose value has resolved
    // establishes the inferred type.
    for attempt in &state.assignments {
        let FutureKind::Assignment { value, .. } = graph.kind(*attempt) else {
            continue;
        };
        if let Some(ty) = graph.value(*value) {
            return Some(ty.clone());
        }
    }
    None
}

/// Recompute one assignment attempt against its slot.
pub fn assignment_value(
    graph: &FutureGraph,
    slot: FutureId,
    value: FutureId,
    position: Position,
) -> Option<Type> {
    let slot_ty = graph.value(slot)?;
    if slot_ty.is_error() {
        // Poisoned slot: every attempt carries the same error.
        return Some(slot_ty.clone());
    }
    let value_ty = graph.value(value)?;
    if value_ty.is_error() {
        return Some(value_ty.clone());
    }
    if slot_ty.assignable_from(value_ty) {
        Some(slot_ty.clone())
    } else {
        let err = TypeError::IncompatibleAssignment {
            expected: slot_ty.to_string(),
            found: value_ty.to_string(),
        };
        Some(Type::Error(ErrorType::single(err.to_string(), position)))
    }
}
