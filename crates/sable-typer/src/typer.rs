//! The inference driver.
//!
//! Walks the syntax forest once per compilation unit, producing a
//! (memoized) future for every node without forcing resolution, then
//! drives the future graph to a fixpoint: the dirty queue is drained,
//! and full sweeps repeat until one observes no value transition.
//!
//! Failures never abort the walk or the loop: they become error types
//! flowing through the graph, and anything still unresolved when the
//! loop stabilizes is reported by [`Typer::diagnostics`].

use rustc_hash::{FxHashMap, FxHashSet};
use sable_ast::{Ast, MethodParam, NodeId, NodeKind};
use sable_common::{Diagnostic, Position};

use crate::catalog::{MethodEntry, TypeCatalog};
use crate::error::TypeError;
use crate::future::{CallState, FutureGraph, FutureId, FutureKind};
use crate::scope::{ScopeId, SimpleScoper};
use crate::slot;
use crate::ty::{ErrorType, NominalKind, Type};

/// The nominal type owning script-level definitions. Every unit walked
/// by one typer shares it, which is what lets a later unit's
/// definitions heal an earlier unit's deferred calls.
const MAIN_TYPE: &str = "Main";

/// Knobs for inference behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct TyperOptions {
    /// Treat a branch join that only unifies at `Object` as an error
    /// instead of silently widening.
    pub strict_branch_joins: bool,
}

/// Overload dispatch preference, tried in order; the first phase with a
/// unique applicable candidate wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchPhase {
    Exact,
    Widening,
    Boxing,
    Upcast,
}

const DISPATCH_PHASES: [DispatchPhase; 4] = [
    DispatchPhase::Exact,
    DispatchPhase::Widening,
    DispatchPhase::Boxing,
    DispatchPhase::Upcast,
];

fn primitive_rank(ty: &Type) -> Option<usize> {
    match ty {
        Type::Nominal(n) if n.kind == NominalKind::Primitive => ty.numeric_rank(),
        _ => None,
    }
}

fn arg_matches(phase: DispatchPhase, param: &Type, arg: &Type) -> bool {
    if param.is_error() || arg.is_error() {
        return true;
    }
    match phase {
        DispatchPhase::Exact => param == arg,
        DispatchPhase::Widening => {
            param == arg
                || matches!(
                    (primitive_rank(param), primitive_rank(arg)),
                    (Some(p), Some(a)) if a <= p
                )
        }
        DispatchPhase::Boxing => {
            arg_matches(DispatchPhase::Widening, param, arg)
                || match (param, arg) {
                    (Type::Nominal(p), Type::Nominal(a)) => {
                        crate::ty::boxed_name(&a.name) == Some(p.name.as_str())
                            || crate::ty::unboxed_name(&a.name) == Some(p.name.as_str())
                    }
                    _ => false,
                }
        }
        DispatchPhase::Upcast => param.assignable_from(arg),
    }
}

/// The type resolver: owns the future graph, catalog, scopes, and the
/// node memo for one compilation.
pub struct Typer<'a> {
    ast: &'a Ast,
    graph: FutureGraph,
    catalog: TypeCatalog,
    scoper: SimpleScoper,
    memo: FxHashMap<NodeId, FutureId>,
    options: TyperOptions,
    scope_stack: Vec<ScopeId>,
    owner_stack: Vec<String>,
    return_stack: Vec<FutureId>,
    last_body: Option<NodeId>,
    session_diagnostics: Vec<Diagnostic>,
}

impl<'a> Typer<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self::with_options(ast, TyperOptions::default())
    }

    pub fn with_options(ast: &'a Ast, options: TyperOptions) -> Self {
        let mut graph = FutureGraph::new();
        let mut catalog = TypeCatalog::new();
        catalog.register_builtins();
        catalog.define_class(&mut graph, MAIN_TYPE, None, &[], false, Position::synthetic());
        Typer {
            ast,
            graph,
            catalog,
            scoper: SimpleScoper::new(),
            memo: FxHashMap::default(),
            options,
            scope_stack: Vec::new(),
            owner_stack: Vec::new(),
            return_stack: Vec::new(),
            last_body: None,
            session_diagnostics: Vec::new(),
        }
    }

    /// Adopt diagnostics collected by unit-preparation workers (parse
    /// and macro errors reported through the shared session sink).
    pub fn drain_session(&mut self, session: &crate::session::Session) {
        self.session_diagnostics.extend(session.take_diagnostics());
    }

    pub fn graph(&self) -> &FutureGraph {
        &self.graph
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// The future already derived for a node, if it was walked.
    pub fn future_of(&self, node: NodeId) -> Option<FutureId> {
        self.memo.get(&node).copied()
    }

    /// The resolved type of a node, if its future has settled.
    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.graph.value(self.future_of(node)?)
    }

    /// The resolved type of a local in the scope introduced by `node`.
    pub fn local_type(&self, scope_node: NodeId, name: &str) -> Option<&Type> {
        let scope = self.scoper.scope_of(scope_node)?;
        let slot = self.scoper.resolve(scope, name)?;
        self.graph.value(slot)
    }

    /// The resolved signature of a method definition node.
    pub fn method_signature(&self, node: NodeId) -> Option<(Vec<Type>, Type)> {
        match self.type_of(node)? {
            Type::Function { params, ret } => Some((params.clone(), (**ret).clone())),
            _ => None,
        }
    }

    // ── Graph construction (the walk) ──────────────────────────────────

    /// Produce the future for a node, building the graph beneath it.
    /// Re-visiting returns the same future: graph nodes are shared,
    /// never recreated.
    pub fn infer(&mut self, node: NodeId) -> FutureId {
        if let Some(f) = self.memo.get(&node) {
            return *f;
        }

        // An expression inferred outside any unit gets its own root
        // scope so name resolution has somewhere to live.
        let pushed_root = if self.scope_stack.is_empty()
            && !matches!(self.ast.kind(node), NodeKind::Script { .. })
        {
            let self_fut = self.wrap(MAIN_TYPE, false, self.ast.position(node));
            let scope = self.scoper.enter(node, None, self_fut, false);
            self.scope_stack.push(scope);
            true
        } else {
            false
        };

        let fut = self.infer_node(node);

        if pushed_root {
            self.scope_stack.pop();
        }
        self.memo.insert(node, fut);
        fut
    }

    fn infer_node(&mut self, node: NodeId) -> FutureId {
        let pos = self.ast.position(node);
        match self.ast.kind(node) {
            NodeKind::Script { body } => {
                let body = *body;
                let self_fut = self.wrap(MAIN_TYPE, false, pos);
                let scope = self.scoper.enter(node, None, self_fut, false);
                self.scope_stack.push(scope);
                self.infer(body);
                self.scope_stack.pop();
                self.last_body = Some(body);
                self.graph.new_resolved(Type::Void, pos)
            }
            NodeKind::Body { statements } => {
                let statements = statements.clone();
                if statements.is_empty() {
                    return self.graph.new_resolved(Type::ImplicitNil, pos);
                }
                let mut last = None;
                for stmt in statements {
                    last = Some(self.infer(stmt));
                }
                let last = last.expect("non-empty body has a last statement");
                let fut = self.graph.new_future(FutureKind::Sequence { last }, pos);
                self.graph.on_update(last, fut);
                fut
            }
            NodeKind::IntLit { .. } => {
                let ty = self.known("int");
                self.graph.new_resolved(ty, pos)
            }
            NodeKind::FloatLit { .. } => {
                let ty = self.known("float");
                self.graph.new_resolved(ty, pos)
            }
            NodeKind::StringLit { .. } => {
                let ty = self.known("String");
                self.graph.new_resolved(ty, pos)
            }
            NodeKind::BoolLit { .. } => {
                let ty = self.known("bool");
                self.graph.new_resolved(ty, pos)
            }
            NodeKind::NilLit => self.graph.new_resolved(Type::Null, pos),
            NodeKind::LocalRead { name } => {
                let name = name.clone();
                let scope = self.current_scope();
                match self.scoper.resolve(scope, &name) {
                    Some(slot) => {
                        let fut = self.graph.new_future(FutureKind::LocalRead { slot }, pos);
                        self.graph.on_update(slot, fut);
                        fut
                    }
                    None => {
                        let err = TypeError::UndefinedVariable { name };
                        self.error_future(err, pos)
                    }
                }
            }
            NodeKind::LocalWrite { name, value } => {
                let (name, value) = (name.clone(), *value);
                let value_fut = self.infer(value);
                let scope = self.current_scope();
                let slot = match self.scoper.resolve(scope, &name) {
                    Some(slot) => slot,
                    None => {
                        let slot = slot::new_slot(&mut self.graph, pos);
                        self.scoper.declare(scope, &name, slot);
                        slot
                    }
                };
                slot::assign(&mut self.graph, slot, value_fut, pos)
            }
            NodeKind::If { condition, then_body, else_body } => {
                let (condition, then_body, else_body) = (*condition, *then_body, *else_body);
                self.infer(condition);
                let then_fut = self.infer(then_body);
                let else_fut = match else_body {
                    Some(e) => self.infer(e),
                    None => self.graph.new_resolved(Type::ImplicitNil, pos),
                };
                self.branch(vec![then_fut, else_fut], pos)
            }
            NodeKind::Case { arms, else_body } => {
                let (arms, else_body) = (arms.clone(), *else_body);
                let mut arm_futs = Vec::with_capacity(arms.len() + 1);
                for arm in &arms {
                    self.infer(arm.condition);
                    arm_futs.push(self.infer(arm.body));
                }
                arm_futs.push(match else_body {
                    Some(e) => self.infer(e),
                    None => self.graph.new_resolved(Type::ImplicitNil, pos),
                });
                self.branch(arm_futs, pos)
            }
            NodeKind::Call { receiver, name, args } => {
                let (receiver, name, args) = (*receiver, name.clone(), args.clone());
                let receiver_fut = self.infer(receiver);
                self.call(receiver_fut, name, &args, pos)
            }
            NodeKind::FunctionalCall { name, args } => {
                let (name, args) = (name.clone(), args.clone());
                let scope = self.current_scope();
                let receiver_fut = self.scoper.self_type(scope);
                self.call(receiver_fut, name, &args, pos)
            }
            NodeKind::ConstRef { name } => {
                let name = name.clone();
                self.wrap(&name, true, pos)
            }
            NodeKind::MethodDef { .. } => self.infer_method(node),
            NodeKind::ClassDef { .. } => self.infer_class(node),
            NodeKind::Return { value } => {
                let value = *value;
                let Some(ret_slot) = self.return_stack.last().copied() else {
                    return self.error_future(TypeError::ReturnOutsideMethod, pos);
                };
                let value_fut = match value {
                    Some(v) => self.infer(v),
                    None => self.graph.new_resolved(Type::ImplicitNil, pos),
                };
                slot::assign(&mut self.graph, ret_slot, value_fut, pos)
            }
            NodeKind::Cast { target, value } => {
                let (target, value) = (target.clone(), *value);
                let target_fut = self.wrap(&target, false, pos);
                let value_fut = self.infer(value);
                let fut = self
                    .graph
                    .new_future(FutureKind::Cast { target: target_fut, value: value_fut }, pos);
                self.graph.on_update(target_fut, fut);
                self.graph.on_update(value_fut, fut);
                fut
            }
        }
    }

    fn infer_method(&mut self, node: NodeId) -> FutureId {
        let pos = self.ast.position(node);
        let NodeKind::MethodDef { name, params, return_annotation, body, is_static } =
            self.ast.kind(node)
        else {
            unreachable!("infer_method on non-method node");
        };
        let (name, params, return_annotation, body, is_static) = (
            name.clone(),
            params.clone(),
            return_annotation.clone(),
            *body,
            *is_static,
        );

        let owner = self
            .owner_stack
            .last()
            .cloned()
            .unwrap_or_else(|| MAIN_TYPE.to_string());
        let self_fut = self.wrap(&owner, is_static, pos);
        let scope = self.scoper.enter(node, None, self_fut, is_static);

        let mut param_futs = Vec::with_capacity(params.len());
        for MethodParam { name: pname, annotation, position } in &params {
            let slot = slot::new_slot(&mut self.graph, *position);
            if let Some(desc) = annotation {
                let declared = self.wrap(desc, false, *position);
                slot::declare(&mut self.graph, slot, declared, *position);
            }
            self.scoper.declare(scope, pname, slot);
            param_futs.push(slot);
        }

        let ret_slot = slot::new_slot(&mut self.graph, pos);
        if let Some(desc) = &return_annotation {
            let declared = self.wrap(desc, false, pos);
            slot::declare(&mut self.graph, ret_slot, declared, pos);
        }

        self.scope_stack.push(scope);
        self.return_stack.push(ret_slot);
        let body_fut = self.infer(body);
        self.return_stack.pop();
        self.scope_stack.pop();

        // The trailing expression is an implicit return, unified with
        // every explicit one through the return slot.
        slot::assign(&mut self.graph, ret_slot, body_fut, self.ast.position(body));

        if name == "initialize" && !is_static {
            let instance = self.known(&owner);
            let ctor_ret = self.graph.new_resolved(instance, pos);
            self.catalog.add_constructor(
                &owner,
                MethodEntry {
                    params: param_futs.clone(),
                    ret: ctor_ret,
                    position: pos,
                    is_default_ctor: false,
                },
            );
            self.catalog.add_method(
                &owner,
                false,
                &name,
                MethodEntry {
                    params: param_futs.clone(),
                    ret: ret_slot,
                    position: pos,
                    is_default_ctor: false,
                },
            );
        } else {
            self.catalog.add_method(
                &owner,
                is_static,
                &name,
                MethodEntry {
                    params: param_futs.clone(),
                    ret: ret_slot,
                    position: pos,
                    is_default_ctor: false,
                },
            );
        }

        let fut = self
            .graph
            .new_future(FutureKind::MethodDef { params: param_futs.clone(), ret: ret_slot }, pos);
        for p in param_futs {
            self.graph.on_update(p, fut);
        }
        self.graph.on_update(ret_slot, fut);
        fut
    }

    fn infer_class(&mut self, node: NodeId) -> FutureId {
        let pos = self.ast.position(node);
        let NodeKind::ClassDef { name, superclass, interfaces, body, is_interface } =
            self.ast.kind(node)
        else {
            unreachable!("infer_class on non-class node");
        };
        let (name, superclass, interfaces, body, is_interface) = (
            name.clone(),
            superclass.clone(),
            interfaces.clone(),
            *body,
            *is_interface,
        );

        let ty = self.catalog.define_class(
            &mut self.graph,
            &name,
            superclass.as_deref(),
            &interfaces,
            is_interface,
            pos,
        );
        let self_fut = self.wrap(&name, false, pos);
        let scope = self.scoper.enter(node, None, self_fut, false);

        self.owner_stack.push(name);
        self.scope_stack.push(scope);
        self.infer(body);
        self.scope_stack.pop();
        self.owner_stack.pop();

        self.graph.new_resolved(Type::Meta(Box::new(ty)), pos)
    }

    fn branch(&mut self, arms: Vec<FutureId>, pos: Position) -> FutureId {
        let fut = self.graph.new_future(FutureKind::Branch { arms: arms.clone() }, pos);
        for arm in arms {
            self.graph.on_update(arm, fut);
        }
        fut
    }

    fn call(&mut self, receiver: FutureId, name: String, args: &[NodeId], pos: Position) -> FutureId {
        let arg_futs: Vec<FutureId> = args.iter().map(|a| self.infer(*a)).collect();
        let fut = self.graph.new_future(
            FutureKind::Call(CallState {
                receiver,
                name,
                args: arg_futs.clone(),
                params_seeded: false,
                watching: Vec::new(),
            }),
            pos,
        );
        self.graph.on_update(receiver, fut);
        for a in arg_futs {
            self.graph.on_update(a, fut);
        }
        fut
    }

    fn current_scope(&self) -> ScopeId {
        *self
            .scope_stack
            .last()
            .expect("inference rules run inside a scope")
    }

    fn wrap(&mut self, name: &str, meta: bool, pos: Position) -> FutureId {
        self.catalog.wrap(&mut self.graph, name, meta, pos)
    }

    /// A builtin or already-interned type, by name.
    fn known(&self, name: &str) -> Type {
        self.catalog
            .resolve_descriptor(name, false)
            .unwrap_or_else(|| panic!("type `{name}` is registered at startup"))
    }

    fn error_future(&mut self, err: TypeError, pos: Position) -> FutureId {
        self.graph
            .new_resolved(Type::Error(ErrorType::single(err.to_string(), pos)), pos)
    }

    // ── Resolution (the fixpoint loop) ─────────────────────────────────

    /// Run resolution to a fixpoint: drain the dirty queue, then sweep
    /// every future; repeat until a sweep observes no transition. May
    /// be called again after walking more units -- previously deferred
    /// futures pick up the new information and re-propagate.
    pub fn resolve_all(&mut self) {
        loop {
            while let Some(id) = self.graph.pop_dirty() {
                self.recompute(id);
            }
            let mut changed = false;
            let ids: Vec<FutureId> = self.graph.ids().collect();
            for id in ids {
                if self.recompute(id) {
                    changed = true;
                }
            }
            if !changed && !self.graph.has_dirty() {
                break;
            }
        }
    }

    /// Apply a future's rule once. Returns whether its value changed.
    fn recompute(&mut self, id: FutureId) -> bool {
        let kind = self.graph.kind(id).clone();
        let pos = self.graph.position(id);
        let new = match kind {
            FutureKind::Simple => None,
            FutureKind::Descriptor { name, meta } => self.catalog.resolve_descriptor(&name, meta),
            FutureKind::Sequence { last } => self.graph.value(last).cloned(),
            FutureKind::LocalRead { slot } => self.graph.value(slot).cloned(),
            FutureKind::Assignable(state) => slot::effective_type(&self.graph, &state),
            FutureKind::Assignment { slot, value } => {
                slot::assignment_value(&self.graph, slot, value, pos)
            }
            FutureKind::Branch { arms } => self.recompute_branch(&arms, pos),
            FutureKind::Call(state) => self.recompute_call(id, state, pos),
            FutureKind::MethodDef { params, ret } => self.recompute_method(&params, ret),
            FutureKind::Cast { target, value } => self.recompute_cast(target, value, pos),
        };
        match new {
            Some(ty) => self.graph.set_value(id, ty),
            None => false,
        }
    }

    fn recompute_branch(&self, arms: &[FutureId], pos: Position) -> Option<Type> {
        let mut values = Vec::with_capacity(arms.len());
        for arm in arms {
            // An unresolved arm defers the whole join; only the final
            // fixpoint state turns that into a report.
            values.push(self.graph.value(*arm)?.clone());
        }
        let mut distinct: Vec<Type> = Vec::new();
        for v in values.iter().filter(|v| !v.is_error()) {
            if !distinct.contains(v) {
                distinct.push(v.clone());
            }
        }
        if distinct.is_empty() {
            // Every arm failed; carry the first error through.
            return values.first().cloned();
        }
        let result = self.catalog.lub_all(&distinct);
        if self.options.strict_branch_joins && distinct.len() >= 2 {
            let object = self.catalog.object_type();
            if result == object && !distinct.contains(&object) {
                let err = TypeError::IncompatibleBranchTypes {
                    types: distinct.iter().map(Type::to_string).collect(),
                };
                return Some(Type::Error(ErrorType::single(err.to_string(), pos)));
            }
        }
        Some(result)
    }

    fn recompute_method(&self, params: &[FutureId], ret: FutureId) -> Option<Type> {
        let mut param_tys = Vec::with_capacity(params.len());
        for p in params {
            param_tys.push(self.graph.value(*p)?.clone());
        }
        let ret_ty = self.graph.value(ret)?.clone();
        Some(Type::Function { params: param_tys, ret: Box::new(ret_ty) })
    }

    fn recompute_cast(&self, target: FutureId, value: FutureId, pos: Position) -> Option<Type> {
        let value_ty = self.graph.value(value)?.clone();
        if value_ty.is_error() {
            return Some(value_ty);
        }
        let target_ty = self.graph.value(target)?.clone();
        if target_ty.is_error() {
            return Some(target_ty);
        }
        if self.catalog.can_cast(&value_ty, &target_ty) {
            Some(target_ty)
        } else {
            let err = TypeError::InvalidCast {
                from: value_ty.to_string(),
                to: target_ty.to_string(),
            };
            Some(Type::Error(ErrorType::single(err.to_string(), pos)))
        }
    }

    fn recompute_call(&mut self, id: FutureId, state: CallState, pos: Position) -> Option<Type> {
        let receiver_ty = self.graph.value(state.receiver)?.clone();
        if receiver_ty.is_error() {
            return Some(receiver_ty);
        }

        let entries = self.catalog.lookup_methods(&receiver_ty, &state.name);
        if entries.is_empty() {
            // The definition may simply not have been walked yet.
            return None;
        }

        let mut arg_tys = Vec::with_capacity(state.args.len());
        for a in &state.args {
            arg_tys.push(self.graph.value(*a)?.clone());
        }
        // An error argument absorbs the call; dispatching on it would
        // only manufacture secondary noise.
        if let Some(err) = arg_tys.iter().find(|t| t.is_error()) {
            return Some(err.clone());
        }

        let arity_matched: Vec<MethodEntry> = entries
            .into_iter()
            .filter(|e| e.params.len() == state.args.len())
            .collect();
        if arity_matched.is_empty() {
            let err = TypeError::NoApplicableOverload {
                name: state.name.clone(),
                receiver: receiver_ty.to_string(),
                args: arg_tys.iter().map(Type::to_string).collect(),
            };
            return Some(Type::Error(ErrorType::single(err.to_string(), pos)));
        }

        // A unique candidate may have parameters with no declared type;
        // this call's arguments establish them (done once per call).
        if arity_matched.len() == 1 && !state.params_seeded {
            let params = arity_matched[0].params.clone();
            for (param, arg) in params.iter().zip(&state.args) {
                let undeclared = matches!(
                    self.graph.kind(*param),
                    FutureKind::Assignable(s) if s.declarations.is_empty()
                );
                if undeclared {
                    slot::assign(&mut self.graph, *param, *arg, pos);
                }
            }
            if let FutureKind::Call(s) = self.graph.kind_mut(id) {
                s.params_seeded = true;
            }
        }

        // Collect fully-known signatures; defer while any candidate's
        // parameter types are still settling.
        let mut candidates: Vec<(MethodEntry, Vec<Type>)> = Vec::new();
        let mut pending = false;
        for entry in &arity_matched {
            let mut param_tys = Vec::with_capacity(entry.params.len());
            let mut incomplete = false;
            for p in &entry.params {
                match self.graph.value(*p) {
                    Some(t) => param_tys.push(t.clone()),
                    None => {
                        incomplete = true;
                        self.watch(id, *p);
                    }
                }
            }
            if incomplete {
                pending = true;
            } else {
                candidates.push((entry.clone(), param_tys));
            }
        }
        if pending {
            return None;
        }

        for phase in DISPATCH_PHASES {
            let matching: Vec<&(MethodEntry, Vec<Type>)> = candidates
                .iter()
                .filter(|(_, param_tys)| {
                    param_tys
                        .iter()
                        .zip(&arg_tys)
                        .all(|(p, a)| arg_matches(phase, p, a))
                })
                .collect();
            match matching.len() {
                0 => continue,
                1 => {
                    let ret = matching[0].0.ret;
                    self.watch(id, ret);
                    return self.graph.value(ret).cloned();
                }
                n => {
                    let err = TypeError::AmbiguousCall {
                        name: state.name.clone(),
                        receiver: receiver_ty.to_string(),
                        count: n,
                    };
                    return Some(Type::Error(ErrorType::single(err.to_string(), pos)));
                }
            }
        }

        let err = TypeError::NoApplicableOverload {
            name: state.name.clone(),
            receiver: receiver_ty.to_string(),
            args: arg_tys.iter().map(Type::to_string).collect(),
        };
        Some(Type::Error(ErrorType::single(err.to_string(), pos)))
    }

    /// Register a dynamically-discovered dependency of a call (a
    /// candidate's parameter or return future).
    fn watch(&mut self, call: FutureId, source: FutureId) {
        self.graph.on_update(source, call);
        if let FutureKind::Call(s) = self.graph.kind_mut(call) {
            if !s.watching.contains(&source) {
                s.watching.push(source);
            }
        }
    }

    // ── Reporting ──────────────────────────────────────────────────────

    /// Everything wrong with the compilation so far, in deterministic
    /// order: unit-preparation diagnostics first, then every distinct
    /// (message, position) pair carried by an error-typed future, then
    /// a terminal report for each future that stabilized unresolved.
    ///
    /// This is a pure query: futures are not transitioned, so walking
    /// another unit and resolving again can still heal a deferred
    /// future reported here.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut seen: FxHashSet<(String, Position)> = FxHashSet::default();
        let mut out = Vec::new();
        for d in &self.session_diagnostics {
            if seen.insert((d.message.clone(), d.position)) {
                out.push(d.clone());
            }
        }
        let mut any_unresolved = false;
        let mut found_root_cause = false;
        for id in self.graph.ids() {
            match self.graph.value(id) {
                Some(Type::Error(e)) => {
                    for (message, position) in &e.messages {
                        if seen.insert((message.clone(), *position)) {
                            out.push(Diagnostic::new(message.clone(), *position));
                        }
                    }
                }
                Some(_) => {}
                None => {
                    any_unresolved = true;
                    let kind = self.graph.kind(id);
                    let blocked = kind
                        .inputs()
                        .iter()
                        .any(|input| self.graph.value(*input).is_none());
                    if blocked {
                        // Not a root cause; its blocker gets the report.
                        continue;
                    }
                    found_root_cause = true;
                    let message = self.unresolved_message(kind);
                    let position = self.graph.position(id);
                    if seen.insert((message.clone(), position)) {
                        out.push(Diagnostic::new(message, position));
                    }
                }
            }
        }
        // A dependency cycle can leave every unresolved future blocked
        // on another (a genuinely undecidable program). Anchor the
        // report on the syntax nodes involved.
        if any_unresolved && !found_root_cause {
            let node_futures: FxHashSet<FutureId> = self.memo.values().copied().collect();
            for id in self.graph.ids() {
                if self.graph.value(id).is_none() && node_futures.contains(&id) {
                    let message = TypeError::Unresolved.to_string();
                    let position = self.graph.position(id);
                    if seen.insert((message.clone(), position)) {
                        out.push(Diagnostic::new(message, position));
                    }
                }
            }
        }
        out
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics().is_empty()
    }

    fn unresolved_message(&self, kind: &FutureKind) -> String {
        match kind {
            FutureKind::Descriptor { name, .. } => {
                TypeError::CannotFindClass { name: name.clone() }.to_string()
            }
            FutureKind::Call(state) => {
                let receiver = self
                    .graph
                    .value(state.receiver)
                    .expect("a root-cause call has a resolved receiver");
                if !self.catalog.has_member(receiver, &state.name) {
                    TypeError::NoSuchMethod {
                        name: state.name.clone(),
                        receiver: receiver.to_string(),
                    }
                    .to_string()
                } else {
                    TypeError::Unresolved.to_string()
                }
            }
            _ => TypeError::Unresolved.to_string(),
        }
    }

    /// Snapshot the compilation's outcome for the codegen collaborator.
    pub fn result(&self) -> crate::TyperResult {
        let mut types = FxHashMap::default();
        for (node, fut) in &self.memo {
            if let Some(ty) = self.graph.value(*fut) {
                types.insert(*node, ty.clone());
            }
        }
        let result_type = self
            .last_body
            .and_then(|body| self.type_of(body))
            .cloned();
        crate::TyperResult {
            types,
            diagnostics: self.diagnostics(),
            result_type,
        }
    }
}
