//! The type catalog: every nominally-named type the engine knows.
//!
//! The catalog interns nominal types (append-only; a type's identity is
//! never mutated), wraps descriptor names as futures for forward
//! references, owns the per-type member tables consulted by overload
//! dispatch, and answers the coercion questions (widening, boxing,
//! casts, least upper bound) the inference rules need.

use rustc_hash::FxHashMap;
use sable_common::Position;

use crate::future::{FutureGraph, FutureId, FutureKind};
use crate::ty::{boxed_name, NominalKind, NominalType, Type, NUMERIC_WIDENING};

/// One method signature in a member table. Parameter and return types
/// are futures so signatures participate in deferred resolution.
#[derive(Debug, Clone)]
pub struct MethodEntry {
    pub params: Vec<FutureId>,
    pub ret: FutureId,
    pub position: Position,
    /// Set on the implicit zero-argument constructor; replaced when an
    /// explicit `initialize` is defined.
    pub is_default_ctor: bool,
}

type MemberTable = FxHashMap<String, Vec<MethodEntry>>;

/// Interned nominal types plus member tables and coercion rules.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    nominals: FxHashMap<String, NominalType>,
    instance_members: FxHashMap<String, MemberTable>,
    meta_members: FxHashMap<String, MemberTable>,
    wraps: FxHashMap<(String, bool), FutureId>,
    builtins_registered: bool,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the built-in primitives and core classes. Idempotent;
    /// in a parallel unit-preparation phase exactly one worker performs
    /// this (guarded by the session), and later calls are no-ops.
    pub fn register_builtins(&mut self) {
        if self.builtins_registered {
            return;
        }
        self.builtins_registered = true;

        for name in NUMERIC_WIDENING {
            self.intern(NominalType::new(name, NominalKind::Primitive, vec![]));
        }
        self.intern(NominalType::new("bool", NominalKind::Primitive, vec![]));
        self.intern(NominalType::new("char", NominalKind::Primitive, vec![]));

        self.intern(NominalType::new("Object", NominalKind::Class, vec![]));
        for name in ["Int", "Long", "Float", "Double", "Bool", "Char", "String"] {
            self.intern(NominalType::new(name, NominalKind::Class, vec!["Object".into()]));
        }
    }

    fn intern(&mut self, nominal: NominalType) -> &NominalType {
        self.nominals.entry(nominal.name.clone()).or_insert(nominal)
    }

    pub fn get(&self, name: &str) -> Option<&NominalType> {
        self.nominals.get(name)
    }

    /// Intern a user-defined class or interface, computing its
    /// transitive supertype list from what is currently known about the
    /// named supertypes. Re-defining an existing name returns the
    /// original interning (type identity is append-only).
    ///
    /// Also installs the implicit zero-argument constructor on the
    /// class's meta type.
    pub fn define_class(
        &mut self,
        graph: &mut FutureGraph,
        name: &str,
        superclass: Option<&str>,
        interfaces: &[String],
        is_interface: bool,
        position: Position,
    ) -> Type {
        if let Some(existing) = self.nominals.get(name) {
            return Type::Nominal(existing.clone());
        }

        // Nearest supertypes first; Object is always last so the LUB
        // walk finds the narrowest common supertype before the root.
        let mut supers: Vec<String> = Vec::new();
        let mut direct: Vec<&str> = Vec::new();
        if !is_interface {
            direct.push(superclass.unwrap_or("Object"));
        }
        direct.extend(interfaces.iter().map(|s| s.as_str()));
        for parent in direct {
            if parent != "Object" && !supers.iter().any(|s| s == parent) {
                supers.push(parent.to_string());
            }
            if let Some(known) = self.nominals.get(parent) {
                for grand in &known.supers {
                    if grand != "Object" && !supers.iter().any(|s| s == grand) {
                        supers.push(grand.clone());
                    }
                }
            }
        }
        supers.push("Object".to_string());

        let kind = if is_interface { NominalKind::Interface } else { NominalKind::Class };
        let nominal = NominalType::new(name, kind, supers);
        let ty = Type::Nominal(nominal.clone());
        self.nominals.insert(name.to_string(), nominal);

        if !is_interface {
            let instance = graph.new_resolved(ty.clone(), position);
            self.meta_members.entry(name.to_string()).or_default().insert(
                "new".to_string(),
                vec![MethodEntry {
                    params: vec![],
                    ret: instance,
                    position,
                    is_default_ctor: true,
                }],
            );
        }
        ty
    }

    /// Wrap a type descriptor as a future. The same descriptor always
    /// yields the same future; a name with no interned type stays
    /// unresolved until its definition appears (or becomes a
    /// cannot-find-class report at the end of resolution).
    pub fn wrap(
        &mut self,
        graph: &mut FutureGraph,
        name: &str,
        meta: bool,
        position: Position,
    ) -> FutureId {
        if let Some(id) = self.wraps.get(&(name.to_string(), meta)) {
            return *id;
        }
        let id = graph.new_future(
            FutureKind::Descriptor { name: name.to_string(), meta },
            position,
        );
        self.wraps.insert((name.to_string(), meta), id);
        id
    }

    /// Resolve a descriptor name against the interned table. Array
    /// descriptors use `[]` suffixes; `meta` selects the static view.
    pub fn resolve_descriptor(&self, name: &str, meta: bool) -> Option<Type> {
        let base = if let Some(elem) = name.strip_suffix("[]") {
            Some(Type::Array(Box::new(self.resolve_descriptor(elem, false)?)))
        } else {
            match name {
                "void" => Some(Type::Void),
                "null" => Some(Type::Null),
                _ => self.nominals.get(name).map(|n| Type::Nominal(n.clone())),
            }
        }?;
        Some(if meta { Type::Meta(Box::new(base)) } else { base })
    }

    /// Register a method under `owner`'s instance or meta member table.
    pub fn add_method(
        &mut self,
        owner: &str,
        is_static: bool,
        name: &str,
        entry: MethodEntry,
    ) {
        let table = if is_static {
            self.meta_members.entry(owner.to_string()).or_default()
        } else {
            self.instance_members.entry(owner.to_string()).or_default()
        };
        table.entry(name.to_string()).or_default().push(entry);
    }

    /// Register a constructor: an `initialize` definition replaces the
    /// implicit zero-argument constructor on the meta type.
    pub fn add_constructor(&mut self, owner: &str, entry: MethodEntry) {
        let table = self.meta_members.entry(owner.to_string()).or_default();
        let entries = table.entry("new".to_string()).or_default();
        entries.retain(|e| !e.is_default_ctor);
        entries.push(entry);
    }

    /// All members named `name` visible on `receiver`: the receiver's
    /// own table first, then its supertypes' in recorded order. A meta
    /// receiver searches the static tables.
    pub fn lookup_methods(&self, receiver: &Type, name: &str) -> Vec<MethodEntry> {
        let (tables, type_name, supers): (&FxHashMap<String, MemberTable>, &str, &[String]) =
            match receiver {
                Type::Nominal(n) => (&self.instance_members, n.name.as_str(), &n.supers),
                Type::Meta(inner) => match inner.as_ref() {
                    Type::Nominal(n) => (&self.meta_members, n.name.as_str(), &n.supers),
                    _ => return vec![],
                },
                _ => return vec![],
            };

        let mut found = Vec::new();
        for owner in std::iter::once(type_name).chain(supers.iter().map(|s| s.as_str())) {
            if let Some(entries) = tables.get(owner).and_then(|t| t.get(name)) {
                found.extend(entries.iter().cloned());
            }
        }
        found
    }

    /// Whether any member with this name exists on the receiver at all
    /// (used to distinguish "no such method" from "none applicable").
    pub fn has_member(&self, receiver: &Type, name: &str) -> bool {
        !self.lookup_methods(receiver, name).is_empty()
    }

    /// Whether an explicit cast from `from` to `to` is permitted:
    /// numeric conversions in both directions, boxing and unboxing, and
    /// reference casts between related types.
    pub fn can_cast(&self, from: &Type, to: &Type) -> bool {
        if from.is_error() || to.is_error() || from == to {
            return true;
        }
        if from.is_numeric() && to.is_numeric() {
            return true;
        }
        if let (Type::Nominal(f), Type::Nominal(t)) = (from, to) {
            if boxed_name(&f.name) == Some(t.name.as_str())
                || boxed_name(&t.name) == Some(f.name.as_str())
            {
                return true;
            }
        }
        if from.is_reference() && to.is_reference() {
            return to.assignable_from(from) || from.assignable_from(to);
        }
        false
    }

    /// The least upper bound of two types: the narrowest type both arms
    /// of a join are assignable to. Falls back to `Object` for
    /// unrelated reference types.
    pub fn lub(&self, a: &Type, b: &Type) -> Type {
        if a == b {
            return a.clone();
        }
        if a.is_error() {
            return b.clone();
        }
        if b.is_error() {
            return a.clone();
        }
        // "No value" and null defer to the other arm's type.
        if matches!(a, Type::ImplicitNil | Type::Null) {
            return b.clone();
        }
        if matches!(b, Type::ImplicitNil | Type::Null) {
            return a.clone();
        }
        if a.assignable_from(b) {
            return a.clone();
        }
        if b.assignable_from(a) {
            return b.clone();
        }
        // Nearest common supertype by walking a's chain in order.
        if let (Type::Nominal(na), Type::Nominal(nb)) = (a, b) {
            for candidate in &na.supers {
                if nb.is_or_extends(candidate) {
                    if let Some(found) = self.nominals.get(candidate) {
                        return Type::Nominal(found.clone());
                    }
                }
            }
        }
        self.object_type()
    }

    /// Fold [`Self::lub`] over a list of arm types.
    pub fn lub_all(&self, types: &[Type]) -> Type {
        let mut iter = types.iter();
        let first = match iter.next() {
            Some(t) => t.clone(),
            None => return Type::ImplicitNil,
        };
        iter.fold(first, |acc, t| self.lub(&acc, t))
    }

    pub fn object_type(&self) -> Type {
        self.nominals
            .get("Object")
            .map(|n| Type::Nominal(n.clone()))
            .unwrap_or(Type::Void)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        let mut c = TypeCatalog::new();
        c.register_builtins();
        c
    }

    fn ty(c: &TypeCatalog, name: &str) -> Type {
        c.resolve_descriptor(name, false).unwrap()
    }

    #[test]
    fn builtins_are_interned_once() {
        let mut c = catalog();
        let before = c.get("int").cloned();
        c.register_builtins();
        assert_eq!(c.get("int").cloned(), before);
    }

    #[test]
    fn descriptor_resolution() {
        let c = catalog();
        assert_eq!(ty(&c, "int").to_string(), "int");
        assert_eq!(ty(&c, "String[]").to_string(), "String[]");
        assert_eq!(
            c.resolve_descriptor("String", true).unwrap().to_string(),
            "String.class"
        );
        assert!(c.resolve_descriptor("Missing", false).is_none());
    }

    #[test]
    fn define_class_records_transitive_supers() {
        let mut c = catalog();
        let mut graph = FutureGraph::new();
        let pos = Position::synthetic();
        c.define_class(&mut graph, "A", None, &[], false, pos);
        c.define_class(&mut graph, "B", Some("A"), &[], false, pos);
        let b = c.get("B").unwrap();
        assert!(b.is_or_extends("A"));
        assert!(b.is_or_extends("Object"));
    }

    #[test]
    fn define_class_is_append_only() {
        let mut c = catalog();
        let mut graph = FutureGraph::new();
        let pos = Position::synthetic();
        c.define_class(&mut graph, "A", None, &[], false, pos);
        // A second definition does not replace the first identity.
        c.define_class(&mut graph, "A", Some("String"), &[], false, pos);
        assert!(!c.get("A").unwrap().is_or_extends("String"));
    }

    #[test]
    fn default_constructor_is_visible_on_meta() {
        let mut c = catalog();
        let mut graph = FutureGraph::new();
        let pos = Position::synthetic();
        let a = c.define_class(&mut graph, "A", None, &[], false, pos);
        let meta = Type::Meta(Box::new(a));
        let ctors = c.lookup_methods(&meta, "new");
        assert_eq!(ctors.len(), 1);
        assert!(ctors[0].is_default_ctor);
    }

    #[test]
    fn explicit_constructor_replaces_default() {
        let mut c = catalog();
        let mut graph = FutureGraph::new();
        let pos = Position::synthetic();
        let a = c.define_class(&mut graph, "A", None, &[], false, pos);
        let param = graph.new_resolved(ty(&c, "int"), pos);
        let ret = graph.new_resolved(a.clone(), pos);
        c.add_constructor(
            "A",
            MethodEntry { params: vec![param], ret, position: pos, is_default_ctor: false },
        );
        let ctors = c.lookup_methods(&Type::Meta(Box::new(a)), "new");
        assert_eq!(ctors.len(), 1);
        assert_eq!(ctors[0].params.len(), 1);
    }

    #[test]
    fn lub_of_numerics_is_the_wider_type() {
        let c = catalog();
        assert_eq!(c.lub(&ty(&c, "int"), &ty(&c, "float")), ty(&c, "float"));
        assert_eq!(c.lub(&ty(&c, "float"), &ty(&c, "float")), ty(&c, "float"));
    }

    #[test]
    fn lub_of_unrelated_references_is_object() {
        let mut c = catalog();
        let mut graph = FutureGraph::new();
        let pos = Position::synthetic();
        let a = c.define_class(&mut graph, "A", None, &[], false, pos);
        let b = c.define_class(&mut graph, "B", None, &[], false, pos);
        assert_eq!(c.lub(&a, &b), c.object_type());
    }

    #[test]
    fn lub_finds_nearest_common_superclass() {
        let mut c = catalog();
        let mut graph = FutureGraph::new();
        let pos = Position::synthetic();
        c.define_class(&mut graph, "Base", None, &[], false, pos);
        let l = c.define_class(&mut graph, "Left", Some("Base"), &[], false, pos);
        let r = c.define_class(&mut graph, "Right", Some("Base"), &[], false, pos);
        assert_eq!(c.lub(&l, &r).to_string(), "Base");
    }

    #[test]
    fn lub_prefers_a_shared_interface_over_object() {
        let mut c = catalog();
        let mut graph = FutureGraph::new();
        let pos = Position::synthetic();
        c.define_class(&mut graph, "Greeter", None, &[], true, pos);
        let a = c.define_class(&mut graph, "A", None, &["Greeter".into()], false, pos);
        let b = c.define_class(&mut graph, "B", None, &["Greeter".into()], false, pos);
        assert_eq!(c.lub(&a, &b).to_string(), "Greeter");
    }

    #[test]
    fn lub_absorbs_implicit_nil() {
        let c = catalog();
        assert_eq!(c.lub(&Type::ImplicitNil, &ty(&c, "String")), ty(&c, "String"));
    }

    #[test]
    fn cast_table() {
        let c = catalog();
        assert!(c.can_cast(&ty(&c, "double"), &ty(&c, "int")));
        assert!(c.can_cast(&ty(&c, "int"), &ty(&c, "Int")));
        assert!(c.can_cast(&ty(&c, "Object"), &ty(&c, "String")));
        assert!(!c.can_cast(&ty(&c, "String"), &ty(&c, "int")));
        assert!(!c.can_cast(&ty(&c, "bool"), &ty(&c, "int")));
    }
}
