//! Type representation for the Sable type system.
//!
//! Defines the core [`Type`] enum, interned nominal types, and the error
//! type that flows through inference as an absorbing element. Types are
//! immutable values: a non-error type's identity is its nominal name,
//! and two error types are equal exactly when their message lists are.

use std::fmt;

use sable_common::Position;

/// What sort of nominal a name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NominalKind {
    Primitive,
    Class,
    Interface,
}

/// A named type: a primitive, class, or interface.
///
/// Nominals are interned by name in the [`crate::catalog::TypeCatalog`];
/// the `kind` and transitive `supers` list are fixed at interning time
/// and excluded from identity, which is the name alone.
#[derive(Debug, Clone)]
pub struct NominalType {
    pub name: String,
    pub kind: NominalKind,
    /// Transitive supertype names (superclasses and interfaces).
    pub supers: Vec<String>,
}

impl NominalType {
    pub fn new(name: impl Into<String>, kind: NominalKind, supers: Vec<String>) -> Self {
        NominalType { name: name.into(), kind, supers }
    }

    /// Whether `name` is this type or one of its supertypes.
    pub fn is_or_extends(&self, name: &str) -> bool {
        self.name == name || self.supers.iter().any(|s| s == name)
    }
}

impl PartialEq for NominalType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name // kind and supers intentionally excluded
    }
}

impl Eq for NominalType {}

impl std::hash::Hash for NominalType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state); // kind and supers intentionally excluded
    }
}

/// The absorbing error type: an ordered list of (message, position)
/// pairs recording everything that went wrong on the path that produced
/// it.
///
/// Error types compare equal when their message lists are equal, so the
/// resolution loop's change detection treats a re-derived identical
/// error as "no transition".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorType {
    pub messages: Vec<(String, Position)>,
}

impl ErrorType {
    pub fn new(messages: Vec<(String, Position)>) -> Self {
        ErrorType { messages }
    }

    pub fn single(message: impl Into<String>, position: Position) -> Self {
        ErrorType { messages: vec![(message.into(), position)] }
    }
}

/// A Sable type.
///
/// - `Nominal`: an interned primitive, class, or interface
/// - `Array`: an array of some element type
/// - `Meta`: the static view of a type (what a class name evaluates to)
/// - `Function`: a resolved method signature
/// - `Void`: the type of a compilation unit and of value-less returns
/// - `ImplicitNil`: "no value produced" (an empty body); distinct from
///   an actual `Null` value
/// - `Error`: the absorbing element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Nominal(NominalType),
    Array(Box<Type>),
    Meta(Box<Type>),
    Function { params: Vec<Type>, ret: Box<Type> },
    Void,
    ImplicitNil,
    Null,
    Error(ErrorType),
}

/// Widening order of the primitive numerics. A value of a type earlier
/// in this list is implicitly assignable to any later one.
pub const NUMERIC_WIDENING: [&str; 4] = ["int", "long", "float", "double"];

/// (primitive, boxed class) pairs for boxing and unboxing conversions.
pub const BOXING_PAIRS: [(&str, &str); 6] = [
    ("int", "Int"),
    ("long", "Long"),
    ("float", "Float"),
    ("double", "Double"),
    ("bool", "Bool"),
    ("char", "Char"),
];

fn widening_index(name: &str) -> Option<usize> {
    NUMERIC_WIDENING.iter().position(|n| *n == name)
}

/// The boxed counterpart of a primitive name, if any.
pub fn boxed_name(primitive: &str) -> Option<&'static str> {
    BOXING_PAIRS.iter().find(|(p, _)| *p == primitive).map(|(_, b)| *b)
}

/// The primitive counterpart of a boxed class name, if any.
pub fn unboxed_name(boxed: &str) -> Option<&'static str> {
    BOXING_PAIRS.iter().find(|(_, b)| *b == boxed).map(|(p, _)| *p)
}

impl Type {
    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error(_))
    }

    pub fn as_error(&self) -> Option<&ErrorType> {
        match self {
            Type::Error(e) => Some(e),
            _ => None,
        }
    }

    /// True only for the error type: it satisfies any requested type,
    /// preventing cascades of secondary errors once one has occurred.
    pub fn matches_anything(&self) -> bool {
        self.is_error()
    }

    /// Whether this type is a reference type (can hold null).
    pub fn is_reference(&self) -> bool {
        match self {
            Type::Nominal(n) => n.kind != NominalKind::Primitive,
            Type::Array(_) | Type::Meta(_) | Type::Function { .. } => true,
            _ => false,
        }
    }

    /// Whether this type is a numeric primitive or a boxed numeric.
    pub fn is_numeric(&self) -> bool {
        match self {
            Type::Nominal(n) => {
                widening_index(&n.name).is_some()
                    || unboxed_name(&n.name).is_some_and(|p| widening_index(p).is_some())
            }
            _ => false,
        }
    }

    /// Position in the widening order, for primitives and boxed
    /// numerics alike.
    pub fn numeric_rank(&self) -> Option<usize> {
        match self {
            Type::Nominal(n) => {
                widening_index(&n.name).or_else(|| unboxed_name(&n.name).and_then(widening_index))
            }
            _ => None,
        }
    }

    /// Can a value of type `other` be stored in a slot of type `self`
    /// without an explicit cast?
    ///
    /// Holds for nominal identity, a recorded subtype, a widening
    /// numeric conversion, a boxing or unboxing conversion, and for the
    /// error type on either side (error absorbs, and is never rejected).
    pub fn assignable_from(&self, other: &Type) -> bool {
        if self.is_error() || other.is_error() {
            return true;
        }
        if self == other {
            return true;
        }
        match (self, other) {
            // Null and "no value" fit any reference slot.
            (target, Type::Null) | (target, Type::ImplicitNil) => target.is_reference(),
            (Type::Nominal(target), Type::Nominal(source)) => {
                // Widening numeric conversion.
                if let (Some(t), Some(s)) = (widening_index(&target.name), widening_index(&source.name)) {
                    return s <= t;
                }
                // Boxing and unboxing.
                if boxed_name(&source.name) == Some(target.name.as_str())
                    || unboxed_name(&source.name) == Some(target.name.as_str())
                {
                    return true;
                }
                // Up-cast to a recorded supertype.
                source.is_or_extends(&target.name)
            }
            // Any array or function up-casts to Object.
            (Type::Nominal(target), Type::Array(_)) | (Type::Nominal(target), Type::Function { .. }) => {
                target.name == "Object"
            }
            // Arrays are invariant in their element type.
            (Type::Array(a), Type::Array(b)) => a == b,
            _ => false,
        }
    }

    fn write_name(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Nominal(n) => write!(f, "{}", n.name),
            Type::Array(elem) => write!(f, "{}[]", elem),
            Type::Meta(inner) => write!(f, "{}.class", inner),
            Type::Function { params, ret } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", ret)
            }
            Type::Void => write!(f, "void"),
            Type::ImplicitNil => write!(f, "implicit_nil"),
            Type::Null => write!(f, "null"),
            Type::Error(_) => write!(f, ":error"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_name(f)
    }
}
