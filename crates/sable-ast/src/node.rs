//! Node kinds of the Sable syntax forest.

use sable_common::Position;
use serde::Serialize;

use crate::NodeId;

/// A declared method parameter.
///
/// The annotation is a type descriptor name (e.g. `"int"`,
/// `"String"`, `"Foo[]"`). An unannotated parameter's type is inferred
/// from call sites during resolution.
#[derive(Debug, Clone, Serialize)]
pub struct MethodParam {
    pub name: String,
    pub annotation: Option<String>,
    pub position: Position,
}

/// One `when` arm of a case expression.
#[derive(Debug, Clone, Serialize)]
pub struct WhenArm {
    pub condition: NodeId,
    pub body: NodeId,
}

/// Every construct the type resolver has an inference rule for.
///
/// This enum is deliberately closed: the driver matches it exhaustively,
/// so a new node kind cannot be added without defining its rule.
#[derive(Debug, Clone, Serialize)]
pub enum NodeKind {
    /// A top-level compilation unit. Its own type is always void.
    Script { body: NodeId },
    /// A statement sequence; types as its last statement, or the
    /// implicit-nil type when empty.
    Body { statements: Vec<NodeId> },
    /// Integer literal. The value is kept for constructs that need a
    /// compile-time constant (case arms, constant folding downstream).
    IntLit { value: i64 },
    /// Float literal, value kept as for `IntLit`.
    FloatLit { value: f64 },
    StringLit { value: String },
    BoolLit { value: bool },
    /// An explicit `nil` expression.
    NilLit,
    /// Read of a local variable or parameter.
    LocalRead { name: String },
    /// Write to a local variable, creating the slot on first write.
    LocalWrite { name: String, value: NodeId },
    /// `if`/`else`. A missing else arm contributes the implicit-nil type
    /// to the join.
    If {
        condition: NodeId,
        then_body: NodeId,
        else_body: Option<NodeId>,
    },
    /// `case`/`when` chain; arms join exactly like `if` arms.
    Case {
        arms: Vec<WhenArm>,
        else_body: Option<NodeId>,
    },
    /// Method call with an explicit receiver expression.
    Call {
        receiver: NodeId,
        name: String,
        args: Vec<NodeId>,
    },
    /// Method call on the implicit self of the enclosing scope.
    FunctionalCall { name: String, args: Vec<NodeId> },
    /// Reference to a class by name; types as the class's meta
    /// (static-view) type.
    ConstRef { name: String },
    /// Method definition. `is_static` selects the meta member table.
    MethodDef {
        name: String,
        params: Vec<MethodParam>,
        return_annotation: Option<String>,
        body: NodeId,
        is_static: bool,
    },
    /// Class or interface definition.
    ClassDef {
        name: String,
        superclass: Option<String>,
        interfaces: Vec<String>,
        body: NodeId,
        is_interface: bool,
    },
    /// Early return from the enclosing method.
    Return { value: Option<NodeId> },
    /// Cast expression: `value` viewed as the named target type.
    Cast { target: String, value: NodeId },
}
