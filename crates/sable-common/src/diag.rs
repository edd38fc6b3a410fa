use std::fmt;

use serde::Serialize;

use crate::span::Position;

/// One reported inference problem.
///
/// Diagnostics are collected during resolution rather than thrown,
/// enabling the driver to keep inferring past a bad expression and
/// report every issue at once. The end-to-end compiler halts before
/// codegen whenever the collected list is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self { message: message.into(), position }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
