//! Shared value types for the Sable compiler.
//!
//! Everything downstream of the parser speaks in terms of these types:
//! source identities and positions ([`span`]) and collected diagnostics
//! ([`diag`]). Nothing here depends on the typer or the syntax forest.

pub mod diag;
pub mod span;

pub use diag::Diagnostic;
pub use span::{Position, SourceId, SourceMap};
