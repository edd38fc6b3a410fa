//! Diagnostic rendering.
//!
//! Turns the collected `(message, position)` pairs into ariadne reports
//! for terminal output, or into JSON for tooling. Rendering is
//! presentation only: the resolver itself never formats or prints.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use serde::Serialize;

use sable_common::{Diagnostic, SourceMap};

/// Rendering knobs. Colorless output is byte-for-byte deterministic,
/// which is what the snapshot tests pin.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticOptions {
    pub color: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions { color: true }
    }
}

impl DiagnosticOptions {
    /// Options for deterministic, plain-text output.
    pub fn colorless() -> Self {
        DiagnosticOptions { color: false }
    }
}

fn byte_range(diag: &Diagnostic, sources: &SourceMap) -> Range<usize> {
    let pos = diag.position;
    let start = sources.offset(pos.source, pos.start_line, pos.start_col);
    let end = sources.offset(pos.source, pos.end_line, pos.end_col);
    let end = end.max(start);
    if start == end {
        // ariadne needs at least a one-byte span.
        start..(end + 1).min(sources.text(pos.source).len().max(start + 1))
    } else {
        start..end
    }
}

/// Render one diagnostic as an ariadne report string.
///
/// Synthetic positions have no source to excerpt and render as a bare
/// `error:` line.
pub fn render_diagnostic(
    diag: &Diagnostic,
    sources: &SourceMap,
    options: &DiagnosticOptions,
) -> String {
    if diag.position.is_synthetic() {
        return format!("error: {}\n", diag.message);
    }

    let config = Config::default().with_color(options.color);
    let range = byte_range(diag, sources);
    let source_text = sources.text(diag.position.source);

    let report = Report::build(ReportKind::Error, range.clone())
        .with_message(&diag.message)
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(&diag.message)
                .with_color(Color::Red),
        )
        .finish();

    let mut buf = Vec::new();
    report
        .write(Source::from(source_text), &mut buf)
        .expect("failed to write diagnostic");
    String::from_utf8(buf).expect("diagnostic output should be valid UTF-8")
}

/// Render every diagnostic in order.
pub fn render_all(
    diags: &[Diagnostic],
    sources: &SourceMap,
    options: &DiagnosticOptions,
) -> Vec<String> {
    diags
        .iter()
        .map(|d| render_diagnostic(d, sources, options))
        .collect()
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    message: &'a str,
    file: &'a str,
    start_line: u32,
    start_col: u32,
    end_line: u32,
    end_col: u32,
}

/// Machine-readable rendering of the diagnostic list.
pub fn render_json(diags: &[Diagnostic], sources: &SourceMap) -> String {
    let entries: Vec<JsonDiagnostic<'_>> = diags
        .iter()
        .map(|d| JsonDiagnostic {
            message: &d.message,
            file: sources.name(d.position.source),
            start_line: d.position.start_line,
            start_col: d.position.start_col,
            end_line: d.position.end_line,
            end_col: d.position.end_col,
        })
        .collect();
    serde_json::to_string_pretty(&entries).expect("diagnostics serialize to JSON")
}

#[cfg(test)]
mod tests {
    use sable_common::Position;

    use super::*;

    #[test]
    fn synthetic_positions_render_without_a_source_excerpt() {
        let sources = SourceMap::new();
        let diag = Diagnostic::new("cannot infer type", Position::synthetic());
        let out = render_diagnostic(&diag, &sources, &DiagnosticOptions::colorless());
        assert_eq!(out, "error: cannot infer type\n");
    }

    #[test]
    fn rendered_report_names_the_error() {
        let mut sources = SourceMap::new();
        let id = sources.add("main.sb", "a = b\n");
        let diag = Diagnostic::new(
            "undefined variable `b`",
            Position::new(id, 1, 5, 1, 6),
        );
        let out = render_diagnostic(&diag, &sources, &DiagnosticOptions::colorless());
        assert!(out.contains("Error"), "missing header: {out}");
        assert!(out.contains("undefined variable `b`"), "missing message: {out}");
    }

    #[test]
    fn json_rendering_carries_positions() {
        let mut sources = SourceMap::new();
        let id = sources.add("main.sb", "a = b\n");
        let diags = vec![Diagnostic::new(
            "undefined variable `b`",
            Position::new(id, 1, 5, 1, 6),
        )];
        let json = render_json(&diags, &sources);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["file"], "main.sb");
        assert_eq!(parsed[0]["start_line"], 1);
        assert_eq!(parsed[0]["message"], "undefined variable `b`");
    }
}
