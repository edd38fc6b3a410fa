//! Rendering tests for resolver diagnostics.
//!
//! Each test provokes a specific failure, runs resolution, and checks
//! the rendered output: ariadne reports for terminals, JSON for
//! tooling. Rendering is colorless here so the output is
//! deterministic.

use sable_ast::{Ast, NodeId, NodeKind};
use sable_common::{Position, SourceMap};
use sable_typer::diagnostics::{render_all, render_diagnostic, render_json, DiagnosticOptions};
use sable_typer::Typer;

/// Lay out one synthetic statement per source line so positions match
/// the registered source text.
fn source_line(n: u32) -> Position {
    Position::new(sable_common::SourceId(0), n, 1, n, 5)
}

fn undefined_variable_case() -> (Ast, NodeId, SourceMap) {
    let mut sources = SourceMap::new();
    sources.add("main.sb", "nope\n1.0\n");

    let mut ast = Ast::new();
    let bad = ast.push(NodeKind::LocalRead { name: "nope".into() }, source_line(1));
    let good = ast.push(NodeKind::FloatLit { value: 1.0 }, source_line(2));
    let body = ast.push(NodeKind::Body { statements: vec![bad, good] }, source_line(1));
    let script = ast.push(NodeKind::Script { body }, source_line(1));
    (ast, script, sources)
}

#[test]
fn ariadne_report_carries_message_and_location() {
    let (ast, script, sources) = undefined_variable_case();
    let mut typer = Typer::new(&ast);
    typer.infer(script);
    typer.resolve_all();

    let diags = typer.diagnostics();
    assert_eq!(diags.len(), 1);

    let out = render_diagnostic(&diags[0], &sources, &DiagnosticOptions::colorless());
    assert!(out.contains("Error"), "missing header: {out}");
    assert!(
        out.contains("undefined variable `nope`"),
        "missing message: {out}"
    );
    assert!(out.contains("nope"), "missing source excerpt: {out}");
}

#[test]
fn render_all_emits_one_report_per_diagnostic() {
    let mut sources = SourceMap::new();
    sources.add("main.sb", "a\nb\n");

    let mut ast = Ast::new();
    let a = ast.push(NodeKind::LocalRead { name: "a".into() }, source_line(1));
    let b = ast.push(NodeKind::LocalRead { name: "b".into() }, source_line(2));
    let body = ast.push(NodeKind::Body { statements: vec![a, b] }, source_line(1));
    let script = ast.push(NodeKind::Script { body }, source_line(1));

    let mut typer = Typer::new(&ast);
    typer.infer(script);
    typer.resolve_all();

    let rendered = render_all(
        &typer.diagnostics(),
        &sources,
        &DiagnosticOptions::colorless(),
    );
    assert_eq!(rendered.len(), 2);
    assert!(rendered[0].contains("undefined variable `a`"));
    assert!(rendered[1].contains("undefined variable `b`"));
}

#[test]
fn diagnostic_messages_are_stable() {
    let (ast, script, _sources) = undefined_variable_case();
    let mut typer = Typer::new(&ast);
    typer.infer(script);
    typer.resolve_all();

    let messages: Vec<String> = typer
        .diagnostics()
        .into_iter()
        .map(|d| d.message)
        .collect();
    insta::assert_snapshot!(messages.join("\n"), @"undefined variable `nope`");
}

#[test]
fn json_rendering_is_stable() {
    let (ast, script, sources) = undefined_variable_case();
    let mut typer = Typer::new(&ast);
    typer.infer(script);
    typer.resolve_all();

    let json = render_json(&typer.diagnostics(), &sources);
    insta::assert_snapshot!(json, @r###"
    [
      {
        "message": "undefined variable `nope`",
        "file": "main.sb",
        "start_line": 1,
        "start_col": 1,
        "end_line": 1,
        "end_col": 5
      }
    ]
    "###);
}

#[test]
fn synthetic_positions_render_as_bare_errors() {
    let sources = SourceMap::new();
    let diag = sable_common::Diagnostic::new("cannot infer type", Position::synthetic());
    let out = render_diagnostic(&diag, &sources, &DiagnosticOptions::colorless());
    insta::assert_snapshot!(out, @"error: cannot infer type");
}
