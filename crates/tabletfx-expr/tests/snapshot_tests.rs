//! Snapshot tests for parse trees and diagnostics using insta.

use tabletfx_expr::{VariableSchema, compile_formula, parse};

fn schema() -> VariableSchema {
    VariableSchema::new(["x", "y", "lx", "ly", "mx", "my"])
}

fn parse_error(source: &str) -> String {
    match parse(source, &schema()) {
        Ok(expr) => panic!("expected parse failure for {source:?}, got {expr}"),
        Err(e) => e.to_string(),
    }
}

fn tree(source: &str) -> String {
    match parse(source, &schema()) {
        Ok(expr) => expr.to_string(),
        Err(e) => panic!("parse failed for {source:?}: {e}"),
    }
}

#[test]
fn snapshot_smoothing_formula_tree() {
    insta::assert_snapshot!(tree("x + (x - lx) * 0.5"), @"(x + ((x - lx) * 0.5))");
}

#[test]
fn snapshot_area_mapping_tree() {
    insta::assert_snapshot!(
        tree("clamp(2x - mx/4, 0, mx)"),
        @"clamp(((2 * x) - (mx / 4)), 0, mx)"
    );
}

#[test]
fn snapshot_unknown_variable_message() {
    insta::assert_snapshot!(parse_error("x + tx"), @"Unknown variable 'tx' at offset 4");
}

#[test]
fn snapshot_unknown_function_message() {
    insta::assert_snapshot!(parse_error("lerp(x, y)"), @"Unknown function 'lerp' at offset 0");
}

#[test]
fn snapshot_arity_message() {
    insta::assert_snapshot!(
        parse_error("pow(x)"),
        @"Function 'pow' takes 2 argument(s), got 1"
    );
}

#[test]
fn snapshot_unbalanced_message() {
    insta::assert_snapshot!(parse_error("(x + y"), @"Unexpected end of formula, expected ')'");
}

#[test]
fn snapshot_formula_error_message() {
    let message = match compile_formula("x $ y", &schema()) {
        Ok(_) => panic!("expected failure"),
        Err(e) => e.to_string(),
    };
    insta::assert_snapshot!(message, @"Parse error: Unexpected character '$' at offset 2");
}

#[test]
fn snapshot_compiled_debug() {
    let expr = match compile_formula("x * 2 + 1", &schema()) {
        Ok(expr) => expr,
        Err(e) => panic!("compile failed: {e}"),
    };
    insta::assert_snapshot!(
        format!("{expr:?}"),
        @r#"CompiledExpression { source: "x * 2 + 1", arity: 6, instructions: 5, max_stack: 2 }"#
    );
}
