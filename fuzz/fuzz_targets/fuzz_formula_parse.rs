//! Fuzzes formula parsing, compilation and evaluation.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_formula_parse
#![no_main]
use libfuzzer_sys::fuzz_target;
use tabletfx_expr::{EvalStack, VariableSchema, compile_formula};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let schema = VariableSchema::new(["x", "y", "lx", "ly", "mx", "my"]);
    // Rejection is fine; a panic or stack overflow is not.
    if let Ok(expression) = compile_formula(source, &schema) {
        let mut stack = EvalStack::with_capacity(expression.max_stack());
        let _value = expression.call_with(&[1.0, -2.0, 0.0, 3.5, 15200.0, 9500.0], &mut stack);
    }
});
