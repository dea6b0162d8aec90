//! Lowering of parsed formulas to flat stack bytecode.
//!
//! Variable references are resolved to argument slots at compile time and
//! constant subtrees are folded, so a call walks a short instruction list
//! with no name lookup and no parsing. Arithmetic runs on `Complex<f64>`;
//! the result of a call is the real part of the final value.

use crate::ast::{BinaryOp, Expr};
use crate::error::{CompileError, FormulaResult};
use crate::functions::{self, Function};
use crate::parser::parse;
use crate::schema::VariableSchema;
use num_complex::Complex64;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// One bytecode instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// Push a constant
    Const(Complex64),
    /// Push the argument at a slot
    Load(usize),
    /// Pop `b`, `a`; push `a + b`
    Add,
    /// Pop `b`, `a`; push `a - b`
    Sub,
    /// Pop `b`, `a`; push `a * b`
    Mul,
    /// Pop `b`, `a`; push `a / b`
    Div,
    /// Pop `b`, `a`; push `a ^ b`
    Pow,
    /// Negate the top of the stack
    Neg,
    /// Pop the function's arguments; push its result
    Call(Function),
}

/// Reusable evaluation stack.
///
/// Passing the same stack to [`CompiledExpression::call_with`] on every
/// report keeps evaluation allocation-free once the stack has grown to the
/// deepest expression it has served.
#[derive(Debug, Default, Clone)]
pub struct EvalStack {
    values: Vec<Complex64>,
}

impl EvalStack {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stack that can serve expressions up to `depth` deep without
    /// reallocating.
    #[must_use]
    pub fn with_capacity(depth: usize) -> Self {
        Self {
            values: Vec::with_capacity(depth),
        }
    }

    /// Current capacity in values.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.values.capacity()
    }
}

/// A formula compiled against a [`VariableSchema`].
///
/// Calling it takes the argument values in schema order and returns the
/// real part of the result. It is immutable, cheap to clone and can be
/// shared across threads.
///
/// # Example
///
/// ```
/// use tabletfx_expr::{VariableSchema, compile_formula};
///
/// let schema = VariableSchema::new(["x", "y", "lx", "ly", "mx", "my"]);
/// let smooth = compile_formula("x + (x - lx) * 0.5", &schema)?;
///
/// assert_eq!(smooth.call(&[100.0, 0.0, 0.0, 0.0, 0.0, 0.0]), 150.0);
/// assert_eq!(smooth.call(&[200.0, 0.0, 100.0, 0.0, 0.0, 0.0]), 250.0);
/// # Ok::<(), tabletfx_expr::FormulaError>(())
/// ```
#[derive(Clone)]
pub struct CompiledExpression {
    code: Arc<[Instruction]>,
    arity: usize,
    max_stack: usize,
    source: Arc<str>,
}

impl CompiledExpression {
    /// Number of arguments the expression expects.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Formula text this expression was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Deepest stack the expression needs.
    #[must_use]
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    /// The lowered instruction list.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.code
    }

    /// Evaluate with a temporary stack.
    ///
    /// Returns NaN when `args.len()` differs from [`arity`](Self::arity).
    #[must_use]
    pub fn call(&self, args: &[f64]) -> f64 {
        let mut stack = EvalStack::with_capacity(self.max_stack);
        self.call_with(args, &mut stack)
    }

    /// Evaluate using a caller-owned stack.
    #[must_use]
    pub fn call_with(&self, args: &[f64], stack: &mut EvalStack) -> f64 {
        self.call_complex(args, stack).re
    }

    /// Evaluate and return the full complex result.
    #[must_use]
    pub fn call_complex(&self, args: &[f64], stack: &mut EvalStack) -> Complex64 {
        let nan = Complex64::new(f64::NAN, f64::NAN);
        if args.len() != self.arity {
            return nan;
        }

        let values = &mut stack.values;
        values.clear();

        for instruction in self.code.iter() {
            match *instruction {
                Instruction::Const(value) => values.push(value),
                Instruction::Load(slot) => {
                    let arg = args.get(slot).copied().unwrap_or(f64::NAN);
                    values.push(Complex64::new(arg, 0.0));
                }
                Instruction::Neg => {
                    if let Some(top) = values.last_mut() {
                        *top = -*top;
                    }
                }
                Instruction::Call(function) => {
                    let Some(start) = values.len().checked_sub(function.arity()) else {
                        return nan;
                    };
                    let result = values
                        .get(start..)
                        .map_or(nan, |operands| function.apply(operands));
                    values.truncate(start);
                    values.push(result);
                }
                binary => {
                    let (Some(b), Some(a)) = (values.pop(), values.last_mut()) else {
                        return nan;
                    };
                    *a = match binary {
                        Instruction::Add => *a + b,
                        Instruction::Sub => *a - b,
                        Instruction::Mul => *a * b,
                        Instruction::Div => divide(*a, b),
                        _ => functions::pow(*a, b),
                    };
                }
            }
        }

        values.pop().unwrap_or(nan)
    }
}

impl fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("source", &self.source)
            .field("arity", &self.arity)
            .field("instructions", &self.code.len())
            .field("max_stack", &self.max_stack)
            .finish()
    }
}

/// Division with IEEE semantics for real operands, so `x / 0` is ±inf
/// rather than the NaN a complex division by zero produces.
fn divide(a: Complex64, b: Complex64) -> Complex64 {
    if a.im == 0.0 && b.im == 0.0 {
        Complex64::new(a.re / b.re, 0.0)
    } else {
        a / b
    }
}

/// Lower `expr` to bytecode bound to `schema`.
///
/// # Errors
///
/// Returns [`CompileError`] when the expression references a slot outside
/// the schema or a slot whose name differs from the schema's.
pub fn compile(expr: &Expr, schema: &VariableSchema) -> Result<CompiledExpression, CompileError> {
    compile_with_source(expr, schema, &expr.to_string())
}

/// Parse and compile formula text in one step.
///
/// # Errors
///
/// Returns [`FormulaError`](crate::FormulaError) wrapping the parse or
/// compile failure.
pub fn compile_formula(source: &str, schema: &VariableSchema) -> FormulaResult<CompiledExpression> {
    let expr = parse(source, schema)?;
    Ok(compile_with_source(&expr, schema, source)?)
}

fn compile_with_source(
    expr: &Expr,
    schema: &VariableSchema,
    source: &str,
) -> Result<CompiledExpression, CompileError> {
    check_slots(expr, schema)?;

    let mut emitter = Emitter::default();
    emitter.emit(expr);

    trace!(
        source,
        instructions = emitter.code.len(),
        max_stack = emitter.max_depth,
        "Formula compiled"
    );

    Ok(CompiledExpression {
        code: emitter.code.into(),
        arity: schema.len(),
        max_stack: emitter.max_depth,
        source: source.into(),
    })
}

fn check_slots(expr: &Expr, schema: &VariableSchema) -> Result<(), CompileError> {
    let mut failure = None;
    expr.for_each_variable(&mut |name, slot| {
        if failure.is_some() {
            return;
        }
        match schema.name_at(slot) {
            None => {
                failure = Some(CompileError::SlotOutOfRange {
                    name: name.to_string(),
                    slot,
                    schema_len: schema.len(),
                });
            }
            Some(schema_name) if schema_name != name => {
                failure = Some(CompileError::SchemaMismatch {
                    name: name.to_string(),
                    schema_name: schema_name.to_string(),
                    slot,
                });
            }
            Some(_) => {}
        }
    });
    failure.map_or(Ok(()), Err)
}

#[derive(Default)]
struct Emitter {
    code: Vec<Instruction>,
    depth: usize,
    max_depth: usize,
}

impl Emitter {
    fn push(&mut self, instruction: Instruction) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        self.code.push(instruction);
    }

    fn pop(&mut self, count: usize, instruction: Instruction) {
        self.depth = self.depth.saturating_sub(count);
        self.code.push(instruction);
    }

    fn emit(&mut self, expr: &Expr) {
        if let Some(value) = fold(expr) {
            self.push(Instruction::Const(value));
            return;
        }

        match expr {
            Expr::Number(value) => self.push(Instruction::Const(Complex64::new(*value, 0.0))),
            Expr::Variable { slot, .. } => self.push(Instruction::Load(*slot)),
            Expr::Neg(inner) => {
                self.emit(inner);
                self.pop(0, Instruction::Neg);
            }
            Expr::Binary { op, lhs, rhs } => {
                self.emit(lhs);
                self.emit(rhs);
                let instruction = match op {
                    BinaryOp::Add => Instruction::Add,
                    BinaryOp::Sub => Instruction::Sub,
                    BinaryOp::Mul => Instruction::Mul,
                    BinaryOp::Div => Instruction::Div,
                    BinaryOp::Pow => Instruction::Pow,
                };
                self.pop(1, instruction);
            }
            Expr::Call { function, args } => {
                for arg in args {
                    self.emit(arg);
                }
                self.pop(args.len().saturating_sub(1), Instruction::Call(*function));
            }
        }
    }
}

/// Evaluate a variable-free subtree.
fn fold(expr: &Expr) -> Option<Complex64> {
    match expr {
        Expr::Number(value) => Some(Complex64::new(*value, 0.0)),
        Expr::Variable { .. } => None,
        Expr::Neg(inner) => fold(inner).map(|v| -v),
        Expr::Binary { op, lhs, rhs } => {
            let a = fold(lhs)?;
            let b = fold(rhs)?;
            Some(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => divide(a, b),
                BinaryOp::Pow => functions::pow(a, b),
            })
        }
        Expr::Call { function, args } => {
            let values = args.iter().map(fold).collect::<Option<Vec<_>>>()?;
            Some(function.apply(&values))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{FormulaError, ParseError};
    use crate::parser::MAX_OPERATIONS;
    use approx::assert_relative_eq;

    fn schema() -> VariableSchema {
        VariableSchema::new(["x", "y", "lx", "ly", "mx", "my"])
    }

    fn eval(source: &str, args: &[f64]) -> f64 {
        compile_formula(source, &schema()).unwrap().call(args)
    }

    const ARGS: [f64; 6] = [3.0, 4.0, 1.0, 2.0, 100.0, 50.0];

    #[test]
    fn test_arithmetic() {
        assert_relative_eq!(eval("x + y * 2", &ARGS), 11.0);
        assert_relative_eq!(eval("(x - lx) / (y - ly)", &ARGS), 1.0);
        assert_relative_eq!(eval("-x^2", &ARGS), -9.0);
        assert_relative_eq!(eval("2^3^2", &ARGS), 512.0);
        assert_relative_eq!(eval("x * my / mx", &ARGS), 1.5);
    }

    #[test]
    fn test_functions() {
        assert_relative_eq!(eval("sqrt(x*x + y*y)", &ARGS), 5.0);
        assert_relative_eq!(eval("max(x, y) - min(lx, ly)", &ARGS), 3.0);
        assert_relative_eq!(eval("pow(y, 0.5)", &ARGS), 2.0);
        assert_relative_eq!(eval("clamp(mx, 0, my)", &ARGS), 50.0);
        assert_relative_eq!(eval("sin(pi / 2)", &ARGS), 1.0);
        assert_relative_eq!(eval("abs(lx - x)", &ARGS), 2.0);
    }

    #[test]
    fn test_identity_returns_input_exactly() {
        let expr = compile_formula("x", &schema()).unwrap();
        for value in [0.0, -1.5, 1e300, f64::MIN_POSITIVE, 12345.678] {
            let result = expr.call(&[value, 9.0, 9.0, 9.0, 9.0, 9.0]);
            assert_eq!(result.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_division_by_zero_is_sentinel() {
        assert_eq!(eval("x / 0", &ARGS), f64::INFINITY);
        assert_eq!(eval("-x / 0", &ARGS), f64::NEG_INFINITY);
        assert!(eval("0 / 0", &ARGS).is_nan());
    }

    #[test]
    fn test_complex_intermediate_projects_to_real() {
        // sqrt(-4) = 2i, squared is -4
        assert_relative_eq!(eval("sqrt(-4)^2", &ARGS), -4.0, epsilon = 1e-12);
        // real part of sqrt(-1) is zero
        assert_relative_eq!(eval("sqrt(lx - x)", &ARGS), 0.0, epsilon = 1e-12);
        assert_relative_eq!(eval("sqrt(lx - x) * sqrt(lx - x)", &ARGS), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_argument_count_is_nan() {
        let expr = compile_formula("x", &schema()).unwrap();
        assert!(expr.call(&[1.0]).is_nan());
        assert!(expr.call(&[]).is_nan());
    }

    #[test]
    fn test_constant_folding() {
        let expr = compile_formula("x * (2 + 3) + sin(0)", &schema()).unwrap();
        assert_eq!(
            expr.instructions(),
            &[
                Instruction::Load(0),
                Instruction::Const(Complex64::new(5.0, 0.0)),
                Instruction::Mul,
                Instruction::Const(Complex64::new(0.0, 0.0)),
                Instruction::Add,
            ]
        );
        assert_eq!(expr.max_stack(), 2);
    }

    #[test]
    fn test_stack_reuse_does_not_grow() {
        let expr = compile_formula("max(x, min(y, lx + ly * mx))", &schema()).unwrap();
        let mut stack = EvalStack::with_capacity(expr.max_stack());
        let capacity = stack.capacity();
        let total: f64 = (0..100)
            .map(|i| {
                let v = f64::from(i);
                expr.call_with(&[v, v, v, v, v, v], &mut stack)
            })
            .sum();
        assert!(total.is_finite());
        assert_eq!(stack.capacity(), capacity);
    }

    #[test]
    fn test_slot_out_of_range() {
        let expr = parse("my", &schema()).unwrap();
        let small = VariableSchema::new(["x", "y"]);
        assert_eq!(
            compile(&expr, &small).unwrap_err(),
            CompileError::SlotOutOfRange {
                name: "my".to_string(),
                slot: 5,
                schema_len: 2
            }
        );
    }

    #[test]
    fn test_schema_mismatch() {
        let expr = parse("y", &schema()).unwrap();
        let swapped = VariableSchema::new(["y", "x"]);
        assert!(matches!(
            compile(&expr, &swapped),
            Err(CompileError::SchemaMismatch { slot: 1, .. })
        ));
    }

    #[test]
    fn test_source_is_recorded() {
        let expr = compile_formula("x+1", &schema()).unwrap();
        assert_eq!(expr.source(), "x+1");
        assert_eq!(expr.arity(), 6);

        let ast = parse("x+1", &schema()).unwrap();
        assert_eq!(compile(&ast, &schema()).unwrap().source(), "(x + 1)");
    }

    #[test]
    fn test_long_flat_chain_fails_without_overflowing() {
        let chain = vec!["x"; 200_000].join("+");
        assert_eq!(
            compile_formula(&chain, &schema()).map(|_| ()),
            Err(FormulaError::Parse(ParseError::TooLarge {
                limit: MAX_OPERATIONS
            }))
        );
    }

    #[test]
    fn test_chain_at_operation_limit_compiles() {
        let terms = MAX_OPERATIONS + 1;
        let chain = vec!["x"; terms].join(" + ");
        let expr = compile_formula(&chain, &schema()).unwrap();
        assert_eq!(expr.max_stack(), 2);
        assert_relative_eq!(expr.call(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]), 1025.0);
    }

    #[test]
    fn test_compiled_expression_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledExpression>();
    }
}
