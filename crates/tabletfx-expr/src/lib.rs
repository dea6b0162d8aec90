//! Formula Parsing and Compilation for TabletFX
//!
//! This crate turns short user-authored arithmetic formulas into callable
//! numeric functions bound to a fixed, ordered set of variables. It is the
//! expression core of the TabletFX report filters, which evaluate a formula
//! per output channel for every tablet report.
//!
//! # Overview
//!
//! - **VariableSchema**: Ordered variable names; a name's position is its
//!   argument slot
//! - **parse**: Formula text to [`Expr`], with variables resolved to slots
//! - **compile**: [`Expr`] to [`CompiledExpression`] bytecode
//! - **compile_formula**: Both steps at once
//!
//! # Report-Rate Guarantees
//!
//! - **No parsing or name lookup** when a compiled expression is called
//! - **No heap allocations** in [`CompiledExpression::call_with`] once the
//!   [`EvalStack`] has grown to the expression's depth
//! - **No panics** on any argument values: domain errors, division by zero
//!   and wrong argument counts all produce a numeric sentinel
//!
//! # Numeric Semantics
//!
//! Evaluation runs on `Complex<f64>` so intermediate results may leave the
//! real line (`sqrt(-1)`, `(-8)^(1/3)`); the value returned is the real part
//! of the final result.
//!
//! # Example
//!
//! ```
//! use tabletfx_expr::prelude::*;
//!
//! let schema = VariableSchema::new(["x", "y", "lx", "ly", "mx", "my"]);
//! let expr = compile_formula("clamp(x + 0.5(x - lx), 0, mx)", &schema)?;
//!
//! let mut stack = EvalStack::new();
//! let out = expr.call_with(&[120.0, 40.0, 100.0, 40.0, 15200.0, 9500.0], &mut stack);
//! assert_eq!(out, 130.0);
//! # Ok::<(), FormulaError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ast;
pub mod compiler;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod prelude;
pub mod schema;

pub use ast::{BinaryOp, Expr};
pub use compiler::{CompiledExpression, EvalStack, Instruction, compile, compile_formula};
pub use error::{CompileError, FormulaError, FormulaResult, ParseError};
pub use functions::Function;
pub use parser::{MAX_DEPTH, MAX_OPERATIONS, parse};
pub use schema::VariableSchema;
