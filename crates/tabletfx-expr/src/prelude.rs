//! Prelude for tabletfx-expr
//!
//! This module provides convenient re-exports of commonly used types.
//!
//! # Example
//!
//! ```
//! use tabletfx_expr::prelude::*;
//!
//! let schema = VariableSchema::new(["x"]);
//! assert!(compile_formula("x * 2", &schema).is_ok());
//! ```

pub use crate::compiler::{CompiledExpression, EvalStack, compile, compile_formula};
pub use crate::error::{CompileError, FormulaError, ParseError};
pub use crate::parser::parse;
pub use crate::schema::VariableSchema;
