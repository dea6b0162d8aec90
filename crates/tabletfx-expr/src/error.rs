//! Error types for formula parsing and compilation.

use thiserror::Error;

/// Errors raised while turning formula text into an [`Expr`](crate::Expr).
///
/// Offsets are byte positions into the original formula text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The formula contains nothing but whitespace.
    #[error("Formula is empty")]
    Empty,

    /// A character that cannot start any token.
    #[error("Unexpected character '{found}' at offset {offset}")]
    UnexpectedChar {
        /// The offending character
        found: char,
        /// Byte offset of the character
        offset: usize,
    },

    /// A numeric literal that does not parse as a float.
    #[error("Invalid number '{text}' at offset {offset}")]
    InvalidNumber {
        /// Literal text as written
        text: String,
        /// Byte offset of the literal
        offset: usize,
    },

    /// A token that is not valid at this position.
    #[error("Unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        /// Description of the token found
        found: String,
        /// What the parser was looking for
        expected: &'static str,
        /// Byte offset of the token
        offset: usize,
    },

    /// Input ended in the middle of an expression.
    #[error("Unexpected end of formula, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for
        expected: &'static str,
    },

    /// An identifier that is neither a schema variable nor a constant.
    #[error("Unknown variable '{name}' at offset {offset}")]
    UnknownVariable {
        /// Identifier as written
        name: String,
        /// Byte offset of the identifier
        offset: usize,
    },

    /// A call to a function outside the supported set.
    #[error("Unknown function '{name}' at offset {offset}")]
    UnknownFunction {
        /// Function name as written
        name: String,
        /// Byte offset of the function name
        offset: usize,
    },

    /// A supported function called with the wrong number of arguments.
    #[error("Function '{function}' takes {expected} argument(s), got {found}")]
    WrongArity {
        /// Function name
        function: &'static str,
        /// Declared arity
        expected: usize,
        /// Arguments supplied
        found: usize,
    },

    /// Nesting exceeds the parser's depth limit.
    #[error("Formula nests deeper than {limit} levels")]
    TooDeep {
        /// Maximum nesting depth
        limit: usize,
    },

    /// The formula has more operators and calls than the parser accepts.
    #[error("Formula has more than {limit} operations")]
    TooLarge {
        /// Maximum number of operators and calls
        limit: usize,
    },
}

/// Errors raised while lowering an [`Expr`](crate::Expr) to bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The expression references a slot past the end of the schema.
    #[error("Variable '{name}' uses slot {slot} but the schema has {schema_len} variables")]
    SlotOutOfRange {
        /// Variable name recorded in the expression
        name: String,
        /// Slot index recorded in the expression
        slot: usize,
        /// Number of variables in the schema
        schema_len: usize,
    },

    /// The expression was parsed against a different schema.
    #[error("Slot {slot} is '{schema_name}' in the schema, but the expression expects '{name}'")]
    SchemaMismatch {
        /// Variable name recorded in the expression
        name: String,
        /// Name the schema declares at that slot
        schema_name: String,
        /// Slot index
        slot: usize,
    },
}

/// Either stage of formula compilation failing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Parsing failed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Lowering failed
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}

/// Result alias for formula operations.
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;
