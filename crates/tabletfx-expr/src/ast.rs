//! Abstract syntax tree produced by the parser.

use crate::functions::Function;
use std::fmt;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

/// A parsed formula.
///
/// Variables are resolved to their schema slot during parsing; the name is
/// kept so the compiler can check the expression against the schema it is
/// being lowered for.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal or named constant
    Number(f64),
    /// Schema variable
    Variable {
        /// Variable name
        name: String,
        /// Slot index in the schema
        slot: usize,
    },
    /// Unary negation
    Neg(Box<Expr>),
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Function call with arity already checked
    Call {
        /// Callee
        function: Function,
        /// Arguments in call order
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Build a binary node.
    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Visit every variable slot referenced by the expression.
    pub fn for_each_variable<F: FnMut(&str, usize)>(&self, f: &mut F) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable { name, slot } => f(name, *slot),
            Expr::Neg(inner) => inner.for_each_variable(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_variable(f);
                rhs.for_each_variable(f);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.for_each_variable(f);
                }
            }
        }
    }

    /// Whether the expression references no variables.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        let mut constant = true;
        self.for_each_variable(&mut |_, _| constant = false);
        constant
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Variable { .. } => 1,
            Expr::Neg(inner) => 1 + inner.node_count(),
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.node_count() + rhs.node_count(),
            Expr::Call { args, .. } => 1 + args.iter().map(Expr::node_count).sum::<usize>(),
        }
    }
}

impl fmt::Display for Expr {
    /// Fully parenthesised rendering, useful for checking precedence.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Variable { name, .. } => f.write_str(name),
            Expr::Neg(inner) => write!(f, "(-{inner})"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}
