//! Recursive-descent parser from formula text to [`Expr`].
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary | <implicit> unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := NUMBER | IDENT | IDENT '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! `^` is right-associative and binds tighter than unary minus, so
//! `-x^2` is `-(x^2)`. Implicit multiplication applies when a number is
//! followed by an identifier or `(`, or when `)` is followed by `(`.

use crate::ast::{BinaryOp, Expr};
use crate::error::ParseError;
use crate::functions::Function;
use crate::lexer::{Spanned, Token, tokenize};
use crate::schema::VariableSchema;

/// Maximum nesting of parentheses, calls and unary operators.
pub const MAX_DEPTH: usize = 64;

/// Maximum number of operators and calls in one formula. Bounds the height
/// of left-deep chains such as `x + x + ... + x`, which nesting alone does
/// not.
pub const MAX_OPERATIONS: usize = 1024;

/// Parse `source` against `schema`.
///
/// Every identifier must be a schema variable, a function call, or one of
/// the constants `pi` and `e` (schema variables shadow constants).
///
/// # Errors
///
/// Returns a [`ParseError`] describing the first problem found.
///
/// # Example
///
/// ```
/// use tabletfx_expr::{VariableSchema, parse};
///
/// let schema = VariableSchema::new(["x", "lx"]);
/// let expr = parse("x + (x - lx) * 0.5", &schema)?;
/// assert_eq!(expr.to_string(), "(x + ((x - lx) * 0.5))");
///
/// assert!(parse("x + q", &schema).is_err());
/// # Ok::<(), tabletfx_expr::ParseError>(())
/// ```
pub fn parse(source: &str, schema: &VariableSchema) -> Result<Expr, ParseError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
        operations: 0,
        schema,
    };
    let expr = parser.parse_expr()?;

    match parser.peek() {
        None => Ok(expr),
        Some(extra) => Err(ParseError::UnexpectedToken {
            found: extra.token.to_string(),
            expected: "operator or end of formula",
            offset: extra.offset,
        }),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    depth: usize,
    operations: usize,
    schema: &'a VariableSchema,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|s| &s.token)
    }

    fn previous_token(&self) -> Option<&'a Token> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, wanted: &Token, expected: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some(s) if &s.token == wanted => Ok(()),
            Some(s) => Err(ParseError::UnexpectedToken {
                found: s.token.to_string(),
                expected,
                offset: s.offset,
            }),
            None => Err(ParseError::UnexpectedEnd { expected }),
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn count_operation(&mut self) -> Result<(), ParseError> {
        self.operations += 1;
        if self.operations > MAX_OPERATIONS {
            return Err(ParseError::TooLarge {
                limit: MAX_OPERATIONS,
            });
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            self.count_operation()?;
            let rhs = self.parse_term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => {
                    self.pos += 1;
                    BinaryOp::Mul
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    BinaryOp::Div
                }
                _ if self.implicit_multiplication_follows() => BinaryOp::Mul,
                _ => return Ok(lhs),
            };
            self.count_operation()?;
            let rhs = self.parse_unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
    }

    fn implicit_multiplication_follows(&self) -> bool {
        match (self.previous_token(), self.peek_token()) {
            (Some(Token::Number(_)), Some(Token::Ident(_) | Token::LParen)) => true,
            (Some(Token::RParen), Some(Token::LParen)) => true,
            _ => false,
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let result = match self.peek_token() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.count_operation()
                    .and_then(|()| self.parse_unary())
                    .map(|inner| Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        };
        self.leave();
        result
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if self.peek_token() == Some(&Token::Caret) {
            self.pos += 1;
            self.count_operation()?;
            let exponent = self.parse_unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(spanned) = self.advance() else {
            return Err(ParseError::UnexpectedEnd {
                expected: "number, variable or '('",
            });
        };
        let offset = spanned.offset;

        match &spanned.token {
            Token::Number(value) => Ok(Expr::Number(*value)),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => {
                let name = name.clone();
                self.parse_identifier(name, offset)
            }
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                expected: "number, variable or '('",
                offset,
            }),
        }
    }

    fn parse_identifier(&mut self, name: String, offset: usize) -> Result<Expr, ParseError> {
        if self.peek_token() == Some(&Token::LParen) {
            let Some(function) = Function::from_name(&name) else {
                return Err(ParseError::UnknownFunction { name, offset });
            };
            self.pos += 1;
            self.count_operation()?;
            let args = self.parse_arguments()?;
            if args.len() != function.arity() {
                return Err(ParseError::WrongArity {
                    function: function.name(),
                    expected: function.arity(),
                    found: args.len(),
                });
            }
            return Ok(Expr::Call { function, args });
        }

        if let Some(slot) = self.schema.slot_of(&name) {
            return Ok(Expr::Variable { name, slot });
        }

        match name.as_str() {
            "pi" => Ok(Expr::Number(std::f64::consts::PI)),
            "e" => Ok(Expr::Number(std::f64::consts::E)),
            _ => Err(ParseError::UnknownVariable { name, offset }),
        }
    }

    /// Arguments after an opening parenthesis, consuming the closing one.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.enter()?;
        let mut args = Vec::new();
        if self.peek_token() == Some(&Token::RParen) {
            self.pos += 1;
            self.leave();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.advance() {
                Some(s) if s.token == Token::Comma => {}
                Some(s) if s.token == Token::RParen => break,
                Some(s) => {
                    return Err(ParseError::UnexpectedToken {
                        found: s.token.to_string(),
                        expected: "',' or ')'",
                        offset: s.offset,
                    });
                }
                None => {
                    return Err(ParseError::UnexpectedEnd {
                        expected: "',' or ')'",
                    });
                }
            }
        }
        self.leave();
        Ok(args)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn schema() -> VariableSchema {
        VariableSchema::new(["x", "y", "lx", "ly", "mx", "my"])
    }

    fn render(source: &str) -> String {
        parse(source, &schema()).unwrap().to_string()
    }

    #[test]
    fn test_precedence() {
        assert_eq!(render("x + y * 2"), "(x + (y * 2))");
        assert_eq!(render("(x + y) * 2"), "((x + y) * 2)");
        assert_eq!(render("x - y - 1"), "((x - y) - 1)");
        assert_eq!(render("x / y / 2"), "((x / y) / 2)");
    }

    #[test]
    fn test_power_is_right_associative_and_binds_tighter_than_neg() {
        assert_eq!(render("2^3^2"), "(2 ^ (3 ^ 2))");
        assert_eq!(render("-x^2"), "(-(x ^ 2))");
        assert_eq!(render("x^-1"), "(x ^ (-1))");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(render("2x"), "(2 * x)");
        assert_eq!(render("0.5(x - lx)"), "(0.5 * (x - lx))");
        assert_eq!(render("(x)(y)"), "(x * y)");
        assert_eq!(render("2x^2"), "(2 * (x ^ 2))");
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(render("max(x, mx - 1)"), "max(x, (mx - 1))");
        assert_eq!(render("sin(cos(y))"), "sin(cos(y))");
    }

    #[test]
    fn test_constants_and_shadowing() {
        let expr = parse("pi", &schema()).unwrap();
        assert_eq!(expr, Expr::Number(std::f64::consts::PI));

        let shadowing = VariableSchema::new(["e"]);
        let expr = parse("e", &shadowing).unwrap();
        assert_eq!(
            expr,
            Expr::Variable {
                name: "e".to_string(),
                slot: 0
            }
        );
    }

    #[test]
    fn test_variables_resolve_to_slots() {
        let expr = parse("my", &schema()).unwrap();
        assert_eq!(
            expr,
            Expr::Variable {
                name: "my".to_string(),
                slot: 5
            }
        );
    }

    #[test]
    fn test_unknown_variable() {
        assert_eq!(
            parse("x + z", &schema()),
            Err(ParseError::UnknownVariable {
                name: "z".to_string(),
                offset: 4
            })
        );
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            parse("cot(x)", &schema()),
            Err(ParseError::UnknownFunction { offset: 0, .. })
        ));
    }

    #[test]
    fn test_wrong_arity() {
        assert_eq!(
            parse("min(x)", &schema()),
            Err(ParseError::WrongArity {
                function: "min",
                expected: 2,
                found: 1
            })
        );
        assert!(matches!(
            parse("sin()", &schema()),
            Err(ParseError::WrongArity { found: 0, .. })
        ));
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(parse("   ", &schema()), Err(ParseError::Empty));
        assert!(matches!(
            parse("x +", &schema()),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("(x", &schema()),
            Err(ParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("x)", &schema()),
            Err(ParseError::UnexpectedToken { offset: 1, .. })
        ));
        assert!(matches!(
            parse("x y", &schema()),
            Err(ParseError::UnexpectedToken { offset: 2, .. })
        ));
        assert!(matches!(
            parse("* x", &schema()),
            Err(ParseError::UnexpectedToken { offset: 0, .. })
        ));
    }

    #[test]
    fn test_division_by_literal_zero_parses() {
        assert_eq!(render("x / 0"), "(x / 0)");
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}x{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(
            parse(&deep, &schema()),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );

        let neg_chain = format!("{}x", "-".repeat(MAX_DEPTH + 1));
        assert_eq!(
            parse(&neg_chain, &schema()),
            Err(ParseError::TooDeep { limit: MAX_DEPTH })
        );

        let shallow = format!("{}x{}", "(".repeat(8), ")".repeat(8));
        assert!(parse(&shallow, &schema()).is_ok());
    }

    #[test]
    fn test_long_flat_chain_is_rejected() {
        let chain = vec!["x"; 100_000].join("+");
        assert_eq!(
            parse(&chain, &schema()),
            Err(ParseError::TooLarge {
                limit: MAX_OPERATIONS
            })
        );

        let products = vec!["y"; 100_000].join(" * ");
        assert_eq!(
            parse(&products, &schema()),
            Err(ParseError::TooLarge {
                limit: MAX_OPERATIONS
            })
        );
    }

    #[test]
    fn test_operation_limit_counts_every_operator() {
        let at_limit = vec!["x"; MAX_OPERATIONS + 1].join("-");
        assert!(parse(&at_limit, &schema()).is_ok());

        let over = format!("{at_limit}-x");
        assert!(matches!(
            parse(&over, &schema()),
            Err(ParseError::TooLarge { .. })
        ));

        // Half the budget in calls, half in binary operators
        let calls = vec!["abs(x)"; MAX_OPERATIONS / 2 + 1].join("+");
        assert!(matches!(
            parse(&calls, &schema()),
            Err(ParseError::TooLarge { .. })
        ));
    }
}
