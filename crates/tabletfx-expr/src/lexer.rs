//! Tokenizer for formula text.

use crate::error::ParseError;
use std::fmt;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Numeric literal
    Number(f64),
    /// Variable, constant or function name
    Ident(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `^`
    Caret,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {n}"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Caret => f.write_str("'^'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

/// A token together with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    /// The token
    pub token: Token,
    /// Byte offset into the source text
    pub offset: usize,
}

/// Split formula text into tokens.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedChar`] for characters outside the
/// grammar and [`ParseError::InvalidNumber`] for malformed literals.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            chars.next();
            tokens.push(Spanned { token, offset });
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let mut text = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    text.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            // An exponent is only taken when digits follow, so `2e` stays `2 * e`.
            if let Some(&(_, e)) = chars.peek()
                && (e == 'e' || e == 'E')
            {
                let rest = source.get(offset + text.len() + 1..).unwrap_or("");
                let mut rest_chars = rest.chars();
                let exponent_follows = match rest_chars.next() {
                    Some(d) if d.is_ascii_digit() => true,
                    Some('+' | '-') => rest_chars.next().is_some_and(|d| d.is_ascii_digit()),
                    _ => false,
                };
                if exponent_follows {
                    text.push(e);
                    chars.next();
                    if let Some(&(_, sign)) = chars.peek()
                        && (sign == '+' || sign == '-')
                    {
                        text.push(sign);
                        chars.next();
                    }
                    while let Some(&(_, d)) = chars.peek() {
                        if d.is_ascii_digit() {
                            text.push(d);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
            }
            let value = text
                .parse::<f64>()
                .map_err(|_parse_err| ParseError::InvalidNumber {
                    text: text.clone(),
                    offset,
                })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut name = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    name.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Spanned {
                token: Token::Ident(name),
                offset,
            });
            continue;
        }

        return Err(ParseError::UnexpectedChar { found: c, offset });
    }

    Ok(tokens)
}
