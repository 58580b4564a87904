//! Expression tokenizer
//!
//! Splits an expression string into tokens, keeping byte positions so
//! syntax errors can point at the offending input.

use rust_decimal::Decimal;
use vatprice_core::{PricingError, PricingResult};

/// A single token of the expression grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Decimal numeric literal
    Number(Decimal),
    /// Parameter reference
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Gt,
    Lt,
    Ge,
    Le,
    EqEq,
    NotEq,
}

impl Token {
    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number '{}'", n),
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::Plus => "'+'".to_string(),
            Token::Minus => "'-'".to_string(),
            Token::Star => "'*'".to_string(),
            Token::Slash => "'/'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Gt => "'>'".to_string(),
            Token::Lt => "'<'".to_string(),
            Token::Ge => "'>='".to_string(),
            Token::Le => "'<='".to_string(),
            Token::EqEq => "'=='".to_string(),
            Token::NotEq => "'!='".to_string(),
        }
    }
}

/// A token plus its byte position in the source expression
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: usize,
}

fn syntax_error(position: usize, message: impl Into<String>) -> PricingError {
    PricingError::SyntaxError {
        position,
        message: message.into(),
    }
}

/// Tokenize an expression string
pub fn tokenize(input: &str) -> PricingResult<Vec<SpannedToken>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '+' => {
                tokens.push(SpannedToken { token: Token::Plus, position: start });
                i += 1;
            }
            '-' => {
                tokens.push(SpannedToken { token: Token::Minus, position: start });
                i += 1;
            }
            '*' => {
                tokens.push(SpannedToken { token: Token::Star, position: start });
                i += 1;
            }
            '/' => {
                tokens.push(SpannedToken { token: Token::Slash, position: start });
                i += 1;
            }
            '(' => {
                tokens.push(SpannedToken { token: Token::LParen, position: start });
                i += 1;
            }
            ')' => {
                tokens.push(SpannedToken { token: Token::RParen, position: start });
                i += 1;
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(SpannedToken { token: Token::Ge, position: start });
                    i += 2;
                } else {
                    tokens.push(SpannedToken { token: Token::Gt, position: start });
                    i += 1;
                }
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(SpannedToken { token: Token::Le, position: start });
                    i += 2;
                } else {
                    tokens.push(SpannedToken { token: Token::Lt, position: start });
                    i += 1;
                }
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(SpannedToken { token: Token::EqEq, position: start });
                    i += 2;
                } else {
                    return Err(syntax_error(start, "expected '==' (assignment is not supported)"));
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(SpannedToken { token: Token::NotEq, position: start });
                    i += 2;
                } else {
                    return Err(syntax_error(start, "expected '!='"));
                }
            }
            '0'..='9' | '.' => {
                // Consume greedily and let the decimal parser reject
                // malformed literals like "1.2.3" or a lone "."
                let mut end = i;
                while end < bytes.len() {
                    match bytes[end] as char {
                        '0'..='9' | '.' => end += 1,
                        _ => break,
                    }
                }
                let literal = &input[start..end];
                let value = literal.parse::<Decimal>().map_err(|_| {
                    syntax_error(start, format!("invalid numeric literal '{}'", literal))
                })?;
                tokens.push(SpannedToken { token: Token::Number(value), position: start });
                i = end;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = i;
                while end < bytes.len() {
                    let c = bytes[end] as char;
                    if c.is_ascii_alphanumeric() || c == '_' {
                        end += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(SpannedToken {
                    token: Token::Ident(input[start..end].to_string()),
                    position: start,
                });
                i = end;
            }
            other => {
                return Err(syntax_error(start, format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}
