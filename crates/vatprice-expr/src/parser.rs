//! Recursive descent expression parser
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expression  := additive (cmp-op additive)?
//! additive    := multiplicative (('+' | '-') multiplicative)*
//! multiplicative := unary (('*' | '/') unary)*
//! unary       := '-' unary | primary
//! primary     := NUMBER | IDENT | '(' expression ')'
//! ```
//!
//! Arithmetic is left-associative; comparisons do not chain. Trailing
//! input after a complete expression is a syntax error.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::token::{tokenize, SpannedToken, Token};
use vatprice_core::{PricingError, PricingResult};

/// Parse an expression string into an AST
pub fn parse(input: &str) -> PricingResult<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
    };
    let expr = parser.expression()?;

    if let Some(t) = parser.peek() {
        return Err(PricingError::SyntaxError {
            position: t.position,
            message: format!("unexpected trailing {}", t.token.describe()),
        });
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Position to report when input ends unexpectedly
    fn end_position(&self) -> usize {
        self.peek().map_or(self.input_len, |t| t.position)
    }

    fn error(&self, message: impl Into<String>) -> PricingError {
        PricingError::SyntaxError {
            position: self.end_position(),
            message: message.into(),
        }
    }

    fn comparison_op(&self) -> Option<BinaryOp> {
        match self.peek().map(|t| &t.token) {
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Ge) => Some(BinaryOp::Ge),
            Some(Token::Le) => Some(BinaryOp::Le),
            Some(Token::EqEq) => Some(BinaryOp::Eq),
            Some(Token::NotEq) => Some(BinaryOp::Ne),
            _ => None,
        }
    }

    fn expression(&mut self) -> PricingResult<Expr> {
        let lhs = self.additive()?;

        if let Some(op) = self.comparison_op() {
            self.advance();
            let rhs = self.additive()?;

            // `a < b < c` is ambiguous in this grammar; reject it outright
            if self.comparison_op().is_some() {
                return Err(self.error("chained comparisons are not supported"));
            }

            return Ok(Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            });
        }

        Ok(lhs)
    }

    fn additive(&mut self) -> PricingResult<Expr> {
        let mut lhs = self.multiplicative()?;

        loop {
            let op = match self.peek().map(|t| &t.token) {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn multiplicative(&mut self) -> PricingResult<Expr> {
        let mut lhs = self.unary()?;

        loop {
            let op = match self.peek().map(|t| &t.token) {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn unary(&mut self) -> PricingResult<Expr> {
        if matches!(self.peek().map(|t| &t.token), Some(Token::Minus)) {
            self.advance();
            let expr = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                expr: Box::new(expr),
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> PricingResult<Expr> {
        match self.advance() {
            Some(SpannedToken {
                token: Token::Number(n),
                ..
            }) => Ok(Expr::Literal(n)),
            Some(SpannedToken {
                token: Token::Ident(name),
                ..
            }) => Ok(Expr::Param(name)),
            Some(SpannedToken {
                token: Token::LParen,
                position,
            }) => {
                let expr = self.expression()?;
                match self.advance() {
                    Some(SpannedToken {
                        token: Token::RParen,
                        ..
                    }) => Ok(expr),
                    _ => Err(PricingError::SyntaxError {
                        position,
                        message: "unbalanced parenthesis".to_string(),
                    }),
                }
            }
            Some(t) => Err(PricingError::SyntaxError {
                position: t.position,
                message: format!("unexpected {}", t.token.describe()),
            }),
            None => Err(PricingError::SyntaxError {
                position: self.input_len,
                message: "unexpected end of expression".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_precedence() {
        // 2 + 3 * 4 parses as 2 + (3 * 4)
        let expr = parse("2 + 3 * 4").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Add, rhs, .. } => match *rhs {
                Expr::Binary { op: BinaryOp::Mul, .. } => {}
                other => panic!("expected multiplication on the right, got {:?}", other),
            },
            other => panic!("expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override() {
        let expr = parse("(2 + 3) * 4").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Mul, lhs, .. } => match *lhs {
                Expr::Binary { op: BinaryOp::Add, .. } => {}
                other => panic!("expected addition on the left, got {:?}", other),
            },
            other => panic!("expected multiplication at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associativity() {
        // 10 - 4 - 3 parses as (10 - 4) - 3
        let expr = parse("10 - 4 - 3").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Sub, lhs, rhs } => {
                assert!(matches!(*lhs, Expr::Binary { op: BinaryOp::Sub, .. }));
                assert_eq!(*rhs, Expr::Literal(dec!(3)));
            }
            other => panic!("expected subtraction at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse("-basePrice + 5").unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Add, lhs, .. } => {
                assert!(matches!(*lhs, Expr::Unary { op: UnaryOp::Neg, .. }));
            }
            other => panic!("expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison() {
        let expr = parse("transactionVolume > 1000").unwrap();
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Gt, .. }));
    }

    #[test]
    fn test_chained_comparison_rejected() {
        assert!(parse("1 < 2 < 3").is_err());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(parse("(2 + 3").is_err());
        assert!(parse("2 + 3)").is_err());
    }

    #[test]
    fn test_trailing_input_rejected() {
        let err = parse("2 + 3 4").unwrap_err();
        match err {
            PricingError::SyntaxError { position, message } => {
                assert_eq!(position, 6);
                assert!(message.contains("trailing"));
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn test_operator_without_operand() {
        assert!(parse("2 +").is_err());
        assert!(parse("* 2").is_err());
    }
}
