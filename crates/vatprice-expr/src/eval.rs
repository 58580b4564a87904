//! Tree-walk expression evaluator
//!
//! Evaluates a parsed expression against a `ParameterBinding`. All
//! arithmetic is decimal with checked operations; failures surface as
//! typed errors, never panics.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::parser::parse;
use rust_decimal::Decimal;
use vatprice_core::models::{ParamValue, ParameterBinding};
use vatprice_core::{PricingError, PricingResult};

/// Result of evaluating an expression node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalValue {
    Number(Decimal),
    Bool(bool),
}

impl EvalValue {
    /// Human-readable kind name for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            EvalValue::Number(_) => "number",
            EvalValue::Bool(_) => "bool",
        }
    }
}

fn type_mismatch(expected: &str, actual: &str) -> PricingError {
    PricingError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Evaluate an expression string to a numeric result
///
/// This is the cost path: a boolean result is a type error.
pub fn evaluate(expression: &str, bindings: &ParameterBinding) -> PricingResult<Decimal> {
    let expr = parse(expression)?;
    expect_number(evaluate_ast(&expr, bindings)?)
}

/// Evaluate an expression string to a boolean result
///
/// This is the condition path: a numeric result is a type error rather
/// than being coerced through some truthiness rule.
pub fn evaluate_predicate(expression: &str, bindings: &ParameterBinding) -> PricingResult<bool> {
    let expr = parse(expression)?;
    match evaluate_ast(&expr, bindings)? {
        EvalValue::Bool(b) => Ok(b),
        EvalValue::Number(_) => Err(type_mismatch("bool", "number")),
    }
}

/// Reject a boolean where a number is required
pub fn expect_number(value: EvalValue) -> PricingResult<Decimal> {
    match value {
        EvalValue::Number(n) => Ok(n),
        EvalValue::Bool(_) => Err(type_mismatch("number", "bool")),
    }
}

/// Evaluate a parsed AST against the bindings
pub fn evaluate_ast(expr: &Expr, bindings: &ParameterBinding) -> PricingResult<EvalValue> {
    match expr {
        Expr::Literal(n) => Ok(EvalValue::Number(*n)),

        Expr::Param(name) => match bindings.get(name) {
            None => Err(PricingError::UnknownParameter(name.clone())),
            Some(ParamValue::Number(n)) => Ok(EvalValue::Number(*n)),
            Some(ParamValue::Bool(b)) => Ok(EvalValue::Bool(*b)),
            // Text and date parameters belong to the condition path; inside
            // an expression they have no numeric meaning
            Some(other) => Err(type_mismatch("number", other.type_name())),
        },

        Expr::Unary { op: UnaryOp::Neg, expr } => {
            let n = expect_number(evaluate_ast(expr, bindings)?)?;
            Ok(EvalValue::Number(-n))
        }

        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate_ast(lhs, bindings)?;
            let rhs = evaluate_ast(rhs, bindings)?;
            apply_binary(*op, lhs, rhs)
        }
    }
}

fn apply_binary(op: BinaryOp, lhs: EvalValue, rhs: EvalValue) -> PricingResult<EvalValue> {
    if op.is_comparison() {
        return apply_comparison(op, lhs, rhs);
    }

    let a = expect_number(lhs)?;
    let b = expect_number(rhs)?;

    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or(PricingError::Overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or(PricingError::Overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or(PricingError::Overflow)?,
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(PricingError::DivisionByZero);
            }
            a.checked_div(b).ok_or(PricingError::Overflow)?
        }
        _ => unreachable!("comparison handled above"),
    };

    Ok(EvalValue::Number(result))
}

fn apply_comparison(op: BinaryOp, lhs: EvalValue, rhs: EvalValue) -> PricingResult<EvalValue> {
    let result = match (lhs, rhs) {
        (EvalValue::Number(a), EvalValue::Number(b)) => match op {
            BinaryOp::Gt => a > b,
            BinaryOp::Lt => a < b,
            BinaryOp::Ge => a >= b,
            BinaryOp::Le => a <= b,
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            _ => unreachable!("arithmetic handled by caller"),
        },
        (EvalValue::Bool(a), EvalValue::Bool(b)) => match op {
            BinaryOp::Eq => a == b,
            BinaryOp::Ne => a != b,
            // Booleans have no ordering in this grammar
            _ => return Err(type_mismatch("number", "bool")),
        },
        (a, b) => {
            return Err(type_mismatch(a.kind_name(), b.kind_name()));
        }
    };

    Ok(EvalValue::Bool(result))
}
