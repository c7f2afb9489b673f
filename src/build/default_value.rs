//! Default value normalization
//!
//! A column default is rendered to text, one surrounding pair of single
//! quotes is stripped, and the remainder is evaluated as a numeric arithmetic
//! expression. Integer literals stay integers until an operand with a
//! fraction or exponent promotes the operation to floating point, so `10 / 4`
//! is `2` while `10.0 / 4` is `2.5`. A successful evaluation replaces the text
//! with the decimal rendering of the result; anything else keeps the stripped
//! text.

use sqlparser::ast::{BinaryOperator, Expr, UnaryOperator, Value, ValueWithSpan};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

/// Normalize a rendered default expression
///
/// # Example
///
/// ```rust
/// use sql_ingest::build::normalize_default;
///
/// assert_eq!(normalize_default("'3.140'"), "3.14");
/// assert_eq!(normalize_default("'pending'"), "pending");
/// ```
pub fn normalize_default(rendered: &str) -> String {
    let text = strip_single_quotes(rendered);

    match evaluate_numeric(text) {
        Some(value) => value.to_string(),
        None => text.to_string(),
    }
}

fn strip_single_quotes(text: &str) -> &str {
    text.strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .unwrap_or(text)
}

/// Evaluate `text` as an arithmetic expression over numeric literals
pub fn evaluate_numeric(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        return None;
    }

    let dialect = GenericDialect {};
    let mut parser = Parser::new(&dialect).try_with_sql(text).ok()?;
    let expr = parser.parse_expr().ok()?;
    if parser.peek_token().token != Token::EOF {
        return None;
    }

    evaluate(&expr)
        .map(Number::as_f64)
        .filter(|value| value.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn literal(text: &str) -> Option<Self> {
        if text.contains(['.', 'e', 'E']) {
            return text.parse().ok().map(Number::Float);
        }
        match text.parse() {
            Ok(value) => Some(Number::Int(value)),
            Err(_) => text.parse().ok().map(Number::Float),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        }
    }

    fn negate(self) -> Option<Self> {
        match self {
            Number::Int(value) => value.checked_neg().map(Number::Int),
            Number::Float(value) => Some(Number::Float(-value)),
        }
    }

    fn apply(op: &BinaryOperator, left: Self, right: Self) -> Option<Self> {
        if let (Number::Int(left), Number::Int(right)) = (left, right) {
            let value = match op {
                BinaryOperator::Plus => left.wrapping_add(right),
                BinaryOperator::Minus => left.wrapping_sub(right),
                BinaryOperator::Multiply => left.wrapping_mul(right),
                BinaryOperator::Divide => left.checked_div(right)?,
                BinaryOperator::Modulo => left.checked_rem(right)?,
                _ => return None,
            };
            return Some(Number::Int(value));
        }

        let (left, right) = (left.as_f64(), right.as_f64());
        let value = match op {
            BinaryOperator::Plus => left + right,
            BinaryOperator::Minus => left - right,
            BinaryOperator::Multiply => left * right,
            BinaryOperator::Divide if right != 0.0 => left / right,
            BinaryOperator::Modulo if right != 0.0 => left % right,
            _ => return None,
        };
        Some(Number::Float(value))
    }
}

fn evaluate(expr: &Expr) -> Option<Number> {
    match expr {
        Expr::Value(ValueWithSpan {
            value: Value::Number(number, _),
            ..
        }) => Number::literal(number),
        Expr::Nested(inner) => evaluate(inner),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => evaluate(expr)?.negate(),
        Expr::UnaryOp {
            op: UnaryOperator::Plus,
            expr,
        } => evaluate(expr),
        Expr::BinaryOp { left, op, right } => Number::apply(op, evaluate(left)?, evaluate(right)?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_decimal_is_normalized() {
        assert_eq!(normalize_default("'3.140'"), "3.14");
    }

    #[test]
    fn test_text_default_kept_verbatim() {
        assert_eq!(normalize_default("'pending'"), "pending");
        assert_eq!(normalize_default("'active user'"), "active user");
    }

    #[test]
    fn test_unquoted_numbers() {
        assert_eq!(normalize_default("0"), "0");
        assert_eq!(normalize_default("42"), "42");
        assert_eq!(normalize_default("-1.50"), "-1.5");
    }

    #[test]
    fn test_arithmetic_is_evaluated() {
        assert_eq!(normalize_default("1 + 2 * 3"), "7");
        assert_eq!(normalize_default("(1 + 2) * 3"), "9");
    }

    #[test]
    fn test_integer_operands_use_integer_arithmetic() {
        assert_eq!(normalize_default("'10 / 4'"), "2");
        assert_eq!(normalize_default("-7 / 2"), "-3");
        assert_eq!(normalize_default("-7 % 3"), "-1");
    }

    #[test]
    fn test_decimal_operand_promotes_to_float() {
        assert_eq!(normalize_default("'10.0 / 4'"), "2.5");
        assert_eq!(normalize_default("10 / 4.0"), "2.5");
        assert_eq!(normalize_default("7.5 % 2"), "1.5");
    }

    #[test]
    fn test_division_by_zero_is_not_numeric() {
        assert_eq!(normalize_default("1 / 0"), "1 / 0");
        assert_eq!(normalize_default("5 % 0"), "5 % 0");
        assert_eq!(normalize_default("1.5 / 0"), "1.5 / 0");
    }

    #[test]
    fn test_non_numeric_expressions_kept() {
        assert_eq!(normalize_default("CURRENT_TIMESTAMP"), "CURRENT_TIMESTAMP");
        assert_eq!(normalize_default("now()"), "now()");
        assert_eq!(normalize_default("''"), "");
    }

    #[test]
    fn test_only_one_quote_pair_stripped() {
        assert_eq!(normalize_default("''x''"), "'x'");
        assert_eq!(normalize_default("'open"), "'open");
    }

    #[test]
    fn test_trailing_tokens_are_not_numeric() {
        assert_eq!(evaluate_numeric("1 2"), None);
        assert_eq!(evaluate_numeric("1 +"), None);
    }
}
