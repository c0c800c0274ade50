//! Expression and result types for the calculator protocol
//!
//! # Wire Format
//!
//! The central writes a UTF-8 expression to the Write characteristic:
//! ```text
//! <lhs><op><rhs>      e.g. "12*4", "-3/2"
//! ```
//!
//! The Notify characteristic then carries either the decimal result
//! (`"48"`, `"-1"`) or the literal token `"ERROR"`. Errors never appear as
//! GATT status codes; only the notified text tells the central that the
//! expression was rejected.

use core::fmt::{self, Write};

use crate::config::calc::{ERROR_TOKEN, RESULT_CAPACITY};
use heapless::String;

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Operators in the order they are looked for in a payload.
    ///
    /// A payload containing both `+` and `-` is an addition because `+` is
    /// checked first.
    pub const PRIORITY: [Operator; 4] = [
        Operator::Add,
        Operator::Subtract,
        Operator::Multiply,
        Operator::Divide,
    ];

    /// Character used for this operator on the wire
    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    /// Pick the first operator (in priority order) present in `text`
    pub fn select(text: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|op| text.contains(op.symbol()))
    }

    /// Apply the operator with overflow and division checks
    pub fn apply(self, lhs: i32, rhs: i32) -> Result<i32, EvalError> {
        let result = match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Subtract => lhs.checked_sub(rhs),
            Operator::Multiply => lhs.checked_mul(rhs),
            Operator::Divide => {
                if rhs == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                lhs.checked_div(rhs)
            }
        };
        result.ok_or(EvalError::Overflow)
    }
}

/// Why a payload could not be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalError {
    /// Payload is not valid UTF-8
    InvalidUtf8,
    /// Payload is empty
    Empty,
    /// None of `+ - * /` appears in the payload
    NoOperator,
    /// Splitting on the operator did not give exactly two segments
    OperandCount,
    /// One side of the operator is empty
    MissingOperand,
    /// An operand is not a base-10 `i32`
    InvalidOperand,
    /// Right operand of `/` is zero
    DivisionByZero,
    /// Result does not fit in an `i32`
    Overflow,
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EvalError::InvalidUtf8 => "payload is not UTF-8",
            EvalError::Empty => "empty payload",
            EvalError::NoOperator => "no operator",
            EvalError::OperandCount => "expected exactly two operands",
            EvalError::MissingOperand => "missing operand",
            EvalError::InvalidOperand => "operand is not an integer",
            EvalError::DivisionByZero => "division by zero",
            EvalError::Overflow => "integer overflow",
        };
        f.write_str(text)
    }
}

/// A parsed two-operand expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression {
    pub operator: Operator,
    pub lhs: i32,
    pub rhs: i32,
}

impl Expression {
    /// Parse `<lhs><op><rhs>`.
    ///
    /// The operator is chosen by [`Operator::select`], then the text is split
    /// on every occurrence of that character, so `"1+2+3"` has three segments
    /// and is rejected.
    pub fn parse(text: &str) -> Result<Self, EvalError> {
        if text.is_empty() {
            return Err(EvalError::Empty);
        }

        let operator = Operator::select(text).ok_or(EvalError::NoOperator)?;

        let mut segments = text.split(operator.symbol());
        let (Some(lhs), Some(rhs), None) = (segments.next(), segments.next(), segments.next())
        else {
            return Err(EvalError::OperandCount);
        };

        Ok(Self {
            operator,
            lhs: parse_operand(lhs)?,
            rhs: parse_operand(rhs)?,
        })
    }

    /// Compute the expression
    pub fn compute(&self) -> Result<i32, EvalError> {
        self.operator.apply(self.lhs, self.rhs)
    }
}

fn parse_operand(segment: &str) -> Result<i32, EvalError> {
    if segment.is_empty() {
        return Err(EvalError::MissingOperand);
    }
    segment.parse().map_err(|_| EvalError::InvalidOperand)
}

/// Outcome of evaluating one write payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Value(i32),
    Error(EvalError),
}

impl Evaluation {
    /// Encode for the Notify characteristic: decimal text or `"ERROR"`
    pub fn encode(&self) -> String<RESULT_CAPACITY> {
        let mut out = String::new();
        match self {
            Evaluation::Value(value) => {
                // i32::MIN is 11 characters, always fits
                let _ = write!(out, "{}", value);
            }
            Evaluation::Error(_) => {
                let _ = out.push_str(ERROR_TOKEN);
            }
        }
        out
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Evaluation::Error(_))
    }
}

impl From<Result<i32, EvalError>> for Evaluation {
    fn from(result: Result<i32, EvalError>) -> Self {
        match result {
            Ok(value) => Evaluation::Value(value),
            Err(error) => Evaluation::Error(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_priority_prefers_add() {
        assert_eq!(Operator::select("7-2+1"), Some(Operator::Add));
        assert_eq!(Operator::select("6*-2"), Some(Operator::Subtract));
        assert_eq!(Operator::select("8/2*3"), Some(Operator::Multiply));
        assert_eq!(Operator::select("8/2"), Some(Operator::Divide));
        assert_eq!(Operator::select("42"), None);
    }

    #[test]
    fn test_parse_expression() {
        let expr = Expression::parse("12*4").expect("Should parse");
        assert_eq!(expr.operator, Operator::Multiply);
        assert_eq!(expr.lhs, 12);
        assert_eq!(expr.rhs, 4);
    }

    #[test]
    fn test_parse_rejects_extra_segments() {
        assert_eq!(Expression::parse("1+2+3"), Err(EvalError::OperandCount));
    }

    #[test]
    fn test_parse_missing_operand() {
        assert_eq!(Expression::parse("3+"), Err(EvalError::MissingOperand));
        assert_eq!(Expression::parse("+3"), Err(EvalError::MissingOperand));
    }

    #[test]
    fn test_apply_checks() {
        assert_eq!(Operator::Divide.apply(5, 0), Err(EvalError::DivisionByZero));
        assert_eq!(Operator::Add.apply(i32::MAX, 1), Err(EvalError::Overflow));
        assert_eq!(Operator::Divide.apply(i32::MIN, -1), Err(EvalError::Overflow));
        assert_eq!(Operator::Divide.apply(-7, 2), Ok(-3));
    }

    #[test]
    fn test_encode() {
        assert_eq!(Evaluation::Value(48).encode().as_str(), "48");
        assert_eq!(Evaluation::Value(i32::MIN).encode().as_str(), "-2147483648");
        assert_eq!(
            Evaluation::Error(EvalError::DivisionByZero).encode().as_str(),
            "ERROR"
        );
    }
}
