//! Expression evaluator
//!
//! Turns a raw write payload into an [`Evaluation`]. Pure, no I/O.

use crate::calc::types::{EvalError, Evaluation, Expression};

/// Evaluate a write payload
pub fn evaluate(payload: &[u8]) -> Evaluation {
    let text = match core::str::from_utf8(payload) {
        Ok(text) => text,
        Err(_) => return Evaluation::Error(EvalError::InvalidUtf8),
    };

    Expression::parse(text)
        .and_then(|expr| expr.compute())
        .into()
}
