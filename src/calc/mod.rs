pub mod evaluator;
pub mod types;

pub use evaluator::evaluate;
pub use types::{EvalError, Evaluation, Expression, Operator};
