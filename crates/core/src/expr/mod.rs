//! Expression language used by `LAMBDA` declarations and `{-{ ... }-}` spans.
//!
//! Supports:
//! - Literals: `42`, `3.5`, `1e3`, `'text'`, `"text"`, `True`, `False`, `None`
//! - Arithmetic: `+ - * / // % **`, string concatenation and repetition
//! - Comparisons (chainable) and boolean logic: `and or not` / `&& || !`
//! - Conditionals: `x if cond else y`
//! - Calls to builtins (`str int float bool len abs min max round`) and to
//!   the `ts` helper, attribute access and method calls on datetimes,
//!   durations and strings, string indexing

pub mod ast;
pub mod builtins;
pub mod derived;
pub mod error;
pub mod eval;
mod lexer;
pub mod namespace;
pub mod parser;
pub mod value;

pub use builtins::{Builtin, parse_timestamp};
pub use derived::{
    DerivedExpressionError, SpanOutcome, TS_HELPER, evaluate_span, inject_helpers, resolve_derived,
};
pub use error::EvalError;
pub use namespace::Namespace;
pub use parser::parse;
pub use value::Value;

/// Parse and evaluate `source` against `ns`.
pub fn evaluate(source: &str, ns: &Namespace) -> Result<Value, EvalError> {
    let expr = parser::parse(source)?;
    eval::eval(&expr, ns)
}
