use thiserror::Error;
use tracing::trace;

use super::builtins::Builtin;
use super::error::EvalError;
use super::namespace::Namespace;
use super::value::Value;
use super::evaluate;
use crate::directives::DerivedExpression;

/// Name under which the timestamp helper is bound in every namespace.
pub const TS_HELPER: &str = "ts";

/// A derived expression failed; the whole source is abandoned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {} at line {}", .source.category(), .source, .line)]
pub struct DerivedExpressionError {
    pub name: String,
    pub line: usize,
    pub source: EvalError,
}

/// Result of evaluating one embedded `{-{ ... }-}` span.
#[derive(Debug, Clone, PartialEq)]
pub enum SpanOutcome {
    /// Replace the span with this text.
    Resolved(String),
    /// Keep the span, delimiters included, exactly as written.
    Unchanged,
}

/// Bind the helpers every combination can call.
pub fn inject_helpers(ns: &mut Namespace) {
    ns.bind(TS_HELPER, Value::Builtin(Builtin::Ts));
}

/// Evaluate `derived` in order, binding each result before the next runs.
///
/// Textual results are re-quoted so they land in generated output as
/// string literals.
pub fn resolve_derived(
    ns: &mut Namespace,
    derived: &[DerivedExpression],
) -> Result<(), DerivedExpressionError> {
    for decl in derived {
        let value = evaluate(&decl.expression, ns).map_err(|source| DerivedExpressionError {
            name: decl.name.clone(),
            line: decl.line,
            source,
        })?;
        let value = match value {
            Value::Str(s) => Value::Str(Value::quoted(&s)),
            other => other,
        };
        ns.bind(decl.name.clone(), value);
    }
    Ok(())
}

/// Evaluate the text inside an embedded span. Failures are not errors here.
pub fn evaluate_span(expression: &str, ns: &Namespace) -> SpanOutcome {
    match evaluate(expression, ns) {
        Ok(value) => SpanOutcome::Resolved(value.to_string()),
        Err(err) => {
            trace!(expression, error = %err, "embedded expression left verbatim");
            SpanOutcome::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, expression: &str, line: usize) -> DerivedExpression {
        DerivedExpression { name: name.into(), expression: expression.into(), line }
    }

    fn base() -> Namespace {
        let mut ns = Namespace::new();
        ns.bind("a", Value::Int(2));
        ns.bind("n", Value::Int(3));
        inject_helpers(&mut ns);
        ns
    }

    #[test]
    fn later_declarations_see_earlier_results() {
        let mut ns = base();
        resolve_derived(&mut ns, &[decl("sum", "a + n", 1), decl("twice", "sum * 2", 2)]).unwrap();
        assert_eq!(ns.get("sum"), Some(&Value::Int(5)));
        assert_eq!(ns.get("twice"), Some(&Value::Int(10)));
    }

    #[test]
    fn string_results_are_requoted_once() {
        let mut ns = base();
        resolve_derived(&mut ns, &[decl("s", "'x' * a", 1), decl("q", "'\"ok\"'", 2)]).unwrap();
        assert_eq!(ns.get("s"), Some(&Value::Str("\"xx\"".into())));
        assert_eq!(ns.get("q"), Some(&Value::Str("\"ok\"".into())));
    }

    #[test]
    fn self_reference_fails_with_line() {
        let mut ns = base();
        let err = resolve_derived(&mut ns, &[decl("loop_", "loop_ + 1", 7)]).unwrap_err();
        assert_eq!(err.line, 7);
        assert_eq!(err.to_string(), "UndefinedName: name 'loop_' is not defined at line 7");
    }

    #[test]
    fn forward_reference_fails() {
        let mut ns = base();
        let err = resolve_derived(&mut ns, &[decl("x", "y", 1), decl("y", "1", 2)]).unwrap_err();
        assert_eq!(err.name, "x");
    }

    #[test]
    fn ts_helper_is_available() {
        let mut ns = base();
        resolve_derived(&mut ns, &[decl("y", "ts('2020-02-29T00:00:00Z').year", 1)]).unwrap();
        assert_eq!(ns.get("y"), Some(&Value::Int(2020)));
    }

    #[test]
    fn broken_span_is_left_alone() {
        let ns = base();
        assert_eq!(evaluate_span("n*100", &ns), SpanOutcome::Resolved("300".into()));
        assert_eq!(evaluate_span("n*", &ns), SpanOutcome::Unchanged);
        assert_eq!(evaluate_span("missing + 1", &ns), SpanOutcome::Unchanged);
    }
}
