//! Runtime values produced by the expression evaluator.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};

use super::builtins::Builtin;

/// A value bound in a [`Namespace`](super::Namespace) or produced by an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(NaiveDateTime),
    Duration(TimeDelta),
    Builtin(Builtin),
}

impl Value {
    /// Name of the value's type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::DateTime(_) => "datetime",
            Value::Duration(_) => "timedelta",
            Value::Builtin(_) => "builtin_function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Duration(d) => !d.is_zero(),
            Value::DateTime(_) | Value::Builtin(_) => true,
        }
    }

    /// Numeric view used by arithmetic; booleans count as 0 and 1.
    pub(crate) fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Equality across types: numbers compare by value, everything else structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.cmp_exact(b) == Some(Ordering::Equal),
            _ => self == other,
        }
    }

    /// Ordering for comparison operators; `None` when the types are not comparable.
    pub fn partial_order(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.cmp_exact(b);
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Duration(a), Value::Duration(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Text wrapped in double quotes unless it already is quote-delimited.
    pub fn quoted(text: &str) -> String {
        if is_quote_delimited(text) { text.to_string() } else { format!("\"{text}\"") }
    }
}

/// True when `s` is at least two characters long and starts and ends with `"`.
pub fn is_quote_delimited(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    fn cmp_exact(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::DateTime(dt) => f.write_str(&format_datetime(dt)),
            Value::Duration(d) => f.write_str(&format_duration(*d)),
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name()),
        }
    }
}

/// Shortest round-trip float text that always reads back as a float.
pub(crate) fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".into();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf".into() } else { "-inf".into() };
    }
    let magnitude = x.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        return format_exponent(x);
    }
    let text = format!("{x}");
    if text.contains('.') { text } else { format!("{text}.0") }
}

fn format_exponent(x: f64) -> String {
    let text = format!("{x:e}");
    let Some((mantissa, exp)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exp.strip_prefix('-') {
        Some(d) => ('-', d),
        None => ('+', exp),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    let base = dt.format("%Y-%m-%d %H:%M:%S").to_string();
    let micros = dt.and_utc().timestamp_subsec_micros();
    if micros == 0 { base } else { format!("{base}.{micros:06}") }
}

const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;

fn format_duration(d: TimeDelta) -> String {
    // Saturates for spans beyond ~292k years, far outside anything `ts` can produce.
    let total = d.num_microseconds().unwrap_or(i64::MAX);
    let days = total.div_euclid(MICROS_PER_DAY);
    let rest = total.rem_euclid(MICROS_PER_DAY);

    let secs = rest / 1_000_000;
    let micros = rest % 1_000_000;
    let clock = format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60);
    let clock = if micros == 0 { clock } else { format!("{clock}.{micros:06}") };

    match days {
        0 => clock,
        1 | -1 => format!("{days} day, {clock}"),
        _ => format!("{days} days, {clock}"),
    }
}
