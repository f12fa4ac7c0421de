//! Builtin functions, the `ts` timestamp helper, and methods on values.

use chrono::{Datelike, NaiveDateTime, TimeDelta, Timelike};

use super::error::EvalError;
use super::value::{Number, Value, is_quote_delimited};

/// Timestamp layouts accepted by `ts`, tried in order.
pub const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H:%M:%SZ"];

/// A callable provided by the evaluator rather than declared in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Injected helper; only reachable through a namespace binding.
    Ts,
    Str,
    Int,
    Float,
    Bool,
    Len,
    Abs,
    Min,
    Max,
    Round,
}

impl Builtin {
    /// Builtins resolvable by name without being bound in the namespace.
    pub fn implicit(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "str" => Builtin::Str,
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "bool" => Builtin::Bool,
            "len" => Builtin::Len,
            "abs" => Builtin::Abs,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "round" => Builtin::Round,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Ts => "ts",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Bool => "bool",
            Builtin::Len => "len",
            Builtin::Abs => "abs",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Round => "round",
        }
    }

    pub fn call(self, args: Vec<Value>) -> Result<Value, EvalError> {
        match self {
            Builtin::Ts => {
                let [arg] = self.exact::<1>(args)?;
                match arg {
                    Value::Str(text) => parse_timestamp(&text).map(Value::DateTime),
                    other => Err(self.bad_arg(&other)),
                }
            }
            Builtin::Str => {
                let [arg] = self.exact::<1>(args)?;
                Ok(Value::Str(arg.to_string()))
            }
            Builtin::Int => {
                let [arg] = self.exact::<1>(args)?;
                to_int(arg)
            }
            Builtin::Float => {
                let [arg] = self.exact::<1>(args)?;
                to_float(arg)
            }
            Builtin::Bool => {
                let [arg] = self.exact::<1>(args)?;
                Ok(Value::Bool(arg.is_truthy()))
            }
            Builtin::Len => {
                let [arg] = self.exact::<1>(args)?;
                match arg {
                    Value::Str(s) => i64::try_from(s.chars().count())
                        .map(Value::Int)
                        .map_err(|_| EvalError::Overflow("len")),
                    other => Err(EvalError::type_mismatch(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    ))),
                }
            }
            Builtin::Abs => {
                let [arg] = self.exact::<1>(args)?;
                match arg {
                    Value::Duration(d) => Ok(Value::Duration(d.abs())),
                    other => match other.as_number() {
                        Some(Number::Int(i)) => {
                            i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow("abs"))
                        }
                        Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
                        None => Err(self.bad_arg(&other)),
                    },
                }
            }
            Builtin::Min | Builtin::Max => self.extreme(args),
            Builtin::Round => round(self, args),
        }
    }

    fn exact<const N: usize>(self, args: Vec<Value>) -> Result<[Value; N], EvalError> {
        let count = args.len();
        args.try_into().map_err(|_| {
            EvalError::type_mismatch(format!(
                "{}() takes exactly {N} argument{} ({count} given)",
                self.name(),
                if N == 1 { "" } else { "s" }
            ))
        })
    }

    fn bad_arg(self, value: &Value) -> EvalError {
        EvalError::type_mismatch(format!(
            "{}() does not accept '{}'",
            self.name(),
            value.type_name()
        ))
    }

    fn extreme(self, args: Vec<Value>) -> Result<Value, EvalError> {
        let mut iter = args.into_iter();
        let Some(mut best) = iter.next() else {
            return Err(EvalError::type_mismatch(format!(
                "{}() expected at least 1 argument",
                self.name()
            )));
        };
        for candidate in iter {
            let ordering = candidate.partial_order(&best).ok_or_else(|| {
                EvalError::type_mismatch(format!(
                    "{}() cannot compare '{}' and '{}'",
                    self.name(),
                    candidate.type_name(),
                    best.type_name()
                ))
            })?;
            let better = match self {
                Builtin::Min => ordering.is_lt(),
                _ => ordering.is_gt(),
            };
            if better {
                best = candidate;
            }
        }
        Ok(best)
    }
}

/// Parse an RFC 3339 UTC timestamp with or without fractional seconds.
///
/// A surrounding pair of double quotes is ignored, so quoted string
/// variables can be passed straight through.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, EvalError> {
    let bare = if is_quote_delimited(text) { &text[1..text.len() - 1] } else { text };
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(bare, fmt).ok())
        .ok_or_else(|| {
            EvalError::InvalidValue(format!(
                "timestamp {bare} did not match any parseable time format"
            ))
        })
}

fn to_int(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Int(i) => Ok(Value::Int(i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(f) => float_to_int(f.trunc(), "int"),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::InvalidValue(format!("invalid literal for int(): {s:?}"))),
        other => Err(Builtin::Int.bad_arg(&other)),
    }
}

fn float_to_int(f: f64, op: &'static str) -> Result<Value, EvalError> {
    #[allow(clippy::cast_precision_loss)]
    let in_range = f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64;
    if !in_range {
        return Err(EvalError::Overflow(op));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(Value::Int(f as i64))
}

fn to_float(value: Value) -> Result<Value, EvalError> {
    match value {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| {
                EvalError::InvalidValue(format!("could not convert string to float: {s:?}"))
            }),
        other => match other.as_number() {
            Some(n) => Ok(Value::Float(n.as_f64())),
            None => Err(Builtin::Float.bad_arg(&other)),
        },
    }
}

fn round(builtin: Builtin, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut iter = args.into_iter();
    let (Some(value), digits, None) = (iter.next(), iter.next(), iter.next()) else {
        return Err(EvalError::type_mismatch("round() takes 1 or 2 arguments"));
    };
    let number = value.as_number().ok_or_else(|| builtin.bad_arg(&value))?;
    match digits {
        None => match number {
            Number::Int(i) => Ok(Value::Int(i)),
            Number::Float(f) => float_to_int(f.round_ties_even(), "round"),
        },
        Some(Value::Int(n)) => match number {
            Number::Int(i) if n >= 0 => Ok(Value::Int(i)),
            other => {
                let exp = i32::try_from(n).map_err(|_| EvalError::Overflow("round"))?;
                let scale = 10f64.powi(exp);
                Ok(Value::Float((other.as_f64() * scale).round_ties_even() / scale))
            }
        },
        Some(other) => Err(builtin.bad_arg(&other)),
    }
}

/// Read-only attribute access (`dt.year`, `delta.days`).
pub fn get_attr(value: &Value, attr: &str) -> Result<Value, EvalError> {
    let found = match (value, attr) {
        (Value::DateTime(dt), "year") => Some(i64::from(dt.year())),
        (Value::DateTime(dt), "month") => Some(i64::from(dt.month())),
        (Value::DateTime(dt), "day") => Some(i64::from(dt.day())),
        (Value::DateTime(dt), "hour") => Some(i64::from(dt.hour())),
        (Value::DateTime(dt), "minute") => Some(i64::from(dt.minute())),
        (Value::DateTime(dt), "second") => Some(i64::from(dt.second())),
        (Value::DateTime(dt), "microsecond") => {
            Some(i64::from(dt.and_utc().timestamp_subsec_micros()))
        }
        (Value::Duration(d), "days") => Some(duration_parts(*d).0),
        (Value::Duration(d), "seconds") => Some(duration_parts(*d).1),
        (Value::Duration(d), "microseconds") => Some(duration_parts(*d).2),
        _ => None,
    };
    found.map(Value::Int).ok_or_else(|| EvalError::UnknownAttribute {
        type_name: value.type_name(),
        attr: attr.to_string(),
    })
}

/// Normalised (days, seconds, microseconds) with only `days` negative.
fn duration_parts(d: TimeDelta) -> (i64, i64, i64) {
    const MICROS_PER_DAY: i64 = 86_400 * 1_000_000;
    let total = d.num_microseconds().unwrap_or(i64::MAX);
    let rest = total.rem_euclid(MICROS_PER_DAY);
    (total.div_euclid(MICROS_PER_DAY), rest / 1_000_000, rest % 1_000_000)
}

/// Method call (`dt.timestamp()`, `s.upper()`).
pub fn call_method(value: Value, method: &str, args: Vec<Value>) -> Result<Value, EvalError> {
    let arity = |expected: usize| -> Result<(), EvalError> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvalError::type_mismatch(format!(
                "{method}() takes {expected} argument(s) ({} given)",
                args.len()
            )))
        }
    };

    match (&value, method) {
        (Value::DateTime(dt), "timestamp") => {
            arity(0)?;
            let utc = dt.and_utc();
            #[allow(clippy::cast_precision_loss)]
            let secs = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_micros()) / 1e6;
            Ok(Value::Float(secs))
        }
        (Value::DateTime(dt), "isoformat") => {
            arity(0)?;
            let text = Value::DateTime(*dt).to_string().replacen(' ', "T", 1);
            Ok(Value::Str(text))
        }
        (Value::DateTime(dt), "strftime") => {
            arity(1)?;
            match &args[0] {
                Value::Str(fmt) => strftime(dt, fmt),
                other => Err(EvalError::type_mismatch(format!(
                    "strftime() argument must be str, not '{}'",
                    other.type_name()
                ))),
            }
        }
        (Value::Duration(d), "total_seconds") => {
            arity(0)?;
            #[allow(clippy::cast_precision_loss)]
            let micros = d.num_microseconds().ok_or(EvalError::Overflow("total_seconds"))? as f64;
            Ok(Value::Float(micros / 1e6))
        }
        (Value::Str(s), "upper") => arity(0).map(|()| Value::Str(s.to_uppercase())),
        (Value::Str(s), "lower") => arity(0).map(|()| Value::Str(s.to_lowercase())),
        (Value::Str(s), "strip") => arity(0).map(|()| Value::Str(s.trim().to_string())),
        (Value::Str(s), "startswith" | "endswith" | "replace") => str_method(s, method, &args),
        _ => Err(EvalError::UnknownAttribute {
            type_name: value.type_name(),
            attr: method.to_string(),
        }),
    }
}

fn str_method(s: &str, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    let texts: Vec<&str> = args
        .iter()
        .map(|a| match a {
            Value::Str(t) => Ok(t.as_str()),
            other => Err(EvalError::type_mismatch(format!(
                "{method}() arguments must be str, not '{}'",
                other.type_name()
            ))),
        })
        .collect::<Result<_, _>>()?;

    match (method, texts.as_slice()) {
        ("startswith", [prefix]) => Ok(Value::Bool(s.starts_with(prefix))),
        ("endswith", [suffix]) => Ok(Value::Bool(s.ends_with(suffix))),
        ("replace", [from, to]) => Ok(Value::Str(s.replace(from, to))),
        _ => Err(EvalError::type_mismatch(format!("{method}() got {} argument(s)", texts.len()))),
    }
}

fn strftime(dt: &NaiveDateTime, fmt: &str) -> Result<Value, EvalError> {
    use std::fmt::Write;

    let mut out = String::new();
    write!(out, "{}", dt.format(fmt))
        .map_err(|_| EvalError::InvalidValue(format!("invalid strftime format {fmt:?}")))?;
    Ok(Value::Str(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ts_accepts_both_layouts() {
        let with_fraction = parse_timestamp("2019-05-01T12:30:00.250000Z").unwrap();
        assert_eq!(with_fraction.and_utc().timestamp_subsec_micros(), 250_000);
        let without = parse_timestamp("2019-05-01T12:30:00Z").unwrap();
        assert_eq!(without.hour(), 12);
    }

    #[test]
    fn ts_ignores_surrounding_quotes() {
        assert!(parse_timestamp("\"2019-05-01T12:30:00Z\"").is_ok());
    }

    #[test]
    fn ts_rejects_other_layouts() {
        let err = parse_timestamp("2019-05-01 12:30:00").unwrap_err();
        assert_eq!(err.category(), "InvalidValue");
        assert!(err.to_string().contains("did not match any parseable time format"));
    }

    #[test]
    fn int_conversions() {
        assert_eq!(to_int(Value::Float(-2.7)).unwrap(), Value::Int(-2));
        assert_eq!(to_int(Value::Str(" 42 ".into())).unwrap(), Value::Int(42));
        assert!(to_int(Value::Str("4.2".into())).is_err());
    }

    #[test]
    fn round_uses_bankers_rounding() {
        assert_eq!(Builtin::Round.call(vec![Value::Float(2.5)]).unwrap(), Value::Int(2));
        assert_eq!(Builtin::Round.call(vec![Value::Float(3.5)]).unwrap(), Value::Int(4));
        assert_eq!(
            Builtin::Round.call(vec![Value::Float(1.234), Value::Int(2)]).unwrap(),
            Value::Float(1.23)
        );
    }

    #[test]
    fn min_max_pick_extremes() {
        let args = vec![Value::Int(3), Value::Float(1.5), Value::Int(2)];
        assert_eq!(Builtin::Min.call(args.clone()).unwrap(), Value::Float(1.5));
        assert_eq!(Builtin::Max.call(args).unwrap(), Value::Int(3));
        assert!(Builtin::Max.call(vec![]).is_err());
    }

    #[test]
    fn wrong_arity_is_a_type_mismatch() {
        let err = Builtin::Len.call(vec![]).unwrap_err();
        assert_eq!(err.to_string(), "len() takes exactly 1 argument (0 given)");
    }

    #[test]
    fn duration_attributes_normalise() {
        let d = Value::Duration(TimeDelta::seconds(-1));
        assert_eq!(get_attr(&d, "days").unwrap(), Value::Int(-1));
        assert_eq!(get_attr(&d, "seconds").unwrap(), Value::Int(86_399));
    }

    #[test]
    fn timestamp_is_seconds_since_epoch() {
        let dt = parse_timestamp("1970-01-02T00:00:00.500000Z").unwrap();
        let secs = call_method(Value::DateTime(dt), "timestamp", vec![]).unwrap();
        assert_eq!(secs, Value::Float(86_400.5));
    }
}
