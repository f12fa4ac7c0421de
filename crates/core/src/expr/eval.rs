//! Tree-walking evaluation of parsed expressions.

use std::cmp::Ordering;

use super::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use super::builtins::{Builtin, call_method, get_attr};
use super::error::EvalError;
use super::namespace::Namespace;
use super::value::{Number, Value};

/// Evaluate a parsed expression against `ns`.
pub fn eval(expr: &Expr, ns: &Namespace) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => lookup(name, ns),
        Expr::Unary(op, operand) => unary(*op, eval(operand, ns)?),
        Expr::Binary(op, lhs, rhs) => binary(*op, eval(lhs, ns)?, eval(rhs, ns)?),
        Expr::And(lhs, rhs) => {
            let left = eval(lhs, ns)?;
            if left.is_truthy() { eval(rhs, ns) } else { Ok(left) }
        }
        Expr::Or(lhs, rhs) => {
            let left = eval(lhs, ns)?;
            if left.is_truthy() { Ok(left) } else { eval(rhs, ns) }
        }
        Expr::Compare(first, rest) => {
            let mut left = eval(first, ns)?;
            for (op, operand) in rest {
                let right = eval(operand, ns)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::Conditional { cond, then, otherwise } => {
            if eval(cond, ns)?.is_truthy() { eval(then, ns) } else { eval(otherwise, ns) }
        }
        Expr::Call(callee, args) => {
            let args = args.iter().map(|a| eval(a, ns)).collect::<Result<Vec<_>, _>>()?;
            if let Expr::Attr(receiver, method) = callee.as_ref() {
                return call_method(eval(receiver, ns)?, method, args);
            }
            match eval(callee, ns)? {
                Value::Builtin(builtin) => builtin.call(args),
                other => Err(EvalError::type_mismatch(format!(
                    "'{}' object is not callable",
                    other.type_name()
                ))),
            }
        }
        Expr::Attr(receiver, attr) => get_attr(&eval(receiver, ns)?, attr),
        Expr::Index(target, index) => subscript(eval(target, ns)?, eval(index, ns)?),
    }
}

fn lookup(name: &str, ns: &Namespace) -> Result<Value, EvalError> {
    if let Some(value) = ns.get(name) {
        return Ok(value.clone());
    }
    Builtin::implicit(name)
        .map(Value::Builtin)
        .ok_or_else(|| EvalError::UndefinedName(name.to_string()))
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match (&operand, operand.as_number()) {
            (Value::Duration(d), _) => Ok(Value::Duration(-*d)),
            (_, Some(Number::Int(i))) => {
                i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow("negation"))
            }
            (_, Some(Number::Float(f))) => Ok(Value::Float(-f)),
            _ => Err(bad_unary("-", &operand)),
        },
        UnaryOp::Pos => match operand.as_number() {
            Some(Number::Int(i)) => Ok(Value::Int(i)),
            Some(Number::Float(f)) => Ok(Value::Float(f)),
            None if matches!(operand, Value::Duration(_)) => Ok(operand),
            None => Err(bad_unary("+", &operand)),
        },
    }
}

fn bad_unary(symbol: &str, operand: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "bad operand type for unary {symbol}: '{}'",
        operand.type_name()
    ))
}

fn bad_operands(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
        return numeric(op, a, b);
    }
    match (op, &lhs, &rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (BinaryOp::Mul, Value::Str(s), Value::Int(n))
        | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => repeat(s, *n),
        (BinaryOp::Add, Value::DateTime(dt), Value::Duration(d))
        | (BinaryOp::Add, Value::Duration(d), Value::DateTime(dt)) => dt
            .checked_add_signed(*d)
            .map(Value::DateTime)
            .ok_or(EvalError::Overflow("datetime arithmetic")),
        (BinaryOp::Sub, Value::DateTime(dt), Value::Duration(d)) => dt
            .checked_sub_signed(*d)
            .map(Value::DateTime)
            .ok_or(EvalError::Overflow("datetime arithmetic")),
        (BinaryOp::Sub, Value::DateTime(a), Value::DateTime(b)) => {
            Ok(Value::Duration(a.signed_duration_since(*b)))
        }
        (BinaryOp::Add, Value::Duration(a), Value::Duration(b)) => a
            .checked_add(b)
            .map(Value::Duration)
            .ok_or(EvalError::Overflow("timedelta arithmetic")),
        (BinaryOp::Sub, Value::Duration(a), Value::Duration(b)) => a
            .checked_sub(b)
            .map(Value::Duration)
            .ok_or(EvalError::Overflow("timedelta arithmetic")),
        (BinaryOp::Mul, Value::Duration(d), Value::Int(n))
        | (BinaryOp::Mul, Value::Int(n), Value::Duration(d)) => {
            i32::try_from(*n)
                .ok()
                .and_then(|n| d.checked_mul(n))
                .map(Value::Duration)
                .ok_or(EvalError::Overflow("timedelta arithmetic"))
        }
        _ => Err(bad_operands(op, &lhs, &rhs)),
    }
}

/// Longest string a single repetition may build.
pub const MAX_STRING_LEN: usize = 1 << 26;

fn repeat(s: &str, n: i64) -> Result<Value, EvalError> {
    let times = usize::try_from(n).unwrap_or(0);
    match s.len().checked_mul(times) {
        Some(len) if len <= MAX_STRING_LEN => Ok(Value::Str(s.repeat(times))),
        _ => Err(EvalError::Overflow("*")),
    }
}

fn numeric(op: BinaryOp, a: Number, b: Number) -> Result<Value, EvalError> {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => int_op(op, x, y),
        _ => float_op(op, a.as_f64(), b.as_f64()),
    }
}

fn int_op(op: BinaryOp, x: i64, y: i64) -> Result<Value, EvalError> {
    let overflow = EvalError::Overflow(op.symbol());
    match op {
        BinaryOp::Add => x.checked_add(y).map(Value::Int).ok_or(overflow),
        BinaryOp::Sub => x.checked_sub(y).map(Value::Int).ok_or(overflow),
        BinaryOp::Mul => x.checked_mul(y).map(Value::Int).ok_or(overflow),
        #[allow(clippy::cast_precision_loss)]
        BinaryOp::Div => float_op(op, x as f64, y as f64),
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = x.checked_div(y).ok_or(overflow)?;
            // round towards negative infinity
            let inexact = x % y != 0 && ((x < 0) != (y < 0));
            Ok(Value::Int(if inexact { q - 1 } else { q }))
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = x.checked_rem(y).ok_or(overflow)?;
            // result takes the sign of the divisor
            if r != 0 && ((r < 0) != (y < 0)) { Ok(Value::Int(r + y)) } else { Ok(Value::Int(r)) }
        }
        BinaryOp::Pow => match u32::try_from(y) {
            Ok(exp) => x.checked_pow(exp).map(Value::Int).ok_or(overflow),
            #[allow(clippy::cast_precision_loss)]
            Err(_) => float_op(op, x as f64, y as f64),
        },
    }
}

fn float_op(op: BinaryOp, x: f64, y: f64) -> Result<Value, EvalError> {
    let divides = matches!(op, BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod);
    if divides && y == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::FloorDiv => (x / y).floor(),
        BinaryOp::Mod => {
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }
        }
        BinaryOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            x.powf(y)
        }
    };
    Ok(Value::Float(result))
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(lhs.loose_eq(rhs)),
        CompareOp::NotEq => Ok(!lhs.loose_eq(rhs)),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = lhs.partial_order(rhs).ok_or_else(|| {
                EvalError::type_mismatch(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    compare_symbol(op),
                    lhs.type_name(),
                    rhs.type_name()
                ))
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn compare_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "==",
        CompareOp::NotEq => "!=",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
    }
}

fn subscript(target: Value, index: Value) -> Result<Value, EvalError> {
    let (Value::Str(s), Some(Number::Int(i))) = (&target, index.as_number()) else {
        return Err(EvalError::type_mismatch(format!(
            "'{}' object is not subscriptable with '{}'",
            target.type_name(),
            index.type_name()
        )));
    };
    let len = i64::try_from(s.chars().count()).map_err(|_| EvalError::Overflow("index"))?;
    let position = if i < 0 { i + len } else { i };
    usize::try_from(position)
        .ok()
        .and_then(|p| s.chars().nth(p))
        .map(|c| Value::Str(c.to_string()))
        .ok_or(EvalError::IndexOutOfRange("string"))
}
