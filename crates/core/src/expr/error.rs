use thiserror::Error;

/// Errors raised while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{message} (at offset {position})")]
    Syntax { message: String, position: usize },

    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    #[error("{0}")]
    TypeMismatch(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    #[error("{0} index out of range")]
    IndexOutOfRange(&'static str),

    #[error("'{type_name}' object has no attribute '{attr}'")]
    UnknownAttribute { type_name: &'static str, attr: String },

    #[error("expression nesting exceeds {0} levels")]
    NestingTooDeep(usize),
}

impl EvalError {
    /// Short category name shown in front of the message in diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            EvalError::Syntax { .. } => "Syntax",
            EvalError::UndefinedName(_) => "UndefinedName",
            EvalError::TypeMismatch(_) => "TypeMismatch",
            EvalError::InvalidValue(_) => "InvalidValue",
            EvalError::DivisionByZero => "DivisionByZero",
            EvalError::Overflow(_) => "Overflow",
            EvalError::IndexOutOfRange(_) => "IndexOutOfRange",
            EvalError::UnknownAttribute { .. } => "UnknownAttribute",
            EvalError::NestingTooDeep(_) => "NestingTooDeep",
        }
    }

    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        EvalError::Syntax { message: message.into(), position }
    }

    pub(crate) fn type_mismatch(message: impl Into<String>) -> Self {
        EvalError::TypeMismatch(message.into())
    }
}
