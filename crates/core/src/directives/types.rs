use std::path::PathBuf;

use crate::expr::Value;

/// Line that separates the directive header from the template body.
pub const TEMPLATE_SENTINEL: &str = "BEGIN_TEMPLATE";

/// How the values of a variable are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// `VAR`: integer, then float, then string.
    Typed,
    /// `SVAR`: always a quoted string.
    StringForced,
}

impl VariableKind {
    pub fn keyword(self) -> &'static str {
        match self {
            VariableKind::Typed => "VAR",
            VariableKind::StringForced => "SVAR",
        }
    }
}

/// A named value domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub kind: VariableKind,
    pub values: Vec<Value>,
    /// 1-based line of the declaration.
    pub line: usize,
}

/// A named expression computed once per combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedExpression {
    pub name: String,
    /// Expression text exactly as written after `=`, trimmed.
    pub expression: String,
    /// 1-based line of the declaration.
    pub line: usize,
}

/// A fully parsed crank source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CrankSource {
    pub path: PathBuf,
    /// Variables in declaration order.
    pub variables: Vec<Variable>,
    /// Derived expressions in declaration order.
    pub derived: Vec<DerivedExpression>,
    /// Everything after the sentinel line, verbatim.
    pub template: String,
    /// 1-based line number of the first template line.
    pub template_line: usize,
}

impl CrankSource {
    /// File name used in headers and diagnostics.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}
