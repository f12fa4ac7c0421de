//! Header parsing for crank sources.
//!
//! A source looks like:
//! ```text
//! VAR a = A, B, C
//! SVAR id = 1, 2
//! LAMBDA shout = a + "!"
//! BEGIN_TEMPLATE
//! ...body...
//! ```
//! Lines before the sentinel that do not start with a keyword are ignored.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::types::{
    CrankSource, DerivedExpression, TEMPLATE_SENTINEL, Variable, VariableKind,
};
use crate::expr::Value;

/// Structural problems in a source header. All of them stop the file.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("failed to read source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file}:{line}: {keyword} directive is missing '=' between name and values")]
    MissingSeparator { file: String, line: usize, keyword: &'static str },

    #[error("{file}:{line}: {keyword} directive does not declare a name")]
    MissingName { file: String, line: usize, keyword: &'static str },

    #[error("{file}:{line}: '{name}' is not a valid name")]
    InvalidName { file: String, line: usize, name: String },

    #[error("{file}:{line}: '{name}' is already declared on line {first}")]
    Duplicate { file: String, line: usize, name: String, first: usize },

    #[error("{file}: no BEGIN_TEMPLATE line found")]
    MissingTemplate { file: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Var(VariableKind),
    Lambda,
}

impl Keyword {
    fn text(self) -> &'static str {
        match self {
            Keyword::Var(kind) => kind.keyword(),
            Keyword::Lambda => "LAMBDA",
        }
    }
}

/// Read and parse the source at `path`.
pub fn load_source(path: &Path) -> Result<CrankSource, DirectiveError> {
    let content = fs::read_to_string(path)
        .map_err(|e| DirectiveError::Io { path: path.to_path_buf(), source: e })?;
    parse_source(path, &content)
}

/// Parse `content` as a crank source. `path` is only used for diagnostics
/// and for naming generated files.
pub fn parse_source(path: &Path, content: &str) -> Result<CrankSource, DirectiveError> {
    let file = path.display().to_string();
    let mut variables = Vec::new();
    let mut derived = Vec::new();
    let mut declared: HashMap<String, usize> = HashMap::new();

    let mut lines = content.split_inclusive('\n').enumerate();
    let mut template_line = None;

    for (idx, raw) in lines.by_ref() {
        let line_no = idx + 1;
        if raw.trim() == TEMPLATE_SENTINEL {
            template_line = Some(line_no + 1);
            break;
        }
        let Some(keyword) = classify(raw) else {
            continue;
        };

        let (lhs, rhs) = raw.split_once('=').ok_or_else(|| DirectiveError::MissingSeparator {
            file: file.clone(),
            line: line_no,
            keyword: keyword.text(),
        })?;
        let name = lhs[keyword.text().len()..].trim();
        if name.is_empty() {
            return Err(DirectiveError::MissingName {
                file,
                line: line_no,
                keyword: keyword.text(),
            });
        }
        if !is_identifier(name) {
            return Err(DirectiveError::InvalidName { file, line: line_no, name: name.to_string() });
        }
        if let Some(&first) = declared.get(name) {
            return Err(DirectiveError::Duplicate {
                file,
                line: line_no,
                name: name.to_string(),
                first,
            });
        }
        declared.insert(name.to_string(), line_no);

        let rhs = rhs.trim();
        match keyword {
            Keyword::Var(kind) => {
                let values = rhs.split(',').map(|v| parse_value(kind, v.trim())).collect();
                variables.push(Variable { name: name.to_string(), kind, values, line: line_no });
            }
            Keyword::Lambda => derived.push(DerivedExpression {
                name: name.to_string(),
                expression: rhs.to_string(),
                line: line_no,
            }),
        }
    }

    let Some(template_line) = template_line else {
        return Err(DirectiveError::MissingTemplate { file });
    };
    let template: String = lines.map(|(_, l)| l).collect();

    debug!(
        file = %file,
        variables = variables.len(),
        derived = derived.len(),
        "parsed source header"
    );

    Ok(CrankSource { path: path.to_path_buf(), variables, derived, template, template_line })
}

/// Keyword at the very start of the line, followed by whitespace or `=`.
fn classify(line: &str) -> Option<Keyword> {
    const KEYWORDS: [Keyword; 3] = [
        Keyword::Var(VariableKind::Typed),
        Keyword::Var(VariableKind::StringForced),
        Keyword::Lambda,
    ];
    KEYWORDS.into_iter().find(|kw| {
        line.strip_prefix(kw.text())
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_whitespace() || c == '=')
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Interpret one comma-separated item of a variable's value list.
pub fn parse_value(kind: VariableKind, raw: &str) -> Value {
    match kind {
        VariableKind::StringForced => Value::Str(Value::quoted(raw)),
        VariableKind::Typed => {
            if let Ok(i) = raw.parse::<i64>() {
                Value::Int(i)
            } else if let Ok(f) = raw.parse::<f64>() {
                Value::Float(f)
            } else {
                Value::Str(raw.to_string())
            }
        }
    }
}
