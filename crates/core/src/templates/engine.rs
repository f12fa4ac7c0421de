use regex::{Captures, Regex};
use thiserror::Error;

use crate::expr::{Namespace, SpanOutcome, evaluate_span};

/// Opening delimiter of an embedded expression span.
pub const SPAN_OPEN: &str = "{-{";
/// Closing delimiter of an embedded expression span.
pub const SPAN_CLOSE: &str = "}-}";

#[derive(Debug, Error)]
pub enum TemplateRenderError {
    #[error("invalid regex for template placeholder: {0}")]
    Regex(String),

    #[error("placeholder '${name}' is not defined (line {line}, column {column})")]
    UndefinedName { name: String, line: usize, column: usize },

    #[error("invalid placeholder in template (line {line}, column {column})")]
    InvalidPlaceholder { line: usize, column: usize },
}

/// Substitutes `$name` placeholders and resolves `{-{ ... }-}` spans.
///
/// Placeholder syntax:
/// - `$name` and `${name}`, where `name` is `[A-Za-z_][A-Za-z0-9_]*`
/// - `$$` for a literal `$`
///
/// Any other `$` is an error.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    placeholder: Regex,
    span: Regex,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, TemplateRenderError> {
        let placeholder = Regex::new(concat!(
            r"\$(?:(?P<escaped>\$)",
            r"|(?P<named>[_a-zA-Z][_a-zA-Z0-9]*)",
            r"|\{(?P<braced>[_a-zA-Z][_a-zA-Z0-9]*)\})?",
        ))
        .map_err(|e| TemplateRenderError::Regex(e.to_string()))?;
        let span = Regex::new(&format!(
            "(?s){}(.*?){}",
            regex::escape(SPAN_OPEN),
            regex::escape(SPAN_CLOSE)
        ))
        .map_err(|e| TemplateRenderError::Regex(e.to_string()))?;
        Ok(Self { placeholder, span })
    }

    /// Substitute placeholders, then resolve embedded spans.
    pub fn render(&self, template: &str, ns: &Namespace) -> Result<String, TemplateRenderError> {
        self.render_from(template, 1, ns)
    }

    /// Like [`render`](Self::render) for a template whose first line is
    /// line `first_line` of its file; diagnostics use file line numbers.
    pub fn render_from(
        &self,
        template: &str,
        first_line: usize,
        ns: &Namespace,
    ) -> Result<String, TemplateRenderError> {
        let substituted = self.substitute_from(template, first_line, ns)?;
        Ok(self.resolve_spans(&substituted, ns))
    }

    /// Replace every placeholder with the `str()` form of its bound value.
    pub fn substitute(
        &self,
        template: &str,
        ns: &Namespace,
    ) -> Result<String, TemplateRenderError> {
        self.substitute_from(template, 1, ns)
    }

    fn substitute_from(
        &self,
        template: &str,
        first_line: usize,
        ns: &Namespace,
    ) -> Result<String, TemplateRenderError> {
        let locate = |pos| {
            let (line, column) = line_and_column(template, pos);
            (line + first_line - 1, column)
        };
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in self.placeholder.captures_iter(template) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            out.push_str(&template[last..whole.start]);
            last = whole.end;

            if caps.name("escaped").is_some() {
                out.push('$');
                continue;
            }
            let Some(name) = caps.name("named").or_else(|| caps.name("braced")) else {
                let (line, column) = locate(whole.start);
                return Err(TemplateRenderError::InvalidPlaceholder { line, column });
            };
            match ns.get(name.as_str()) {
                Some(value) => out.push_str(&value.to_string()),
                None => {
                    let (line, column) = locate(whole.start);
                    return Err(TemplateRenderError::UndefinedName {
                        name: name.as_str().to_string(),
                        line,
                        column,
                    });
                }
            }
        }

        out.push_str(&template[last..]);
        Ok(out)
    }

    /// Evaluate each embedded span; spans that fail stay exactly as written.
    pub fn resolve_spans(&self, text: &str, ns: &Namespace) -> String {
        self.span
            .replace_all(text, |caps: &Captures<'_>| match evaluate_span(&caps[1], ns) {
                SpanOutcome::Resolved(value) => value,
                SpanOutcome::Unchanged => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// 1-based line and column of byte offset `pos`.
fn line_and_column(text: &str, pos: usize) -> (usize, usize) {
    let before = &text[..pos];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(pos, |nl| pos - nl - 1) + 1;
    (line, column)
}
