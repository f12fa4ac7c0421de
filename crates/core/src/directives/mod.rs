//! Source header directives: `VAR`, `SVAR`, `LAMBDA` and the template sentinel.

pub mod parser;
pub mod types;

pub use parser::{DirectiveError, load_source, parse_source, parse_value};
pub use types::{CrankSource, DerivedExpression, TEMPLATE_SENTINEL, Variable, VariableKind};
