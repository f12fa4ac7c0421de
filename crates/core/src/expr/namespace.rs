use std::collections::HashMap;
use std::fmt;

use super::value::Value;

/// Ordered, append-only set of name bindings for one combination.
///
/// Bindings are kept in insertion order so diagnostics list them the way
/// they were declared. Rebinding a name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Namespace {
    /// Renders as `{name: value, ...}` with strings shown in their literal form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match value {
                Value::Str(s) => write!(f, "{name}: {s:?}")?,
                other => write!(f, "{name}: {other}")?,
            }
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut ns = Namespace::new();
        ns.bind("b", Value::Int(1));
        ns.bind("a", Value::Int(2));
        let names: Vec<_> = ns.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn rebinding_keeps_position() {
        let mut ns = Namespace::new();
        ns.bind("x", Value::Int(1));
        ns.bind("y", Value::Int(2));
        ns.bind("x", Value::Int(3));
        assert_eq!(ns.len(), 2);
        assert_eq!(ns.get("x"), Some(&Value::Int(3)));
        assert_eq!(ns.to_string(), "{x: 3, y: 2}");
    }

    #[test]
    fn display_debug_quotes_strings() {
        let mut ns = Namespace::new();
        ns.bind("a", Value::Str("C".into()));
        ns.bind("n", Value::Int(2));
        assert_eq!(ns.to_string(), "{a: \"C\", n: 2}");
    }
}
