//! Cartesian product of variable domains.

use crate::directives::Variable;
use crate::expr::Namespace;

/// One assignment of a concrete value to every variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Combination {
    /// 1-based position in the product.
    pub index: usize,
    /// Variable bindings in declaration order; derived values are added later.
    pub bindings: Namespace,
}

/// Upper bound on the combinations one source may expand to.
pub const MAX_COMBINATIONS: usize = 1_000_000;

/// Number of combinations the variables produce, or `None` past
/// [`MAX_COMBINATIONS`].
///
/// No variables still yields a single, empty combination.
pub fn combination_count(variables: &[Variable]) -> Option<usize> {
    variables
        .iter()
        .try_fold(1usize, |acc, v| acc.checked_mul(v.values.len()))
        .filter(|&count| count <= MAX_COMBINATIONS)
}

/// Enumerate every combination, the last-declared variable varying fastest.
pub fn combinations(variables: &[Variable]) -> Vec<Combination> {
    let count = combination_count(variables).unwrap_or(0);
    let mut out = Vec::with_capacity(count);

    for ordinal in 0..count {
        // Decode `ordinal` as a mixed-radix number, least significant digit last.
        let mut rest = ordinal;
        let mut picks = vec![0usize; variables.len()];
        for (slot, var) in variables.iter().enumerate().rev() {
            let radix = var.values.len();
            picks[slot] = rest % radix;
            rest /= radix;
        }

        let mut bindings = Namespace::new();
        for (var, pick) in variables.iter().zip(picks) {
            bindings.bind(var.name.clone(), var.values[pick].clone());
        }
        out.push(Combination { index: ordinal + 1, bindings });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::VariableKind;
    use crate::expr::Value;

    fn var(name: &str, values: &[i64]) -> Variable {
        Variable {
            name: name.into(),
            kind: VariableKind::Typed,
            values: values.iter().map(|&v| Value::Int(v)).collect(),
            line: 1,
        }
    }

    fn pairs(combos: &[Combination]) -> Vec<Vec<i64>> {
        combos
            .iter()
            .map(|c| {
                c.bindings
                    .iter()
                    .map(|(_, v)| match v {
                        Value::Int(i) => *i,
                        other => panic!("unexpected {other:?}"),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn last_variable_varies_fastest() {
        let combos = combinations(&[var("a", &[1, 2]), var("b", &[10, 20, 30])]);
        assert_eq!(
            pairs(&combos),
            vec![
                vec![1, 10],
                vec![1, 20],
                vec![1, 30],
                vec![2, 10],
                vec![2, 20],
                vec![2, 30]
            ]
        );
        assert_eq!(combos.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn count_is_product_of_domain_sizes() {
        let vars = [var("a", &[1, 2, 3]), var("b", &[1, 2]), var("c", &[1, 2, 3, 4])];
        assert_eq!(combination_count(&vars), Some(24));
        assert_eq!(combinations(&vars).len(), 24);
    }

    #[test]
    fn huge_products_are_refused() {
        let digits: Vec<i64> = (0..10).collect();
        let vars: Vec<Variable> = (0..18).map(|i| var(&format!("v{i}"), &digits)).collect();
        assert_eq!(combination_count(&vars), None);
        assert!(combinations(&vars).is_empty());

        let vars: Vec<Variable> = (0..6).map(|i| var(&format!("v{i}"), &digits)).collect();
        assert_eq!(combination_count(&vars), Some(MAX_COMBINATIONS));
    }

    #[test]
    fn no_variables_yield_one_empty_combination() {
        let combos = combinations(&[]);
        assert_eq!(combos.len(), 1);
        assert!(combos[0].bindings.is_empty());
    }
}
