//! Component dependency ordering.
//!
//! Builds the reference graph of a salary structure as an explicit
//! adjacency structure and topologically sorts it, so that every component
//! is evaluated after the components it references. Cycles and unresolvable
//! references are detected here, which makes this routine the single
//! definition-error gate for both save-time validation and resolution.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};
use crate::models::{Component, SalaryStructure, ValueType, is_reserved_symbol};

use super::formula::referenced_symbols;

/// Returns the component codes a component depends on. Reserved context
/// symbols (CTC, PRESENT_RATIO) are roots, not dependencies, and are
/// filtered out.
///
/// # Errors
///
/// Returns `FormulaEvaluation` if a formula expression does not parse.
pub fn component_references(component: &Component) -> EngineResult<Vec<String>> {
    let symbols = match &component.value {
        ValueType::Fixed { .. } => Vec::new(),
        ValueType::PercentageOf { reference, .. } => vec![reference.clone()],
        ValueType::Formula { expression } => referenced_symbols(&component.code, expression)?,
    };
    Ok(symbols
        .into_iter()
        .filter(|s| !is_reserved_symbol(s))
        .collect())
}

/// Orders a structure's components so that references come before their
/// dependents.
///
/// Uses Kahn's algorithm with a sequence-ordered ready set: among the
/// components whose dependencies are all satisfied, the one with the lowest
/// `(sequence, declaration index)` is emitted next. The output is therefore
/// deterministic and independent of declaration order for the same
/// dependency graph.
///
/// # Errors
///
/// - `UnresolvedReference` if a component references a symbol that is
///   neither another component nor a reserved context symbol.
/// - `CyclicStructure` if the reference graph has a cycle; the error names
///   the cycle path.
/// - `FormulaEvaluation` if a formula expression does not parse.
pub fn dependency_order(structure: &SalaryStructure) -> EngineResult<Vec<&Component>> {
    let components = &structure.components;
    let index_by_code: HashMap<&str, usize> = components
        .iter()
        .enumerate()
        .map(|(i, c)| (c.code.as_str(), i))
        .collect();

    // dependencies[i] = indices component i references
    let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(components.len());
    for component in components {
        let mut deps = Vec::new();
        for reference in component_references(component)? {
            match index_by_code.get(reference.as_str()) {
                Some(&idx) => deps.push(idx),
                None => {
                    return Err(EngineError::UnresolvedReference {
                        component: component.code.clone(),
                        reference,
                    });
                }
            }
        }
        dependencies.push(deps);
    }

    let mut indegree: Vec<usize> = dependencies.iter().map(|d| d.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
    for (i, deps) in dependencies.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(i);
        }
    }

    let mut emitted = vec![false; components.len()];
    let mut order = Vec::with_capacity(components.len());

    while order.len() < components.len() {
        // Pick the ready component with the lowest (sequence, index).
        let next = (0..components.len())
            .filter(|&i| !emitted[i] && indegree[i] == 0)
            .min_by_key(|&i| (components[i].sequence, i));

        let Some(next) = next else {
            // Nothing is ready but components remain: there is a cycle.
            let remaining: Vec<usize> = (0..components.len()).filter(|&i| !emitted[i]).collect();
            return Err(EngineError::CyclicStructure {
                structure: structure.code.clone(),
                cycle: find_cycle(components, &dependencies, &remaining),
            });
        };

        emitted[next] = true;
        order.push(&components[next]);
        for &dependent in &dependents[next] {
            indegree[dependent] -= 1;
        }
    }

    Ok(order)
}

/// Walks references among the remaining nodes until one repeats, producing
/// a readable cycle path such as `A -> B -> A`.
fn find_cycle(
    components: &[Component],
    dependencies: &[Vec<usize>],
    remaining: &[usize],
) -> Vec<String> {
    let mut path: Vec<usize> = Vec::new();
    let mut current = remaining[0];

    loop {
        if let Some(pos) = path.iter().position(|&i| i == current) {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&i| components[i].code.clone())
                .collect();
            cycle.push(components[current].code.clone());
            return cycle;
        }
        path.push(current);
        // Every remaining node has at least one remaining dependency.
        current = dependencies[current]
            .iter()
            .copied()
            .find(|i| remaining.contains(i))
            .unwrap_or(current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComponentKind;
    use rust_decimal::Decimal;

    fn component(code: &str, sequence: u32, value: ValueType) -> Component {
        Component {
            code: code.to_string(),
            label: code.to_string(),
            kind: ComponentKind::Earning,
            value,
            taxable: true,
            prorated: true,
            sequence,
        }
    }

    fn pct_of(reference: &str, percent: i64) -> ValueType {
        ValueType::PercentageOf {
            reference: reference.to_string(),
            percent: Decimal::from(percent),
        }
    }

    fn formula(expression: &str) -> ValueType {
        ValueType::Formula {
            expression: expression.to_string(),
        }
    }

    fn structure(components: Vec<Component>) -> SalaryStructure {
        SalaryStructure {
            code: "STD".to_string(),
            version: 1,
            is_active: true,
            components,
        }
    }

    fn order_codes(structure: &SalaryStructure) -> Vec<String> {
        dependency_order(structure)
            .unwrap()
            .iter()
            .map(|c| c.code.clone())
            .collect()
    }

    /// DO-001: references come before dependents
    #[test]
    fn test_references_before_dependents() {
        let s = structure(vec![
            component("HRA", 2, pct_of("BASIC", 50)),
            component("BASIC", 1, pct_of("CTC", 40)),
        ]);

        assert_eq!(order_codes(&s), vec!["BASIC", "HRA"]);
    }

    /// DO-002: declaration order does not matter
    #[test]
    fn test_declaration_order_independent() {
        let forward = structure(vec![
            component("BASIC", 1, pct_of("CTC", 40)),
            component("HRA", 2, pct_of("BASIC", 50)),
            component("PF", 3, formula("min(BASIC, 15000) * 0.12")),
        ]);
        let reversed = structure(vec![
            component("PF", 3, formula("min(BASIC, 15000) * 0.12")),
            component("HRA", 2, pct_of("BASIC", 50)),
            component("BASIC", 1, pct_of("CTC", 40)),
        ]);

        assert_eq!(order_codes(&forward), order_codes(&reversed));
    }

    /// DO-003: ties break by sequence
    #[test]
    fn test_independent_components_ordered_by_sequence() {
        let s = structure(vec![
            component("SPECIAL", 3, formula("CTC - BASIC")),
            component("BASIC", 1, pct_of("CTC", 40)),
            component("CONV", 2, ValueType::Fixed {
                amount: Decimal::from(1600),
            }),
        ]);

        assert_eq!(order_codes(&s), vec!["BASIC", "CONV", "SPECIAL"]);
    }

    /// DO-004: two-node cycle is rejected with its path
    #[test]
    fn test_cycle_rejected() {
        let s = structure(vec![
            component("A", 1, pct_of("B", 50)),
            component("B", 2, pct_of("A", 50)),
        ]);

        match dependency_order(&s).unwrap_err() {
            EngineError::CyclicStructure { structure, cycle } => {
                assert_eq!(structure, "STD");
                assert_eq!(cycle.len(), 3);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("Expected CyclicStructure, got {:?}", other),
        }
    }

    /// DO-005: self-reference is a cycle
    #[test]
    fn test_self_reference_is_a_cycle() {
        let s = structure(vec![component("A", 1, formula("A * 2"))]);

        assert!(matches!(
            dependency_order(&s),
            Err(EngineError::CyclicStructure { .. })
        ));
    }

    /// DO-006: unknown reference is rejected
    #[test]
    fn test_unknown_reference_rejected() {
        let s = structure(vec![component("HRA", 1, pct_of("BASICX", 50))]);

        match dependency_order(&s).unwrap_err() {
            EngineError::UnresolvedReference {
                component,
                reference,
            } => {
                assert_eq!(component, "HRA");
                assert_eq!(reference, "BASICX");
            }
            other => panic!("Expected UnresolvedReference, got {:?}", other),
        }
    }

    /// DO-007: reserved symbols are not dependencies
    #[test]
    fn test_reserved_symbols_are_roots() {
        let c = component("BASIC", 1, formula("CTC * 0.4 * PRESENT_RATIO"));
        assert!(component_references(&c).unwrap().is_empty());
    }

    /// DO-008: cycle through a formula is detected
    #[test]
    fn test_cycle_through_formula() {
        let s = structure(vec![
            component("A", 1, formula("B + 10")),
            component("B", 2, formula("C + 10")),
            component("C", 3, formula("A + 10")),
        ]);

        match dependency_order(&s).unwrap_err() {
            EngineError::CyclicStructure { cycle, .. } => {
                assert_eq!(cycle.len(), 4);
            }
            other => panic!("Expected CyclicStructure, got {:?}", other),
        }
    }
}
