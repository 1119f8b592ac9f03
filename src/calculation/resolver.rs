//! Dependency resolution between salary components.
//!
//! A percentage component depends on its base component; a formula component
//! depends on every component its expression references. This module builds
//! that graph over an arena of definitions (index-based edges, no object
//! references) and produces a deterministic topological evaluation order.
//! The ordering guarantee is load-bearing: by the time the evaluator
//! processes a component, every component it depends on has already been
//! resolved.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{CTC_CODE, CalculationKind, SalaryComponentDefinition};

use super::formula::FormulaAst;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    OnStack,
    Done,
}

/// Computes a deterministic evaluation order for a set of components.
///
/// Returns indices into `components` such that every component's
/// dependencies appear before it. Components unordered relative to each
/// other are tie-broken by ascending (`display_order`, `code`), so the
/// output is reproducible across runs.
///
/// # Errors
///
/// * [`EngineError::Cycle`] when the graph contains a cycle; the path names
///   every component on the cycle, with the starting component repeated.
/// * [`EngineError::UnresolvedReference`] when a percentage base or formula
///   variable is not in the set (the reserved `CTC` input is exempt).
/// * [`EngineError::Evaluation`] when a formula expression fails to parse.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::resolve_order;
/// # use payroll_engine::models::{CalculationKind, ComponentType, SalaryComponentDefinition};
/// # use uuid::Uuid;
/// # let basic_id = Uuid::new_v4();
/// # let basic = SalaryComponentDefinition {
/// #     id: basic_id, code: "BASIC".into(), name: "Basic".into(),
/// #     component_type: ComponentType::Earning, calculation: CalculationKind::Fixed,
/// #     is_taxable: true, is_statutory: false, display_order: 1, is_active: true,
/// # };
/// # let hra = SalaryComponentDefinition {
/// #     id: Uuid::new_v4(), code: "HRA".into(), name: "HRA".into(),
/// #     component_type: ComponentType::Earning,
/// #     calculation: CalculationKind::Percentage { base_component_id: basic_id },
/// #     is_taxable: true, is_statutory: false, display_order: 2, is_active: true,
/// # };
/// let components = vec![hra, basic];
/// let order = resolve_order(&components).unwrap();
/// // BASIC (index 1) must be evaluated before HRA (index 0)
/// assert_eq!(order, vec![1, 0]);
/// ```
pub fn resolve_order(components: &[SalaryComponentDefinition]) -> EngineResult<Vec<usize>> {
    let by_id: HashMap<Uuid, usize> = components
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.id, idx))
        .collect();
    let by_code: HashMap<&str, usize> = components
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.code.as_str(), idx))
        .collect();

    // Adjacency: adj[i] holds the components i depends on.
    let mut adj: Vec<Vec<usize>> = Vec::with_capacity(components.len());
    for component in components {
        let mut deps = dependency_indices(component, &by_id, &by_code)?;
        deps.sort_by(|&a, &b| sort_key(&components[a]).cmp(&sort_key(&components[b])));
        deps.dedup();
        adj.push(deps);
    }

    // Roots visited in (display_order, code) order for determinism.
    let mut roots: Vec<usize> = (0..components.len()).collect();
    roots.sort_by(|&a, &b| sort_key(&components[a]).cmp(&sort_key(&components[b])));

    let mut state = vec![VisitState::Unvisited; components.len()];
    let mut stack: Vec<usize> = Vec::new();
    let mut order: Vec<usize> = Vec::with_capacity(components.len());

    for root in roots {
        visit(root, components, &adj, &mut state, &mut stack, &mut order)?;
    }

    Ok(order)
}

fn sort_key(component: &SalaryComponentDefinition) -> (u32, &str) {
    (component.display_order, component.code.as_str())
}

/// Returns the indices of the components `component` depends on.
fn dependency_indices(
    component: &SalaryComponentDefinition,
    by_id: &HashMap<Uuid, usize>,
    by_code: &HashMap<&str, usize>,
) -> EngineResult<Vec<usize>> {
    match &component.calculation {
        CalculationKind::Fixed => Ok(Vec::new()),
        CalculationKind::Percentage { base_component_id } => {
            let idx = by_id.get(base_component_id).copied().ok_or_else(|| {
                EngineError::UnresolvedReference {
                    code: base_component_id.to_string(),
                    referenced_by: component.code.clone(),
                }
            })?;
            Ok(vec![idx])
        }
        CalculationKind::Formula { expression } => {
            let ast =
                FormulaAst::parse(expression).map_err(|e| EngineError::Evaluation {
                    component: component.code.clone(),
                    message: e.to_string(),
                })?;

            let mut deps = Vec::new();
            for var in ast.variables() {
                if var == CTC_CODE {
                    continue;
                }
                let idx = by_code.get(var.as_str()).copied().ok_or_else(|| {
                    EngineError::UnresolvedReference {
                        code: var.clone(),
                        referenced_by: component.code.clone(),
                    }
                })?;
                deps.push(idx);
            }
            Ok(deps)
        }
    }
}

fn visit(
    node: usize,
    components: &[SalaryComponentDefinition],
    adj: &[Vec<usize>],
    state: &mut [VisitState],
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> EngineResult<()> {
    match state[node] {
        VisitState::Done => return Ok(()),
        VisitState::OnStack => {
            // Revisited while still on the active stack: report the full
            // cycle path for diagnostics.
            let start = stack
                .iter()
                .position(|&n| n == node)
                .unwrap_or(0);
            let mut path: Vec<String> = stack[start..]
                .iter()
                .map(|&n| components[n].code.clone())
                .collect();
            path.push(components[node].code.clone());
            return Err(EngineError::Cycle { path });
        }
        VisitState::Unvisited => {}
    }

    state[node] = VisitState::OnStack;
    stack.push(node);

    for &dep in &adj[node] {
        visit(dep, components, adj, state, stack, order)?;
    }

    stack.pop();
    state[node] = VisitState::Done;
    order.push(node);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ComponentType;

    fn fixed(code: &str, display_order: u32) -> SalaryComponentDefinition {
        SalaryComponentDefinition {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: code.to_string(),
            component_type: ComponentType::Earning,
            calculation: CalculationKind::Fixed,
            is_taxable: true,
            is_statutory: false,
            display_order,
            is_active: true,
        }
    }

    fn percentage(code: &str, base: &SalaryComponentDefinition, display_order: u32) -> SalaryComponentDefinition {
        SalaryComponentDefinition {
            calculation: CalculationKind::Percentage {
                base_component_id: base.id,
            },
            ..fixed(code, display_order)
        }
    }

    fn formula(code: &str, expression: &str, display_order: u32) -> SalaryComponentDefinition {
        SalaryComponentDefinition {
            calculation: CalculationKind::Formula {
                expression: expression.to_string(),
            },
            ..fixed(code, display_order)
        }
    }

    fn assert_dependencies_precede(
        components: &[SalaryComponentDefinition],
        order: &[usize],
    ) {
        let position: HashMap<usize, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, &idx)| (idx, pos))
            .collect();
        let by_id: HashMap<Uuid, usize> = components
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.id, idx))
            .collect();
        let by_code: HashMap<&str, usize> = components
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.code.as_str(), idx))
            .collect();

        for (idx, component) in components.iter().enumerate() {
            for dep in dependency_indices(component, &by_id, &by_code).unwrap() {
                assert!(
                    position[&dep] < position[&idx],
                    "{} must be evaluated before {}",
                    components[dep].code,
                    component.code
                );
            }
        }
    }

    #[test]
    fn test_fixed_components_resolve_in_display_order() {
        let components = vec![fixed("CONVEYANCE", 3), fixed("BASIC", 1), fixed("HRA", 2)];
        let order = resolve_order(&components).unwrap();
        let codes: Vec<&str> = order.iter().map(|&i| components[i].code.as_str()).collect();
        assert_eq!(codes, vec!["BASIC", "HRA", "CONVEYANCE"]);
    }

    #[test]
    fn test_display_order_ties_broken_by_code() {
        let components = vec![fixed("ZETA", 1), fixed("ALPHA", 1)];
        let order = resolve_order(&components).unwrap();
        let codes: Vec<&str> = order.iter().map(|&i| components[i].code.as_str()).collect();
        assert_eq!(codes, vec!["ALPHA", "ZETA"]);
    }

    #[test]
    fn test_percentage_base_precedes_dependent() {
        let basic = fixed("BASIC", 2);
        let hra = percentage("HRA", &basic, 1);
        // HRA sorts first by display order but BASIC must still come first.
        let components = vec![hra, basic];
        let order = resolve_order(&components).unwrap();
        let codes: Vec<&str> = order.iter().map(|&i| components[i].code.as_str()).collect();
        assert_eq!(codes, vec!["BASIC", "HRA"]);
    }

    #[test]
    fn test_formula_chain_resolves_dependencies_first() {
        let basic = fixed("BASIC", 1);
        let hra = percentage("HRA", &basic, 2);
        let bonus = formula("BONUS", "BASIC * 0.1 + HRA * 0.05", 3);
        let components = vec![bonus, hra, basic];

        let order = resolve_order(&components).unwrap();
        assert_dependencies_precede(&components, &order);
        let codes: Vec<&str> = order.iter().map(|&i| components[i].code.as_str()).collect();
        assert_eq!(codes, vec!["BASIC", "HRA", "BONUS"]);
    }

    #[test]
    fn test_ctc_reference_is_not_an_edge() {
        let basic = formula("BASIC", "CTC * 0.4", 1);
        let order = resolve_order(&[basic]).unwrap();
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn test_two_node_cycle_reports_full_path() {
        let mut a = fixed("ALLOW_A", 1);
        let mut b = fixed("ALLOW_B", 2);
        a.calculation = CalculationKind::Percentage {
            base_component_id: b.id,
        };
        b.calculation = CalculationKind::Percentage {
            base_component_id: a.id,
        };

        match resolve_order(&[a, b]).unwrap_err() {
            EngineError::Cycle { path } => {
                assert_eq!(path.len(), 3);
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"ALLOW_A".to_string()));
                assert!(path.contains(&"ALLOW_B".to_string()));
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut a = fixed("SELF", 1);
        a.calculation = CalculationKind::Percentage {
            base_component_id: a.id,
        };

        match resolve_order(&[a]).unwrap_err() {
            EngineError::Cycle { path } => {
                assert_eq!(path, vec!["SELF".to_string(), "SELF".to_string()]);
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_three_node_formula_cycle_names_every_node() {
        let a = formula("A_COMP", "B_COMP + 1", 1);
        let b = formula("B_COMP", "C_COMP + 1", 2);
        let c = formula("C_COMP", "A_COMP + 1", 3);

        match resolve_order(&[a, b, c]).unwrap_err() {
            EngineError::Cycle { path } => {
                for code in ["A_COMP", "B_COMP", "C_COMP"] {
                    assert!(path.contains(&code.to_string()), "missing {code} in {path:?}");
                }
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_formula_reference() {
        let bonus = formula("BONUS", "MISSING * 2", 1);
        match resolve_order(&[bonus]).unwrap_err() {
            EngineError::UnresolvedReference {
                code,
                referenced_by,
            } => {
                assert_eq!(code, "MISSING");
                assert_eq!(referenced_by, "BONUS");
            }
            other => panic!("expected UnresolvedReference, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_percentage_base() {
        let basic = fixed("BASIC", 1);
        let hra = percentage("HRA", &basic, 2);
        // BASIC left out of the set.
        match resolve_order(&[hra]).unwrap_err() {
            EngineError::UnresolvedReference { referenced_by, .. } => {
                assert_eq!(referenced_by, "HRA");
            }
            other => panic!("expected UnresolvedReference, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_formula_is_evaluation_error() {
        let bonus = formula("BONUS", "BASIC +", 1);
        match resolve_order(&[bonus]).unwrap_err() {
            EngineError::Evaluation { component, .. } => assert_eq!(component, "BONUS"),
            other => panic!("expected Evaluation, got {other:?}"),
        }
    }

    #[test]
    fn test_order_is_reproducible_across_runs() {
        let basic = fixed("BASIC", 1);
        let hra = percentage("HRA", &basic, 2);
        let conveyance = fixed("CONVEYANCE", 2);
        let bonus = formula("BONUS", "BASIC * 0.1 + HRA * 0.05", 4);
        let components = vec![bonus, conveyance, hra, basic];

        let first = resolve_order(&components).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve_order(&components).unwrap(), first);
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Builds an acyclic component set: each component may only
        /// reference components at lower indices, via a formula summing a
        /// subset of their codes.
        fn acyclic_components(
            edge_choices: Vec<Vec<bool>>,
        ) -> Vec<SalaryComponentDefinition> {
            let mut components: Vec<SalaryComponentDefinition> = Vec::new();
            for (i, edges) in edge_choices.iter().enumerate() {
                let code = format!("COMP_{}", (b'A' + (i as u8 % 26)) as char)
                    .repeat(1 + i / 26);
                let deps: Vec<String> = edges
                    .iter()
                    .enumerate()
                    .filter(|&(j, &on)| on && j < i)
                    .map(|(j, _)| components[j].code.clone())
                    .collect();
                let component = if deps.is_empty() {
                    fixed(&code, i as u32)
                } else {
                    formula(&code, &deps.join(" + "), i as u32)
                };
                components.push(component);
            }
            components
        }

        proptest! {
            #[test]
            fn resolve_order_terminates_with_dependencies_first(
                edge_choices in prop::collection::vec(
                    prop::collection::vec(any::<bool>(), 0..12),
                    1..12,
                )
            ) {
                let components = acyclic_components(edge_choices);
                let order = resolve_order(&components).unwrap();
                prop_assert_eq!(order.len(), components.len());
                assert_dependencies_precede(&components, &order);
            }

            #[test]
            fn resolve_order_is_deterministic(
                edge_choices in prop::collection::vec(
                    prop::collection::vec(any::<bool>(), 0..10),
                    1..10,
                )
            ) {
                let components = acyclic_components(edge_choices);
                let first = resolve_order(&components).unwrap();
                let second = resolve_order(&components).unwrap();
                prop_assert_eq!(first, second);
            }

            #[test]
            fn injected_cycle_is_always_detected(
                edge_choices in prop::collection::vec(
                    prop::collection::vec(any::<bool>(), 0..8),
                    2..8,
                ),
                cycle_len in 2usize..5,
            ) {
                let mut components = acyclic_components(edge_choices);
                let n = components.len();
                if n < 2 {
                    return Ok(());
                }
                let cycle_len = cycle_len.min(n);
                // Rewire the first cycle_len components into a ring.
                for i in 0..cycle_len {
                    let next = components[(i + 1) % cycle_len].code.clone();
                    components[i].calculation = CalculationKind::Formula {
                        expression: format!("{next} + 1"),
                    };
                }

                match resolve_order(&components) {
                    Err(EngineError::Cycle { path }) => {
                        // Every ring member must be named on the reported path.
                        for i in 0..cycle_len {
                            prop_assert!(path.contains(&components[i].code));
                        }
                        prop_assert_eq!(path.first(), path.last());
                    }
                    other => prop_assert!(false, "expected cycle, got {:?}", other),
                }
            }
        }
    }
}
