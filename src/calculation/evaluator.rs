//! Component evaluation in dependency order.
//!
//! Given components in resolver order and one employee's inputs, this module
//! turns each definition into a concrete monetary amount. Every amount is
//! rounded to 2 decimal places (midpoint away from zero) at the point of
//! resolution, not only at final aggregation, so repeated evaluations are
//! bit-for-bit reproducible.

use rust_decimal::Decimal;
use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    CTC_CODE, CalculationKind, EmployeeComponentAssignment, ResolvedComponentAmount,
    SalaryComponentDefinition,
};

use super::formula::{FormulaAst, FormulaError};
use super::round_money;

/// One employee's inputs to component evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationInputs {
    /// The employee being evaluated (for error reporting).
    pub employee_id: String,
    /// Monthly cost-to-company, exposed to formulas as `CTC`.
    pub monthly_ctc: Decimal,
    /// Active assignments keyed by component id.
    pub assignments: HashMap<Uuid, EmployeeComponentAssignment>,
}

/// Evaluates components in resolver order into resolved amounts.
///
/// `order` must come from [`resolve_order`](super::resolve_order) over the
/// same `components` slice; the function assumes every dependency of a
/// component is resolved before the component itself.
///
/// Per calculation kind:
/// * Fixed: the assignment value; zero when unassigned and optional, a
///   [`EngineError::MissingAssignment`] when unassigned and statutory.
/// * Percentage: assignment value % of the base component's resolved
///   amount; the base amount is recorded for auditability.
/// * Formula: the expression evaluated over previously resolved amounts
///   plus the reserved `CTC` input. Division by zero and unknown variables
///   are [`EngineError::Evaluation`] carrying the component code, never a
///   silent zero.
pub fn evaluate(
    components: &[SalaryComponentDefinition],
    order: &[usize],
    inputs: &EvaluationInputs,
) -> EngineResult<Vec<ResolvedComponentAmount>> {
    let mut env: HashMap<String, Decimal> = HashMap::with_capacity(order.len() + 1);
    env.insert(CTC_CODE.to_string(), inputs.monthly_ctc);

    let mut resolved = Vec::with_capacity(order.len());

    for &idx in order {
        let component = &components[idx];
        let assignment = inputs.assignments.get(&component.id);

        let (amount, base_amount) = match &component.calculation {
            CalculationKind::Fixed => {
                let value = assignment_value(component, assignment, &inputs.employee_id)?;
                (round_money(value), None)
            }
            CalculationKind::Percentage { base_component_id } => {
                let base_code = components
                    .iter()
                    .find(|c| c.id == *base_component_id)
                    .map(|c| c.code.as_str())
                    .ok_or_else(|| EngineError::UnresolvedReference {
                        code: base_component_id.to_string(),
                        referenced_by: component.code.clone(),
                    })?;
                let base = *env.get(base_code).ok_or_else(|| {
                    EngineError::UnresolvedReference {
                        code: base_code.to_string(),
                        referenced_by: component.code.clone(),
                    }
                })?;
                let percent = assignment_value(component, assignment, &inputs.employee_id)?;
                let amount = round_money(percent / Decimal::from(100) * base);
                (amount, Some(base))
            }
            CalculationKind::Formula { expression } => {
                let ast = FormulaAst::parse(expression).map_err(|e| EngineError::Evaluation {
                    component: component.code.clone(),
                    message: e.to_string(),
                })?;
                let value = ast.evaluate(&env).map_err(|e| match e {
                    FormulaError::UnknownVariable { code } => EngineError::Evaluation {
                        component: component.code.clone(),
                        message: format!("unknown variable '{code}'"),
                    },
                    other => EngineError::Evaluation {
                        component: component.code.clone(),
                        message: other.to_string(),
                    },
                })?;
                (round_money(value), None)
            }
        };

        env.insert(component.code.clone(), amount);
        resolved.push(ResolvedComponentAmount {
            component_code: component.code.clone(),
            amount,
            kind: component.calculation.label().to_string(),
            component_type: component.component_type,
            base_amount,
        });
    }

    Ok(resolved)
}

/// The assignment value for a component, applying the optional/statutory
/// rule for unassigned components.
fn assignment_value(
    component: &SalaryComponentDefinition,
    assignment: Option<&EmployeeComponentAssignment>,
    employee_id: &str,
) -> EngineResult<Decimal> {
    match assignment {
        Some(a) => Ok(a.value),
        None if component.is_statutory => Err(EngineError::MissingAssignment {
            component: component.code.clone(),
            employee_id: employee_id.to_string(),
        }),
        None => Ok(Decimal::ZERO),
    }
}
