//! Per-employee payroll aggregation.
//!
//! This module combines the dependency resolver, the component evaluator,
//! loss-of-pay proration, and statutory deduction rules into one employee
//! line, and rolls lines up into pay-run totals. `compute_employee_line` is
//! pure given its inputs: calling it twice with identical inputs produces
//! identical output, which is what makes recalculation safe.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use uuid::Uuid;

use crate::config::StatutoryConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceReport, CTC_CODE, CalculationKind, ComponentType, EmployeeComponentAssignment,
    EmployeeProfile, PayPeriod, PayRunEmployeeLine, PayRunTotals, SalaryComponentDefinition,
};

use super::evaluator::{EvaluationInputs, evaluate};
use super::formula::FormulaAst;
use super::{resolve_order, round_money};

/// A read-only snapshot of the salary structure for one calculation batch.
///
/// The component catalog is read-only during a calculate run; taking a
/// snapshot up front lets per-employee work proceed concurrently without
/// touching shared mutable state.
#[derive(Debug, Clone)]
pub struct StructureSnapshot {
    /// All active component definitions.
    pub components: Vec<SalaryComponentDefinition>,
    /// Active assignments grouped by employee id.
    pub assignments: HashMap<String, Vec<EmployeeComponentAssignment>>,
}

impl StructureSnapshot {
    fn component_by_id(&self, id: Uuid) -> Option<&SalaryComponentDefinition> {
        self.components.iter().find(|c| c.id == id)
    }

    fn component_by_code(&self, code: &str) -> Option<&SalaryComponentDefinition> {
        self.components.iter().find(|c| c.code == code)
    }
}

/// Caches evaluation orders per distinct component set.
///
/// Employees of one organization usually share a component set; caching the
/// topological order avoids re-deriving it for every employee in a batch.
#[derive(Debug, Default)]
pub struct OrderCache {
    inner: Mutex<HashMap<Vec<Uuid>, Vec<usize>>>,
}

impl OrderCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the evaluation order for `components`, which must be in
    /// canonical (sorted-by-id) order so that cached indices stay valid.
    fn order_for(&self, components: &[SalaryComponentDefinition]) -> EngineResult<Vec<usize>> {
        let key: Vec<Uuid> = components.iter().map(|c| c.id).collect();

        if let Ok(cache) = self.inner.lock() {
            if let Some(order) = cache.get(&key) {
                return Ok(order.clone());
            }
        }

        let order = resolve_order(components)?;
        if let Ok(mut cache) = self.inner.lock() {
            cache.insert(key, order.clone());
        }
        Ok(order)
    }
}

/// Computes the payroll line for one employee in one pay period.
///
/// Steps: gather active assignments effective on or before the period end,
/// close over their dependencies, resolve the evaluation order, evaluate
/// every component, then aggregate gross, loss of pay, statutory
/// deductions, and net salary.
///
/// # Errors
///
/// Any [`EngineError`] from resolution or evaluation is returned to the
/// caller; the pay-run layer records it against the employee's line rather
/// than aborting the batch.
pub fn compute_employee_line(
    employee: &EmployeeProfile,
    period: &PayPeriod,
    snapshot: &StructureSnapshot,
    attendance: &AttendanceReport,
    statutory: &StatutoryConfig,
    cache: &OrderCache,
) -> EngineResult<PayRunEmployeeLine> {
    let assignments = effective_assignments(employee, period, snapshot);
    let scope = dependency_closure(&assignments, snapshot)?;

    let order = cache.order_for(&scope)?;
    let inputs = EvaluationInputs {
        employee_id: employee.id.clone(),
        monthly_ctc: employee.monthly_ctc,
        assignments: assignments
            .iter()
            .map(|a| (a.component_id, (*a).clone()))
            .collect(),
    };
    let resolved = evaluate(&scope, &order, &inputs)?;

    let amounts: HashMap<String, Decimal> = resolved
        .iter()
        .map(|r| (r.component_code.clone(), r.amount))
        .collect();

    let gross_salary: Decimal = resolved
        .iter()
        .filter(|r| r.component_type == ComponentType::Earning)
        .map(|r| r.amount)
        .sum();

    let lop_deduction = loss_of_pay(employee, gross_salary, attendance)?;
    let post_lop_gross = gross_salary - lop_deduction;

    let deductions = super::compute_statutory(statutory, post_lop_gross, &amounts);

    let component_deductions: Decimal = resolved
        .iter()
        .filter(|r| r.component_type == ComponentType::Deduction)
        .map(|r| r.amount)
        .sum();

    let total_deductions = component_deductions + deductions.total();
    let net_salary = gross_salary - lop_deduction - total_deductions;

    Ok(PayRunEmployeeLine {
        employee_id: employee.id.clone(),
        gross_salary,
        lop_deduction,
        pf_employee: deductions.pf_employee,
        esi_employee: deductions.esi_employee,
        professional_tax: deductions.professional_tax,
        total_deductions,
        net_salary,
        components: resolved,
        error: None,
    })
}

/// Rolls per-employee lines into pay-run totals.
///
/// Flagged lines contribute to the employee count but not to the monetary
/// sums.
pub fn compute_totals(lines: &[PayRunEmployeeLine]) -> PayRunTotals {
    let mut totals = PayRunTotals::empty(lines.len());
    for line in lines.iter().filter(|l| !l.is_flagged()) {
        totals.total_gross_pay += line.gross_salary;
        totals.total_deductions += line.total_deductions;
        totals.total_net_pay += line.net_salary;
    }
    totals
}

/// The employee's active assignments effective on or before the period end.
fn effective_assignments<'a>(
    employee: &EmployeeProfile,
    period: &PayPeriod,
    snapshot: &'a StructureSnapshot,
) -> Vec<&'a EmployeeComponentAssignment> {
    snapshot
        .assignments
        .get(&employee.id)
        .map(|assignments| {
            assignments
                .iter()
                .filter(|a| a.is_active && a.effective_from <= period.end_date)
                .collect()
        })
        .unwrap_or_default()
}

/// The dependency closure of the assigned components, in canonical
/// (sorted-by-id) order for cache stability.
fn dependency_closure(
    assignments: &[&EmployeeComponentAssignment],
    snapshot: &StructureSnapshot,
) -> EngineResult<Vec<SalaryComponentDefinition>> {
    let mut seen: HashSet<Uuid> = HashSet::new();
    let mut pending: Vec<Uuid> = assignments.iter().map(|a| a.component_id).collect();

    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let component =
            snapshot
                .component_by_id(id)
                .ok_or_else(|| EngineError::UnresolvedReference {
                    code: id.to_string(),
                    referenced_by: "assignment".to_string(),
                })?;

        match &component.calculation {
            CalculationKind::Fixed => {}
            CalculationKind::Percentage { base_component_id } => {
                pending.push(*base_component_id);
            }
            CalculationKind::Formula { expression } => {
                let ast = FormulaAst::parse(expression).map_err(|e| EngineError::Evaluation {
                    component: component.code.clone(),
                    message: e.to_string(),
                })?;
                for var in ast.variables() {
                    if var == CTC_CODE {
                        continue;
                    }
                    let referenced = snapshot.component_by_code(&var).ok_or_else(|| {
                        EngineError::UnresolvedReference {
                            code: var.clone(),
                            referenced_by: component.code.clone(),
                        }
                    })?;
                    pending.push(referenced.id);
                }
            }
        }
    }

    let mut scope: Vec<SalaryComponentDefinition> = snapshot
        .components
        .iter()
        .filter(|c| seen.contains(&c.id))
        .cloned()
        .collect();
    scope.sort_by_key(|c| c.id);
    Ok(scope)
}

/// The loss-of-pay deduction: gross pro-rated by paid days over working
/// days; the deduction is the difference between the unprorated and
/// prorated gross.
fn loss_of_pay(
    employee: &EmployeeProfile,
    gross_salary: Decimal,
    attendance: &AttendanceReport,
) -> EngineResult<Decimal> {
    if attendance.working_days <= Decimal::ZERO {
        return Err(EngineError::Validation {
            field: "working_days".to_string(),
            message: "must be positive".to_string(),
        });
    }

    let paid = attendance
        .paid_days_for(&employee.id)
        .clamp(Decimal::ZERO, attendance.working_days);
    let prorated = round_money(gross_salary * paid / attendance.working_days);
    Ok(gross_salary - prorated)
}
