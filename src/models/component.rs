//! Salary component definitions and per-employee assignments.
//!
//! A [`SalaryComponentDefinition`] is an organization-level template that
//! describes *how* a component's amount is calculated; an
//! [`EmployeeComponentAssignment`] carries the numeric input (fixed amount or
//! percentage) for one employee. Definitions never hold monetary values.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved variable name for the employee's monthly cost-to-company.
///
/// Formulas may reference `CTC` as a free variable; it is supplied by the
/// employee directory, not defined in the catalog, so the code is rejected
/// as a component code.
pub const CTC_CODE: &str = "CTC";

/// Whether a component adds to or subtracts from an employee's pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// The component contributes to gross salary.
    Earning,
    /// The component is withheld from net salary.
    Deduction,
}

/// How a component's monetary amount is derived.
///
/// The variant payload carries the reference data the dependency resolver
/// needs: a percentage points at its base component, a formula carries the
/// expression string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CalculationKind {
    /// Amount is taken directly from the employee's assignment value.
    Fixed,
    /// Amount is the assignment value (a percentage) of another component's
    /// resolved amount.
    Percentage {
        /// The component whose resolved amount is the percentage base.
        base_component_id: Uuid,
    },
    /// Amount is computed from an arithmetic expression over component codes.
    Formula {
        /// Expression over `+ - * / ( )`, numeric literals, and component
        /// codes (plus the reserved `CTC` input) as free variables.
        expression: String,
    },
}

impl CalculationKind {
    /// Returns a short lowercase label for the kind, used in resolved
    /// amounts and API payloads.
    pub fn label(&self) -> &'static str {
        match self {
            CalculationKind::Fixed => "fixed",
            CalculationKind::Percentage { .. } => "percentage",
            CalculationKind::Formula { .. } => "formula",
        }
    }
}

/// An organization-scoped salary component definition.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{ComponentType, CalculationKind, SalaryComponentDefinition};
/// use uuid::Uuid;
///
/// let basic = SalaryComponentDefinition {
///     id: Uuid::new_v4(),
///     code: "BASIC".to_string(),
///     name: "Basic Salary".to_string(),
///     component_type: ComponentType::Earning,
///     calculation: CalculationKind::Fixed,
///     is_taxable: true,
///     is_statutory: false,
///     display_order: 1,
///     is_active: true,
/// };
/// assert!(basic.is_earning());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryComponentDefinition {
    /// Unique identifier for the definition.
    pub id: Uuid,
    /// Unique uppercase code (`[A-Z_]+`) within the organization.
    pub code: String,
    /// Human-readable component name.
    pub name: String,
    /// Whether the component is an earning or a deduction.
    pub component_type: ComponentType,
    /// How the amount is calculated.
    pub calculation: CalculationKind,
    /// Whether the component is subject to income tax.
    pub is_taxable: bool,
    /// Whether the component is statutory (mandatory; a missing assignment
    /// is an evaluation error rather than a zero).
    pub is_statutory: bool,
    /// Sort position used for deterministic evaluation tie-breaks and
    /// payslip display.
    pub display_order: u32,
    /// Soft-delete flag; inactive definitions are invisible to resolution.
    pub is_active: bool,
}

impl SalaryComponentDefinition {
    /// Returns true if this component contributes to gross salary.
    pub fn is_earning(&self) -> bool {
        self.component_type == ComponentType::Earning
    }

    /// Returns true if this component is withheld from net salary.
    pub fn is_deduction(&self) -> bool {
        self.component_type == ComponentType::Deduction
    }
}

/// Links one employee to one component definition with its numeric input.
///
/// The meaning of `value` depends on the calculation kind of the referenced
/// definition: the fixed amount for [`CalculationKind::Fixed`], the
/// percentage for [`CalculationKind::Percentage`]. Formula components carry
/// no input and need no assignment to evaluate; an assignment merely places
/// the component in the employee's structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeComponentAssignment {
    /// The employee this assignment belongs to.
    pub employee_id: String,
    /// The component definition being assigned.
    pub component_id: Uuid,
    /// Fixed amount or percentage, per the definition's calculation kind.
    pub value: Decimal,
    /// The date from which the assignment applies.
    pub effective_from: NaiveDate,
    /// Whether the assignment currently applies. At most one active
    /// assignment exists per (employee, component).
    pub is_active: bool,
    /// Permits percentage values above 100 (e.g. bonus multipliers).
    #[serde(default)]
    pub allow_over_hundred: bool,
    /// Optional free-text remarks from the salary-editing workflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// The concrete monetary value of one component for one employee in one
/// pay period, after dependency evaluation.
///
/// Derived data: produced by the evaluator, embedded in pay-run lines,
/// never persisted independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedComponentAmount {
    /// The component code.
    pub component_code: String,
    /// The resolved monetary amount, rounded to 2 decimal places.
    pub amount: Decimal,
    /// The calculation kind that produced the amount
    /// ("fixed", "percentage", or "formula").
    pub kind: String,
    /// Whether the component is an earning or a deduction.
    pub component_type: ComponentType,
    /// For percentage components, the base amount the percentage was taken
    /// of; recorded for auditability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<Decimal>,
}
