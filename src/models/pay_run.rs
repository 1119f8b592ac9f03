//! Pay run, employee line, totals, and payslip models.
//!
//! The pay-run lifecycle is a small closed state machine: status is a
//! tagged enum and every (status, action) pair goes through one transition
//! table, so illegal transitions are a single lookup and the table is
//! trivially testable exhaustively.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::{EmployeeProfile, PayPeriod, ResolvedComponentAmount};

/// Lifecycle status of a pay run.
///
/// ```text
/// DRAFT -> CALCULATING -> PENDING_APPROVAL -> APPROVED -> PROCESSING -> COMPLETED
///                                 |                                        ^
///                                 +--> (recalculate)                       |
/// DRAFT / PENDING_APPROVAL --> CANCELLED            generate_payslips -----+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayRunStatus {
    /// Initial state; lines empty or stale.
    Draft,
    /// Transient state while the calculation engine is running.
    Calculating,
    /// Lines populated, awaiting human approval. Recalculation is allowed.
    PendingApproval,
    /// Lines frozen; recalculation must fail from here on.
    Approved,
    /// Transient state while payslips are being generated.
    Processing,
    /// Terminal; payslips issuable, line data immutable to calculation.
    Completed,
    /// Early-exit terminal, reachable from Draft or PendingApproval only.
    Cancelled,
}

impl PayRunStatus {
    /// Returns true for states from which no further status transition is
    /// possible (payslip re-issue and deletion remain available).
    pub fn is_terminal(self) -> bool {
        matches!(self, PayRunStatus::Completed | PayRunStatus::Cancelled)
    }

    /// The transition table: returns the status to move to when `action`
    /// is legal from this status, or `None` when it is not.
    ///
    /// Two-phase operations are represented by their entry state:
    /// `Calculate` lands in [`PayRunStatus::Calculating`] and the engine
    /// moves the run to `PendingApproval` when the batch finishes;
    /// `GeneratePayslips` lands in [`PayRunStatus::Processing`] and the
    /// engine moves the run to `Completed` once every slip is issued.
    /// `Delete` removes the run, so the returned status is the current one.
    pub fn next(self, action: PayRunAction) -> Option<PayRunStatus> {
        use PayRunAction::*;
        use PayRunStatus::*;

        match (self, action) {
            (Draft | PendingApproval, Calculate) => Some(Calculating),
            (PendingApproval, Approve) => Some(Approved),
            (Approved, Complete) => Some(Completed),
            (Draft | PendingApproval, Cancel) => Some(Cancelled),
            (Approved | Completed, GeneratePayslips) => Some(Processing),
            (Draft | Cancelled | Completed, Delete) => Some(self),
            _ => None,
        }
    }
}

impl fmt::Display for PayRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayRunStatus::Draft => "draft",
            PayRunStatus::Calculating => "calculating",
            PayRunStatus::PendingApproval => "pending_approval",
            PayRunStatus::Approved => "approved",
            PayRunStatus::Processing => "processing",
            PayRunStatus::Completed => "completed",
            PayRunStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// The operations a caller may attempt on a pay run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayRunAction {
    /// Run or rerun the calculation batch.
    Calculate,
    /// Freeze the lines for payslip generation.
    Approve,
    /// Close out an approved run without issuing payslips here.
    Complete,
    /// Abandon the run before approval.
    Cancel,
    /// Issue (or re-issue) one payslip per employee line.
    GeneratePayslips,
    /// Remove the run entirely.
    Delete,
}

impl fmt::Display for PayRunAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayRunAction::Calculate => "calculate",
            PayRunAction::Approve => "approve",
            PayRunAction::Complete => "complete",
            PayRunAction::Cancel => "cancel",
            PayRunAction::GeneratePayslips => "generate payslips for",
            PayRunAction::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// One employee's computed payroll breakdown within a pay run.
///
/// A line either carries a full breakdown or an `error` message when
/// evaluation failed for that employee; a flagged line blocks approval but
/// never aborts the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRunEmployeeLine {
    /// The employee this line belongs to.
    pub employee_id: String,
    /// Sum of all earning-type resolved amounts, before loss of pay.
    pub gross_salary: Decimal,
    /// Loss-of-pay deduction from proration by paid days.
    pub lop_deduction: Decimal,
    /// Employee provident-fund contribution.
    pub pf_employee: Decimal,
    /// Employee state-insurance contribution.
    pub esi_employee: Decimal,
    /// Professional tax per the configured slabs.
    pub professional_tax: Decimal,
    /// Sum of deduction-type components plus statutory deductions.
    pub total_deductions: Decimal,
    /// `gross_salary - lop_deduction - total_deductions`.
    pub net_salary: Decimal,
    /// The full resolved component breakdown, in evaluation order.
    pub components: Vec<ResolvedComponentAmount>,
    /// Set when evaluation failed for this employee; blocks approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PayRunEmployeeLine {
    /// Builds a line recording an evaluation failure for one employee.
    pub fn flagged(employee_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            gross_salary: Decimal::ZERO,
            lop_deduction: Decimal::ZERO,
            pf_employee: Decimal::ZERO,
            esi_employee: Decimal::ZERO,
            professional_tax: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            net_salary: Decimal::ZERO,
            components: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Returns true if this line is flagged in error.
    pub fn is_flagged(&self) -> bool {
        self.error.is_some()
    }
}

/// Aggregate totals over a pay run's current lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRunTotals {
    /// The number of employees in scope for the run.
    pub employee_count: usize,
    /// Sum of gross salaries over non-flagged lines.
    pub total_gross_pay: Decimal,
    /// Sum of total deductions (including LOP) over non-flagged lines.
    pub total_deductions: Decimal,
    /// Sum of net salaries over non-flagged lines.
    pub total_net_pay: Decimal,
}

impl PayRunTotals {
    /// Totals for a run that has not been calculated yet.
    pub fn empty(employee_count: usize) -> Self {
        Self {
            employee_count,
            total_gross_pay: Decimal::ZERO,
            total_deductions: Decimal::ZERO,
            total_net_pay: Decimal::ZERO,
        }
    }
}

/// A batch payroll-processing unit for one period.
///
/// The employee set is snapshotted at creation time; later directory
/// changes do not alter an existing run's scope. Lines are overwritten,
/// never appended, on each calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayRun {
    /// Unique identifier for the run.
    pub id: Uuid,
    /// Human-facing sequential number (e.g. "PR-0003").
    pub pay_run_number: String,
    /// The period this run covers.
    pub pay_period: PayPeriod,
    /// Current lifecycle status.
    pub status: PayRunStatus,
    /// The employee set snapshotted at creation.
    pub employees: Vec<EmployeeProfile>,
    /// Per-employee breakdown rows, replaced on each calculation.
    pub lines: Vec<PayRunEmployeeLine>,
    /// Aggregate totals over the current lines.
    pub totals: PayRunTotals,
    /// When the run was created.
    pub created_at: DateTime<Utc>,
    /// When the last calculation finished.
    pub calculated_at: Option<DateTime<Utc>>,
    /// When the run was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the run was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the run was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl PayRun {
    /// Creates a new draft run over a snapshot of employees.
    pub fn new(
        pay_run_number: String,
        pay_period: PayPeriod,
        employees: Vec<EmployeeProfile>,
    ) -> Self {
        let employee_count = employees.len();
        Self {
            id: Uuid::new_v4(),
            pay_run_number,
            pay_period,
            status: PayRunStatus::Draft,
            employees,
            lines: Vec::new(),
            totals: PayRunTotals::empty(employee_count),
            created_at: Utc::now(),
            calculated_at: None,
            approved_at: None,
            completed_at: None,
            cancelled_at: None,
        }
    }

    /// Returns the number of lines currently flagged in error.
    pub fn flagged_line_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_flagged()).count()
    }
}

/// The frozen per-employee output document of an approved or completed run.
///
/// Creating a payslip copies the employee line; it never mutates the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payslip {
    /// Unique identifier for the slip.
    pub id: Uuid,
    /// The run the slip was issued from.
    pub pay_run_id: Uuid,
    /// The employee the slip belongs to.
    pub employee_id: String,
    /// A copy of the employee line at issue time.
    pub line: PayRunEmployeeLine,
    /// Net salary, repeated at top level for delivery consumers.
    pub net_salary: Decimal,
    /// When the slip was issued (updated on re-issue).
    pub issued_at: DateTime<Utc>,
    /// Delivery bookkeeping for the document/email collaborator.
    pub email_sent: bool,
}
