//! Employee profile and attendance inputs.
//!
//! These types are supplied by collaborators outside the engine: the
//! employee directory provides identity and cost-to-company, the
//! attendance system provides paid-day counts for loss-of-pay proration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An employee as seen by the payroll engine.
///
/// The engine only reads this data; employee CRUD lives in the directory
/// collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    /// Unique identifier for the employee.
    pub id: String,
    /// The employee's display name.
    pub name: String,
    /// Monthly cost-to-company, available to formulas as the reserved
    /// `CTC` variable.
    pub monthly_ctc: Decimal,
}

/// Paid-days data for one pay period, reported by the attendance system.
///
/// An employee missing from `paid_days` is treated as fully paid for the
/// period.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AttendanceReport;
/// use rust_decimal::Decimal;
///
/// let report = AttendanceReport::fully_paid(Decimal::from(22));
/// assert_eq!(report.paid_days_for("emp_001"), Decimal::from(22));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceReport {
    /// Total working days in the pay period.
    pub working_days: Decimal,
    /// Paid days per employee id; absent employees are fully paid.
    #[serde(default)]
    pub paid_days: HashMap<String, Decimal>,
}

impl AttendanceReport {
    /// Creates a report with no unpaid absences.
    pub fn fully_paid(working_days: Decimal) -> Self {
        Self {
            working_days,
            paid_days: HashMap::new(),
        }
    }

    /// Returns the paid days for an employee, defaulting to the full
    /// working-day count when no absence was reported.
    pub fn paid_days_for(&self, employee_id: &str) -> Decimal {
        self.paid_days
            .get(employee_id)
            .copied()
            .unwrap_or(self.working_days)
    }
}
