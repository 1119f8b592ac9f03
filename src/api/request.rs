//! Request types for the payroll engine API.
//!
//! This module defines the JSON request structures for the catalog,
//! assignment, and pay-run endpoints.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{AttendanceReport, EmployeeProfile, PayPeriod};

/// Request body for `POST /employees/{id}/assignments`.
///
/// This is a thin wrapper: it deserializes straight into the catalog's
/// assignment draft.
pub type AssignmentRequest = crate::catalog::AssignmentDraft;

/// Request body for `POST /pay-runs`.
///
/// The employee set is snapshotted into the run at creation; it comes
/// from the directory collaborator, not from engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePayRunRequest {
    /// The period the run covers.
    pub pay_period: PayPeriodRequest,
    /// The employees in scope for the run.
    pub employees: Vec<EmployeeRequest>,
}

/// Pay period information in a pay-run request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPeriodRequest {
    /// The start date of the period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the period (inclusive).
    pub end_date: NaiveDate,
    /// The date salaries are disbursed.
    pub pay_date: NaiveDate,
}

/// Employee information in a pay-run request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRequest {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Monthly cost-to-company, exposed to formulas as `CTC`.
    pub monthly_ctc: Decimal,
}

/// Request body for `POST /pay-runs/{id}/calculate`.
///
/// Carries the attendance report from the attendance collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateRequest {
    /// Working days in the period.
    pub working_days: Decimal,
    /// Paid days per employee; an absent employee is fully paid.
    #[serde(default)]
    pub paid_days: HashMap<String, Decimal>,
}

impl From<PayPeriodRequest> for PayPeriod {
    fn from(req: PayPeriodRequest) -> Self {
        PayPeriod {
            start_date: req.start_date,
            end_date: req.end_date,
            pay_date: req.pay_date,
        }
    }
}

impl From<EmployeeRequest> for EmployeeProfile {
    fn from(req: EmployeeRequest) -> Self {
        EmployeeProfile {
            id: req.id,
            name: req.name,
            monthly_ctc: req.monthly_ctc,
        }
    }
}

impl From<CalculateRequest> for AttendanceReport {
    fn from(req: CalculateRequest) -> Self {
        AttendanceReport {
            working_days: req.working_days,
            paid_days: req.paid_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pay_run_request_deserializes() {
        let json = r#"{
            "pay_period": {
                "start_date": "2026-01-01",
                "end_date": "2026-01-31",
                "pay_date": "2026-02-01"
            },
            "employees": [
                {"id": "emp_001", "name": "Asha Rao", "monthly_ctc": "60000"}
            ]
        }"#;
        let request: CreatePayRunRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.employees.len(), 1);
        let profile: EmployeeProfile = request.employees[0].clone().into();
        assert_eq!(profile.id, "emp_001");
    }

    #[test]
    fn test_calculate_request_defaults_paid_days() {
        let json = r#"{"working_days": "22"}"#;
        let request: CalculateRequest = serde_json::from_str(json).unwrap();
        let attendance: AttendanceReport = request.into();
        assert!(attendance.paid_days.is_empty());
    }
}
