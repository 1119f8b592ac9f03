//! Core data models for the payroll calculation engine.
//!
//! This module contains all the domain models used throughout the engine.

mod component;
mod employee;
mod pay_period;
mod pay_run;

pub use component::{
    CTC_CODE, CalculationKind, ComponentType, EmployeeComponentAssignment,
    ResolvedComponentAmount, SalaryComponentDefinition,
};
pub use employee::{AttendanceReport, EmployeeProfile};
pub use pay_period::PayPeriod;
pub use pay_run::{
    PayRun, PayRunAction, PayRunEmployeeLine, PayRunStatus, PayRunTotals, Payslip,
};
