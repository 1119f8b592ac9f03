//! Salary Structure Resolution & Payroll Calculation Engine
//!
//! This crate models an organization's salary structure as a catalog of
//! interdependent components, resolves their dependency order, evaluates
//! per-employee amounts, and runs monthly payroll batches through an
//! auditable pay-run lifecycle.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod payrun;
