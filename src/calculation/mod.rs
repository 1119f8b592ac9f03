//! The calculation core: formula parsing, dependency resolution, component
//! evaluation, statutory deductions, and per-employee aggregation.
//!
//! The submodules form a pipeline. [`resolver::resolve_order`] turns a set
//! of component definitions into a cycle-free evaluation order,
//! [`evaluator::evaluate`] walks that order producing one resolved amount
//! per component, and [`aggregator::compute_employee_line`] wraps both with
//! loss-of-pay proration and [`statutory::compute_statutory`] to produce a
//! complete payroll line.

pub mod aggregator;
pub mod evaluator;
pub mod formula;
pub mod resolver;
pub mod statutory;

pub use aggregator::{OrderCache, StructureSnapshot, compute_employee_line, compute_totals};
pub use evaluator::{EvaluationInputs, evaluate};
pub use formula::{FormulaAst, FormulaError};
pub use resolver::resolve_order;
pub use statutory::{StatutoryDeductions, compute_statutory};

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a monetary amount to two decimal places, half away from zero.
///
/// Every intermediate amount that lands on a payslip goes through this
/// helper so that chained calculations observe the rounded value, not the
/// raw one.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let raw = Decimal::from_str("5.005").unwrap();
/// assert_eq!(round_money(raw), Decimal::from_str("5.01").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec("5.005")), dec("5.01"));
        assert_eq!(round_money(dec("-5.005")), dec("-5.01"));
        assert_eq!(round_money(dec("5.004")), dec("5.00"));
    }

    #[test]
    fn test_round_money_preserves_two_decimal_values() {
        assert_eq!(round_money(dec("1234.56")), dec("1234.56"));
    }
}
