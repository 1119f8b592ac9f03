//! Pay period model.
//!
//! A pay period defines the date window a pay run covers and the date pay
//! is disbursed. Pay-schedule metadata is consumed here, not computed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The date range and pay date for one pay run.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayPeriod;
/// use chrono::NaiveDate;
///
/// let period = PayPeriod {
///     start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
///     pay_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
/// };
/// assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// The start date of the pay period (inclusive).
    pub start_date: NaiveDate,
    /// The end date of the pay period (inclusive).
    pub end_date: NaiveDate,
    /// The date pay is disbursed for this period.
    pub pay_date: NaiveDate,
}

impl PayPeriod {
    /// Checks if a given date falls within this pay period.
    ///
    /// The check is inclusive of both start and end dates.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn january() -> PayPeriod {
        PayPeriod {
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            pay_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        }
    }

    #[test]
    fn test_contains_date_within_period() {
        let period = january();
        assert!(period.contains_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
    }

    #[test]
    fn test_contains_date_on_boundaries() {
        let period = january();
        assert!(period.contains_date(period.start_date));
        assert!(period.contains_date(period.end_date));
    }

    #[test]
    fn test_contains_date_outside_period() {
        let period = january();
        assert!(!period.contains_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!period.contains_date(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()));
    }

    #[test]
    fn test_serialize_pay_period() {
        let period = january();
        let json = serde_json::to_string(&period).unwrap();
        assert!(json.contains("\"start_date\":\"2026-01-01\""));
        assert!(json.contains("\"end_date\":\"2026-01-31\""));
        assert!(json.contains("\"pay_date\":\"2026-02-01\""));
    }

    #[test]
    fn test_deserialize_pay_period() {
        let json = r#"{
            "start_date": "2026-01-01",
            "end_date": "2026-01-31",
            "pay_date": "2026-02-01"
        }"#;
        let period: PayPeriod = serde_json::from_str(json).unwrap();
        assert_eq!(period, january());
    }
}
