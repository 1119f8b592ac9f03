//! Configuration types for statutory deduction rules.
//!
//! Tax-law specifics are not computed by the engine; PF, ESI, and
//! professional-tax parameters are externally configured and deserialized
//! from YAML. The engine only applies them.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Metadata about a statutory rule set.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSetMetadata {
    /// The human-readable name of the rule set.
    pub name: String,
    /// The version or effective date of the rules.
    pub version: String,
}

/// Provident-fund rule: a percentage of a wage base, optionally capped.
#[derive(Debug, Clone, Deserialize)]
pub struct PfRule {
    /// Employee contribution rate as a percentage (12 means 12%).
    pub employee_rate: Decimal,
    /// The wage base is capped at this ceiling when present.
    pub wage_ceiling: Option<Decimal>,
    /// Component codes forming the wage base; empty means the post-LOP
    /// gross salary.
    #[serde(default)]
    pub wage_base_components: Vec<String>,
}

/// State-insurance rule: a percentage of gross, applicable below a
/// gross-salary threshold.
#[derive(Debug, Clone, Deserialize)]
pub struct EsiRule {
    /// Employee contribution rate as a percentage (0.75 means 0.75%).
    pub employee_rate: Decimal,
    /// Employees with post-LOP gross above this threshold are exempt.
    pub gross_threshold: Decimal,
}

/// One professional-tax slab.
///
/// Slabs are declared in ascending order; the first slab whose `up_to`
/// bound covers the gross applies, and a slab without `up_to` is open-ended.
#[derive(Debug, Clone, Deserialize)]
pub struct PtSlab {
    /// Upper gross-salary bound of the slab (inclusive); open when absent.
    pub up_to: Option<Decimal>,
    /// The flat tax amount for the slab.
    pub amount: Decimal,
}

/// The complete externally supplied statutory rule set.
#[derive(Debug, Clone, Deserialize)]
pub struct StatutoryConfig {
    /// Rule-set metadata.
    pub metadata: RuleSetMetadata,
    /// Provident-fund rule; no PF deduction when absent.
    pub pf: Option<PfRule>,
    /// State-insurance rule; no ESI deduction when absent.
    pub esi: Option<EsiRule>,
    /// Professional-tax slabs; no PT deduction when empty.
    #[serde(default)]
    pub professional_tax: Vec<PtSlab>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_deserialize_full_config() {
        let yaml = r#"
metadata:
  name: "India statutory deductions"
  version: "2026-04-01"
pf:
  employee_rate: 12
  wage_ceiling: 15000
  wage_base_components: ["BASIC"]
esi:
  employee_rate: 0.75
  gross_threshold: 21000
professional_tax:
  - up_to: 15000
    amount: 0
  - up_to: 20000
    amount: 150
  - amount: 200
"#;

        let config: StatutoryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.metadata.version, "2026-04-01");

        let pf = config.pf.unwrap();
        assert_eq!(pf.employee_rate, dec("12"));
        assert_eq!(pf.wage_ceiling, Some(dec("15000")));
        assert_eq!(pf.wage_base_components, vec!["BASIC".to_string()]);

        let esi = config.esi.unwrap();
        assert_eq!(esi.employee_rate, dec("0.75"));

        assert_eq!(config.professional_tax.len(), 3);
        assert_eq!(config.professional_tax[2].up_to, None);
        assert_eq!(config.professional_tax[2].amount, dec("200"));
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let yaml = r#"
metadata:
  name: "No statutory deductions"
  version: "test"
pf: null
esi: null
"#;

        let config: StatutoryConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.pf.is_none());
        assert!(config.esi.is_none());
        assert!(config.professional_tax.is_empty());
    }
}
