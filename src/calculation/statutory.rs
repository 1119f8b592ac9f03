//! Application of statutory deduction rules.
//!
//! PF, ESI, and professional-tax rates are externally configured
//! parameters (see [`crate::config`]); this module only applies them to a
//! wage base. Rules apply to the post-LOP gross unless a rule names
//! specific wage-base components.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::StatutoryConfig;

use super::round_money;

/// The statutory deductions computed for one employee line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatutoryDeductions {
    /// Employee provident-fund contribution.
    pub pf_employee: Decimal,
    /// Employee state-insurance contribution.
    pub esi_employee: Decimal,
    /// Professional tax per the configured slabs.
    pub professional_tax: Decimal,
}

impl StatutoryDeductions {
    /// All-zero deductions (no rules configured).
    pub fn zero() -> Self {
        Self {
            pf_employee: Decimal::ZERO,
            esi_employee: Decimal::ZERO,
            professional_tax: Decimal::ZERO,
        }
    }

    /// The sum of all statutory deductions.
    pub fn total(&self) -> Decimal {
        self.pf_employee + self.esi_employee + self.professional_tax
    }
}

/// Applies the configured statutory rules to one employee's evaluated pay.
///
/// * PF: `employee_rate` % of the wage base, capped at `wage_ceiling`.
///   The wage base is the sum of the rule's `wage_base_components`
///   (components absent from the breakdown contribute zero), or the
///   post-LOP gross when none are named.
/// * ESI: `employee_rate` % of the post-LOP gross, zero when gross exceeds
///   `gross_threshold`.
/// * Professional tax: the flat amount of the first slab whose `up_to`
///   bound covers the post-LOP gross.
pub fn compute_statutory(
    rules: &StatutoryConfig,
    post_lop_gross: Decimal,
    component_amounts: &HashMap<String, Decimal>,
) -> StatutoryDeductions {
    let hundred = Decimal::from(100);

    let pf_employee = match &rules.pf {
        Some(pf) => {
            let mut base = if pf.wage_base_components.is_empty() {
                post_lop_gross
            } else {
                pf.wage_base_components
                    .iter()
                    .filter_map(|code| component_amounts.get(code))
                    .copied()
                    .sum()
            };
            if let Some(ceiling) = pf.wage_ceiling {
                base = base.min(ceiling);
            }
            round_money(pf.employee_rate / hundred * base)
        }
        None => Decimal::ZERO,
    };

    let esi_employee = match &rules.esi {
        Some(esi) if post_lop_gross <= esi.gross_threshold => {
            round_money(esi.employee_rate / hundred * post_lop_gross)
        }
        _ => Decimal::ZERO,
    };

    let professional_tax = rules
        .professional_tax
        .iter()
        .find(|slab| slab.up_to.is_none_or(|bound| post_lop_gross <= bound))
        .map(|slab| slab.amount)
        .unwrap_or(Decimal::ZERO);

    StatutoryDeductions {
        pf_employee,
        esi_employee,
        professional_tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EsiRule, PfRule, PtSlab, RuleSetMetadata};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rules() -> StatutoryConfig {
        StatutoryConfig {
            metadata: RuleSetMetadata {
                name: "test".to_string(),
                version: "test".to_string(),
            },
            pf: Some(PfRule {
                employee_rate: dec("12"),
                wage_ceiling: Some(dec("15000")),
                wage_base_components: vec!["BASIC".to_string()],
            }),
            esi: Some(EsiRule {
                employee_rate: dec("0.75"),
                gross_threshold: dec("21000"),
            }),
            professional_tax: vec![
                PtSlab {
                    up_to: Some(dec("15000")),
                    amount: dec("0"),
                },
                PtSlab {
                    up_to: Some(dec("20000")),
                    amount: dec("150"),
                },
                PtSlab {
                    up_to: None,
                    amount: dec("200"),
                },
            ],
        }
    }

    fn amounts(pairs: &[(&str, &str)]) -> HashMap<String, Decimal> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), dec(v)))
            .collect()
    }

    #[test]
    fn test_pf_on_component_wage_base() {
        let deductions = compute_statutory(
            &rules(),
            dec("25000"),
            &amounts(&[("BASIC", "12000"), ("HRA", "6000")]),
        );
        // 12% of BASIC (12000), below the ceiling.
        assert_eq!(deductions.pf_employee, dec("1440.00"));
    }

    #[test]
    fn test_pf_wage_base_capped_at_ceiling() {
        let deductions = compute_statutory(
            &rules(),
            dec("50000"),
            &amounts(&[("BASIC", "30000")]),
        );
        // Base capped at 15000, so 12% of 15000.
        assert_eq!(deductions.pf_employee, dec("1800.00"));
    }

    #[test]
    fn test_pf_on_gross_when_no_base_components() {
        let mut rules = rules();
        rules.pf.as_mut().unwrap().wage_base_components.clear();
        rules.pf.as_mut().unwrap().wage_ceiling = None;

        let deductions = compute_statutory(&rules, dec("20000"), &HashMap::new());
        assert_eq!(deductions.pf_employee, dec("2400.00"));
    }

    #[test]
    fn test_missing_wage_base_component_contributes_zero() {
        let deductions = compute_statutory(&rules(), dec("25000"), &HashMap::new());
        assert_eq!(deductions.pf_employee, dec("0.00"));
    }

    #[test]
    fn test_esi_applies_below_threshold() {
        let deductions = compute_statutory(
            &rules(),
            dec("18000"),
            &amounts(&[("BASIC", "10000")]),
        );
        assert_eq!(deductions.esi_employee, dec("135.00"));
    }

    #[test]
    fn test_esi_exempt_above_threshold() {
        let deductions = compute_statutory(
            &rules(),
            dec("21000.01"),
            &amounts(&[("BASIC", "10000")]),
        );
        assert_eq!(deductions.esi_employee, Decimal::ZERO);
    }

    #[test]
    fn test_professional_tax_slab_lookup() {
        let cases = [
            ("10000", "0"),
            ("15000", "0"),
            ("15000.01", "150"),
            ("20000", "150"),
            ("20000.01", "200"),
            ("90000", "200"),
        ];
        for (gross, expected) in cases {
            let deductions = compute_statutory(&rules(), dec(gross), &HashMap::new());
            assert_eq!(
                deductions.professional_tax,
                dec(expected),
                "gross {gross}"
            );
        }
    }

    #[test]
    fn test_no_rules_means_no_deductions() {
        let rules = StatutoryConfig {
            metadata: RuleSetMetadata {
                name: "empty".to_string(),
                version: "test".to_string(),
            },
            pf: None,
            esi: None,
            professional_tax: vec![],
        };
        let deductions = compute_statutory(&rules, dec("50000"), &HashMap::new());
        assert_eq!(deductions, StatutoryDeductions::zero());
        assert_eq!(deductions.total(), Decimal::ZERO);
    }

    #[test]
    fn test_total_sums_all_three() {
        let deductions = StatutoryDeductions {
            pf_employee: dec("1800.00"),
            esi_employee: dec("135.00"),
            professional_tax: dec("200"),
        };
        assert_eq!(deductions.total(), dec("2135.00"));
    }
}
