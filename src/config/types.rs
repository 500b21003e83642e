//! Statutory rule set types.
//!
//! A rule set captures the statutory deduction parameters effective from a
//! given date: provident fund rates and wage ceiling, insurance rates and
//! eligibility limit, and the professional tax slab table. Rule sets are
//! immutable once published; changes ship as a new version with a later
//! `effective_from`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Provident fund parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfRule {
    /// Employee contribution as a percentage of capped basic (e.g. 12).
    pub employee_percent: Decimal,
    /// Employer contribution as a percentage of capped basic.
    pub employer_percent: Decimal,
    /// Basic wage ceiling; contributions apply to min(basic, ceiling).
    pub wage_ceiling: Decimal,
}

/// Employee state insurance parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsiRule {
    /// Employee contribution as a percentage of gross (e.g. 0.75).
    pub employee_percent: Decimal,
    /// Employer contribution as a percentage of gross.
    pub employer_percent: Decimal,
    /// Eligibility limit: applies only when gross <= this figure.
    pub wage_limit: Decimal,
}

/// One professional tax slab: the monthly amount due when gross falls at or
/// below `up_to` (an open-ended final slab has `up_to = None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtSlab {
    /// Upper gross bound of the slab, inclusive; `None` for the last slab.
    pub up_to: Option<Decimal>,
    /// The flat monthly amount for this slab.
    pub amount: Decimal,
}

/// Professional tax parameters: an ordered slab table over gross pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtRule {
    /// Slabs in ascending `up_to` order, open-ended slab last.
    pub slabs: Vec<PtSlab>,
}

/// A versioned, date-effective set of statutory rules.
///
/// Exactly one rule set is active for a given calculation date: the one
/// with the greatest `effective_from` that is on or before the date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatutoryRuleSet {
    /// Version identifier (e.g. "v2024_04").
    pub version: String,
    /// Human-readable name.
    pub name: String,
    /// The first date this rule set applies to.
    pub effective_from: NaiveDate,
    /// Provident fund rule, if the scheme is enabled.
    pub pf: Option<PfRule>,
    /// Insurance rule, if the scheme is enabled.
    pub esi: Option<EsiRule>,
    /// Professional tax rule, if the scheme is enabled.
    pub pt: Option<PtRule>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_rule_set_deserializes_from_yaml() {
        let yaml = r#"
version: v2024_04
name: Statutory Rules FY 2024-25
effective_from: 2024-04-01
pf:
  employee_percent: "12"
  employer_percent: "12"
  wage_ceiling: "15000"
esi:
  employee_percent: "0.75"
  employer_percent: "3.25"
  wage_limit: "21000"
pt:
  slabs:
    - up_to: "10000"
      amount: "0"
    - up_to: "15000"
      amount: "150"
    - up_to: null
      amount: "200"
"#;

        let rule_set: StatutoryRuleSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule_set.version, "v2024_04");
        assert_eq!(
            rule_set.effective_from,
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        );
        assert_eq!(rule_set.pf.as_ref().unwrap().wage_ceiling, dec("15000"));
        assert_eq!(rule_set.esi.as_ref().unwrap().employee_percent, dec("0.75"));
        let pt = rule_set.pt.as_ref().unwrap();
        assert_eq!(pt.slabs.len(), 3);
        assert_eq!(pt.slabs[2].up_to, None);
    }

    #[test]
    fn test_disabled_schemes_deserialize_as_none() {
        let yaml = r#"
version: v1
name: Minimal
effective_from: 2023-04-01
pf: null
esi: null
pt: null
"#;

        let rule_set: StatutoryRuleSet = serde_yaml::from_str(yaml).unwrap();
        assert!(rule_set.pf.is_none());
        assert!(rule_set.esi.is_none());
        assert!(rule_set.pt.is_none());
    }
}
