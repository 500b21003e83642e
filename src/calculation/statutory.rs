//! Statutory deduction rule evaluation.
//!
//! Each rule (provident fund, state insurance, professional tax) is a pure
//! function of its declared inputs, so it can be tested in isolation from
//! the orchestrator. [`evaluate_statutory`] applies every enabled rule in a
//! fixed PF, ESI, PT order and produces the employee-share deduction lines,
//! the employer-cost lines, and the per-scheme shares that later feed
//! challan aggregation.

use rust_decimal::Decimal;

use crate::config::{EsiRule, PfRule, PtRule, StatutoryRuleSet};
use crate::models::{PayslipLine, StatutoryShare, StatutoryType};

use super::component_value::round_money;

/// The statutory lines for one employee and one rule set.
#[derive(Debug, Clone, PartialEq)]
pub struct StatutoryOutcome {
    /// Employee-share deduction lines, in PF, ESI, PT order.
    pub deductions: Vec<PayslipLine>,
    /// Employer-cost lines (not part of net pay).
    pub employer_costs: Vec<PayslipLine>,
    /// Per-scheme shares backing the lines.
    pub shares: Vec<StatutoryShare>,
}

/// Provident fund contributions: rate applied to min(basic, wage ceiling).
pub fn pf_contribution(basic: Decimal, rule: &PfRule) -> (Decimal, Decimal) {
    let capped = basic.min(rule.wage_ceiling);
    let hundred = Decimal::from(100);
    (
        round_money(capped * rule.employee_percent / hundred),
        round_money(capped * rule.employer_percent / hundred),
    )
}

/// Insurance contributions, or `None` when gross exceeds the eligibility
/// limit (the employee is out of the scheme).
pub fn esi_contribution(gross: Decimal, rule: &EsiRule) -> Option<(Decimal, Decimal)> {
    if gross > rule.wage_limit {
        return None;
    }
    let hundred = Decimal::from(100);
    Some((
        round_money(gross * rule.employee_percent / hundred),
        round_money(gross * rule.employer_percent / hundred),
    ))
}

/// Professional tax: flat amount from the slab whose `up_to` bound the
/// gross falls at or below; the open-ended last slab catches the rest.
pub fn pt_amount(gross: Decimal, rule: &PtRule) -> Decimal {
    for slab in &rule.slabs {
        match slab.up_to {
            Some(bound) if gross <= bound => return round_money(slab.amount),
            Some(_) => continue,
            None => return round_money(slab.amount),
        }
    }
    Decimal::ZERO
}

/// Applies every enabled rule in the set to one employee's figures.
///
/// `esi_exempt` excludes the employee from the insurance scheme regardless
/// of wage (a profile-level flag).
pub fn evaluate_statutory(
    gross: Decimal,
    basic: Decimal,
    esi_exempt: bool,
    rules: &StatutoryRuleSet,
) -> StatutoryOutcome {
    let mut deductions = Vec::new();
    let mut employer_costs = Vec::new();
    let mut shares = Vec::new();

    if let Some(pf) = &rules.pf {
        let (employee, employer) = pf_contribution(basic, pf);
        push_scheme(
            StatutoryType::Pf,
            employee,
            employer,
            &mut deductions,
            &mut employer_costs,
            &mut shares,
        );
    }

    if let Some(esi) = &rules.esi {
        if !esi_exempt {
            if let Some((employee, employer)) = esi_contribution(gross, esi) {
                push_scheme(
                    StatutoryType::Esi,
                    employee,
                    employer,
                    &mut deductions,
                    &mut employer_costs,
                    &mut shares,
                );
            }
        }
    }

    if let Some(pt) = &rules.pt {
        let amount = pt_amount(gross, pt);
        if amount > Decimal::ZERO {
            push_scheme(
                StatutoryType::Pt,
                amount,
                Decimal::ZERO,
                &mut deductions,
                &mut employer_costs,
                &mut shares,
            );
        }
    }

    StatutoryOutcome {
        deductions,
        employer_costs,
        shares,
    }
}

fn push_scheme(
    statutory_type: StatutoryType,
    employee_share: Decimal,
    employer_share: Decimal,
    deductions: &mut Vec<PayslipLine>,
    employer_costs: &mut Vec<PayslipLine>,
    shares: &mut Vec<StatutoryShare>,
) {
    if employee_share > Decimal::ZERO {
        deductions.push(PayslipLine {
            code: statutory_type.code().to_string(),
            label: statutory_type.label().to_string(),
            amount: employee_share,
        });
    }
    if employer_share > Decimal::ZERO {
        employer_costs.push(PayslipLine {
            code: format!("{}_ER", statutory_type.code()),
            label: format!("{} (Employer)", statutory_type.label()),
            amount: employer_share,
        });
    }
    shares.push(StatutoryShare {
        statutory_type,
        employee_share,
        employer_share,
    });
}
