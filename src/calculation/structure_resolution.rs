//! Full salary structure resolution for one employee and one period.
//!
//! Seeds the evaluation context with the reserved symbols, evaluates every
//! component in dependency order, applies the statutory rules, and produces
//! a [`ResolvedPay`] with balanced totals. Pure function of its inputs: the
//! same structure version, profile, attendance, and rule set always yield
//! the same figures.

use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::StatutoryRuleSet;
use crate::error::EngineResult;
use crate::models::{
    AttendanceBreakdown, CTC_SYMBOL, Component, ComponentKind, EmployeeProfile, PRESENT_RATIO_SYMBOL,
    PayWarning, PayslipLine, PeriodAttendance, ResolvedPay, SalaryStructure,
};

use super::component_value::{evaluate_component, round_money};
use super::dependency_order::dependency_order;
use super::statutory::evaluate_statutory;

/// Component code whose resolved value feeds wage-ceiling statutory rules.
/// Structures without it fall back to gross.
const BASIC_CODE: &str = "BASIC";

/// Resolves an employee's pay for one period.
///
/// The context starts with `CTC` (the monthly cost-to-company, annual
/// divided by twelve) and `PRESENT_RATIO` (from attendance). Components are
/// evaluated in dependency order; payslip lines are then emitted in
/// `sequence` order. Statutory deductions are appended after the
/// structure's own deductions, and net pay is floored at zero with a
/// `negative_net_clamped` warning when deductions exceed gross.
///
/// # Errors
///
/// Propagates definition errors (`CyclicStructure`, `UnresolvedReference`,
/// `FormulaEvaluation`) and `MissingAttendance`. A structure that passed
/// [`SalaryStructure::validate`] at save time cannot produce a definition
/// error here.
pub fn resolve_pay(
    structure: &SalaryStructure,
    profile: &EmployeeProfile,
    attendance: &PeriodAttendance,
    rules: &StatutoryRuleSet,
) -> EngineResult<ResolvedPay> {
    let present_ratio = attendance.present_ratio(&profile.id)?;
    let monthly_ctc = round_money(profile.annual_ctc / Decimal::from(12));

    let mut context: HashMap<String, Decimal> = HashMap::new();
    context.insert(CTC_SYMBOL.to_string(), monthly_ctc);
    context.insert(PRESENT_RATIO_SYMBOL.to_string(), present_ratio);

    let ordered = dependency_order(structure)?;
    let mut resolved: HashMap<&str, Decimal> = HashMap::new();
    for component in ordered {
        let value = evaluate_component(component, &context)?;
        context.insert(component.code.clone(), value);
        resolved.insert(component.code.as_str(), value);
    }

    let earnings = lines_for(structure, &resolved, ComponentKind::Earning);
    let mut deductions = lines_for(structure, &resolved, ComponentKind::Deduction);

    let gross: Decimal = earnings.iter().map(|l| l.amount).sum();
    let basic = resolved.get(BASIC_CODE).copied().unwrap_or(gross);

    let statutory = evaluate_statutory(gross, basic, profile.esi_exempt, rules);
    deductions.extend(statutory.deductions);

    let total_deductions: Decimal = deductions.iter().map(|l| l.amount).sum();
    let mut warnings = Vec::new();
    let net_pay = if gross >= total_deductions {
        gross - total_deductions
    } else {
        warnings.push(PayWarning {
            code: "negative_net_clamped".to_string(),
            message: format!(
                "deductions {} exceed gross {}; net pay clamped to zero",
                total_deductions, gross
            ),
        });
        Decimal::ZERO
    };

    Ok(ResolvedPay {
        earnings,
        deductions,
        employer_costs: statutory.employer_costs,
        statutory: statutory.shares,
        gross,
        total_deductions,
        net_pay,
        attendance: AttendanceBreakdown::from_attendance(attendance, present_ratio),
        warnings,
        structure_code: structure.code.clone(),
        structure_version: structure.version,
        rule_version: rules.version.clone(),
    })
}

/// Payslip lines for one kind, in sequence order (declaration order breaks
/// ties).
fn lines_for(
    structure: &SalaryStructure,
    resolved: &HashMap<&str, Decimal>,
    kind: ComponentKind,
) -> Vec<PayslipLine> {
    let mut components: Vec<&Component> = structure
        .components
        .iter()
        .filter(|c| c.kind == kind)
        .collect();
    components.sort_by_key(|c| c.sequence);

    components
        .into_iter()
        .filter_map(|c| {
            resolved.get(c.code.as_str()).map(|amount| PayslipLine {
                code: c.code.clone(),
                label: c.label.clone(),
                amount: *amount,
            })
        })
        .collect()
}
