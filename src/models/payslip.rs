//! Payslip models and the per-employee resolved pay they are built from.
//!
//! A [`ResolvedPay`] is the output of structure resolution during preview;
//! a [`Payslip`] is the immutable record created from it at finalize time.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AttendanceBreakdown;

/// The statutory scheme a deduction or challan belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatutoryType {
    /// Provident fund.
    Pf,
    /// Employee state insurance.
    Esi,
    /// Professional tax.
    Pt,
}

impl StatutoryType {
    /// Short uppercase code used on payslip lines and challans.
    pub fn code(&self) -> &'static str {
        match self {
            StatutoryType::Pf => "PF",
            StatutoryType::Esi => "ESI",
            StatutoryType::Pt => "PT",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            StatutoryType::Pf => "Provident Fund",
            StatutoryType::Esi => "Employee State Insurance",
            StatutoryType::Pt => "Professional Tax",
        }
    }
}

/// A single earning or deduction line on a payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipLine {
    /// Component or statutory code (e.g. "BASIC", "PF").
    pub code: String,
    /// Label shown on the payslip.
    pub label: String,
    /// The line amount, rounded to the minor unit.
    pub amount: Decimal,
}

/// Employee and employer shares for one statutory scheme, kept per payslip
/// so challans can be aggregated without recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatutoryShare {
    /// The scheme.
    pub statutory_type: StatutoryType,
    /// The employee's contribution (part of total deductions).
    pub employee_share: Decimal,
    /// The employer's contribution (part of employer cost, not net pay).
    pub employer_share: Decimal,
}

/// A non-fatal condition recorded during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayWarning {
    /// A code identifying the warning type (e.g. "negative_net_clamped").
    pub code: String,
    /// A human-readable description.
    pub message: String,
}

/// The fully resolved pay for one employee and one period.
///
/// Held inside the preview snapshot while the run is mutable; copied into a
/// [`Payslip`] verbatim at finalize time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPay {
    /// Earning lines in sequence order.
    pub earnings: Vec<PayslipLine>,
    /// Deduction lines: structure deductions then statutory lines.
    pub deductions: Vec<PayslipLine>,
    /// Employer-cost lines (statutory employer shares).
    pub employer_costs: Vec<PayslipLine>,
    /// Per-scheme shares backing the deduction and employer-cost lines.
    pub statutory: Vec<StatutoryShare>,
    /// Sum of earning lines.
    pub gross: Decimal,
    /// Sum of deduction lines.
    pub total_deductions: Decimal,
    /// gross - total_deductions, floored at zero (with a warning).
    pub net_pay: Decimal,
    /// Attendance figures used for proration.
    pub attendance: AttendanceBreakdown,
    /// Non-fatal conditions encountered during resolution.
    pub warnings: Vec<PayWarning>,
    /// Structure code the pay was resolved from.
    pub structure_code: String,
    /// Structure version frozen for this result.
    pub structure_version: u32,
    /// Statutory rule set version frozen for this result.
    pub rule_version: String,
}

/// An immutable payslip, one per (payroll run, employee), created only at
/// finalize time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payslip {
    /// Unique payslip id.
    pub id: Uuid,
    /// The owning payroll run, rendered as its key string.
    pub run_key: String,
    /// The employee this payslip is for.
    pub employee_id: String,
    /// The employee's display name at finalize time.
    pub employee_name: String,
    /// Period month (1-12).
    pub period_month: u32,
    /// Period year.
    pub period_year: i32,
    /// The resolved pay figures, frozen.
    pub pay: ResolvedPay,
}

impl Payslip {
    /// The net amount payable to the employee.
    pub fn net_pay(&self) -> Decimal {
        self.pay.net_pay
    }

    /// The employer's total cost: gross plus employer statutory shares.
    pub fn employer_cost(&self) -> Decimal {
        let employer: Decimal = self.pay.employer_costs.iter().map(|l| l.amount).sum();
        self.pay.gross + employer
    }
}
