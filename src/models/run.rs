//! Payroll run identity, preview snapshot, and run summary models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PayWarning, ResolvedPay};

/// The kind of payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// The regular monthly run.
    Regular,
    /// An off-cycle run (e.g. arrears or corrections).
    OffCycle,
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunType::Regular => write!(f, "regular"),
            RunType::OffCycle => write!(f, "off_cycle"),
        }
    }
}

/// The identity of a payroll run: (tenant, period, run type).
///
/// At most one non-finalized run may exist per key at a time.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{RunKey, RunType};
///
/// let key = RunKey::new("acme", 4, 2024, RunType::Regular);
/// assert_eq!(key.to_string(), "acme/2024-04/regular");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey {
    /// The owning tenant.
    pub tenant_id: String,
    /// Period month (1-12).
    pub period_month: u32,
    /// Period year.
    pub period_year: i32,
    /// The kind of run.
    pub run_type: RunType,
}

impl RunKey {
    /// Creates a run key.
    pub fn new(tenant_id: impl Into<String>, month: u32, year: i32, run_type: RunType) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            period_month: month,
            period_year: year,
            run_type,
        }
    }

    /// The calculation date for the period: the first day of the month.
    /// Statutory rule sets and structure versions are selected as of this
    /// date.
    pub fn period_start(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.period_year, self.period_month, 1)
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}-{:02}/{}",
            self.tenant_id, self.period_year, self.period_month, self.run_type
        )
    }
}

/// One successfully computed employee entry in a preview snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePreview {
    /// The employee.
    pub employee_id: String,
    /// Display name at computation time.
    pub display_name: String,
    /// The resolved pay figures.
    pub pay: ResolvedPay,
}

/// A per-employee failure recorded in a preview snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewError {
    /// The employee that could not be computed.
    pub employee_id: String,
    /// The failure reason, rendered from the underlying error.
    pub reason: String,
}

/// Roll-up counts and totals for a preview snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSummary {
    /// Employees successfully computed.
    pub employees: usize,
    /// Sum of gross pay across entries.
    pub total_gross: Decimal,
    /// Sum of deductions across entries.
    pub total_deductions: Decimal,
    /// Sum of net pay across entries.
    pub total_net: Decimal,
    /// Total warnings across entries.
    pub warnings_count: usize,
    /// Per-employee errors recorded.
    pub errors_count: usize,
}

/// The mutable, replaceable computation result for a run prior to
/// finalization. Tagged with the generation that produced it so stale batch
/// jobs can never attach an outdated snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSnapshot {
    /// The run generation this snapshot belongs to.
    pub generation: u64,
    /// Successfully computed entries, in employee-id order.
    pub entries: Vec<EmployeePreview>,
    /// Per-employee failures.
    pub errors: Vec<PreviewError>,
    /// Roll-up counts and totals.
    pub summary: PreviewSummary,
}

impl PreviewSnapshot {
    /// Builds a snapshot, deriving the summary from the entries and errors.
    pub fn new(generation: u64, entries: Vec<EmployeePreview>, errors: Vec<PreviewError>) -> Self {
        let summary = PreviewSummary {
            employees: entries.len(),
            total_gross: entries.iter().map(|e| e.pay.gross).sum(),
            total_deductions: entries.iter().map(|e| e.pay.total_deductions).sum(),
            total_net: entries.iter().map(|e| e.pay.net_pay).sum(),
            warnings_count: entries.iter().map(|e| e.pay.warnings.len()).sum(),
            errors_count: errors.len(),
        };
        Self {
            generation,
            entries,
            errors,
            summary,
        }
    }

    /// All warnings across entries, with their employee ids.
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &PayWarning)> {
        self.entries.iter().flat_map(|e| {
            e.pay
                .warnings
                .iter()
                .map(move |w| (e.employee_id.as_str(), w))
        })
    }
}

/// The immutable totals of a finalized run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The run key, rendered for display.
    pub run_key: String,
    /// Period month (1-12).
    pub period_month: u32,
    /// Period year.
    pub period_year: i32,
    /// The kind of run.
    pub run_type: RunType,
    /// Payslips created.
    pub employee_count: usize,
    /// Employees skipped under an acknowledged override.
    pub skipped_count: usize,
    /// Sum of gross pay.
    pub total_gross: Decimal,
    /// Sum of deductions.
    pub total_deductions: Decimal,
    /// Sum of net pay.
    pub total_net: Decimal,
    /// Gross plus employer statutory shares.
    pub employer_cost: Decimal,
    /// When the run was sealed.
    pub finalized_at: DateTime<Utc>,
}
