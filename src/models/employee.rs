//! Employee profile and attendance models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Employment status as reported by the employee directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// Included in payroll runs.
    Active,
    /// Excluded from payroll runs.
    Inactive,
}

/// An employee as seen by the payroll engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    /// Unique employee id.
    pub id: String,
    /// Display name shown on payslips and preview entries.
    pub display_name: String,
    /// Annual cost-to-company.
    pub annual_ctc: Decimal,
    /// Code of the assigned salary structure, if any.
    pub structure_code: Option<String>,
    /// Date the employee joined.
    pub join_date: NaiveDate,
    /// Current employment status.
    pub status: EmployeeStatus,
    /// True for employees outside the insurance scheme regardless of wage.
    #[serde(default)]
    pub esi_exempt: bool,
}

/// Attendance figures for one employee and one period.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PeriodAttendance;
/// use rust_decimal::Decimal;
///
/// let attendance = PeriodAttendance {
///     present_days: Decimal::from(20),
///     paid_leave_days: Decimal::from(2),
///     total_working_days: Decimal::from(22),
/// };
/// assert_eq!(attendance.present_ratio("emp_001").unwrap(), Decimal::ONE);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAttendance {
    /// Days the employee was present.
    pub present_days: Decimal,
    /// Paid leave days, counted as paid time.
    pub paid_leave_days: Decimal,
    /// Working days in the period.
    pub total_working_days: Decimal,
}

impl PeriodAttendance {
    /// The fraction of the period that is paid: (present + paid leave) /
    /// working days, capped at 1.
    ///
    /// # Errors
    ///
    /// Returns `MissingAttendance` when the period has no working days,
    /// which would make the ratio undefined.
    pub fn present_ratio(&self, employee_id: &str) -> EngineResult<Decimal> {
        if self.total_working_days <= Decimal::ZERO {
            return Err(EngineError::MissingAttendance {
                employee_id: employee_id.to_string(),
                message: "total_working_days is zero".to_string(),
            });
        }
        let ratio = (self.present_days + self.paid_leave_days) / self.total_working_days;
        Ok(ratio.min(Decimal::ONE))
    }
}

/// Attendance figures carried onto a payslip for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceBreakdown {
    /// Days present.
    pub present_days: Decimal,
    /// Paid leave days.
    pub paid_leave_days: Decimal,
    /// Working days in the period.
    pub total_working_days: Decimal,
    /// The proration multiplier applied to prorated components.
    pub present_ratio: Decimal,
}

impl AttendanceBreakdown {
    /// Builds the payslip breakdown from period attendance and the ratio
    /// already derived from it.
    pub fn from_attendance(attendance: &PeriodAttendance, present_ratio: Decimal) -> Self {
        Self {
            present_days: attendance.present_days,
            paid_leave_days: attendance.paid_leave_days,
            total_working_days: attendance.total_working_days,
            present_ratio,
        }
    }
}
