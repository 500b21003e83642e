//! Core data models for the payroll engine.
//!
//! This module contains all the domain types used throughout the engine.

mod challan;
mod employee;
mod payslip;
mod run;
mod structure;

pub use challan::{Challan, ChallanLine, ChallanStatus};
pub use employee::{AttendanceBreakdown, EmployeeProfile, EmployeeStatus, PeriodAttendance};
pub use payslip::{PayWarning, Payslip, PayslipLine, ResolvedPay, StatutoryShare, StatutoryType};
pub use run::{
    EmployeePreview, PreviewError, PreviewSnapshot, PreviewSummary, RunKey, RunSummary, RunType,
};
pub use structure::{
    CTC_SYMBOL, Component, ComponentKind, PRESENT_RATIO_SYMBOL, SalaryStructure, ValueType,
    is_reserved_symbol,
};
