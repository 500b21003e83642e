//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate,
//! covering the full taxonomy: definition errors (rejected when a salary
//! structure is saved), per-employee computation errors (recorded in the
//! preview snapshot), systemic errors (fail the whole run), and state errors
//! (rejected synchronously with no state change).

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::RunSummary;

/// The main error type for the payroll engine.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::StructureNotFound {
///     code: "STD_INDIA".to_string(),
/// };
/// assert_eq!(error.to_string(), "Salary structure not found: STD_INDIA");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // --- definition errors (structure save time) ---
    /// Two components in the same structure share a code.
    #[error("Duplicate component code '{code}' in structure '{structure}'")]
    DuplicateComponent {
        /// The duplicated component code.
        code: String,
        /// The structure containing the duplicate.
        structure: String,
    },

    /// A component code does not match the allowed pattern.
    #[error(
        "Invalid component code '{code}': must be uppercase alphanumeric or underscore, 1-10 characters"
    )]
    InvalidComponentCode {
        /// The offending code.
        code: String,
    },

    /// A component references a symbol that is neither another component nor
    /// a reserved context symbol.
    #[error("Component '{component}' references unknown symbol '{reference}'")]
    UnresolvedReference {
        /// The component holding the reference.
        component: String,
        /// The symbol that could not be resolved.
        reference: String,
    },

    /// The component reference graph contains a cycle.
    #[error("Cyclic component references in structure '{structure}': {}", cycle.join(" -> "))]
    CyclicStructure {
        /// The structure containing the cycle.
        structure: String,
        /// The cycle path, ending where it started.
        cycle: Vec<String>,
    },

    /// A formula expression failed to parse or evaluate.
    #[error("Formula error in component '{component}': {message}")]
    FormulaEvaluation {
        /// The component whose formula failed.
        component: String,
        /// A description of the failure.
        message: String,
    },

    // --- per-employee computation errors (preview entry level) ---
    /// No statutory rule set is effective on the calculation date.
    #[error("No statutory rule set effective on {date}")]
    NoActiveRuleSet {
        /// The calculation date.
        date: NaiveDate,
    },

    /// Attendance data for the employee and period is missing or unusable.
    #[error("Missing attendance for employee '{employee_id}': {message}")]
    MissingAttendance {
        /// The employee without attendance.
        employee_id: String,
        /// What made the attendance unusable.
        message: String,
    },

    /// No salary structure exists under the given code.
    #[error("Salary structure not found: {code}")]
    StructureNotFound {
        /// The structure code.
        code: String,
    },

    /// No employee exists under the given id.
    #[error("Employee not found: {id}")]
    EmployeeNotFound {
        /// The employee id.
        id: String,
    },

    // --- systemic errors (fail the run) ---
    /// A storage collaborator failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the storage failure.
        message: String,
    },

    // --- state errors (rejected synchronously) ---
    /// No payroll run exists for the given key.
    #[error("Payroll run not found: {key}")]
    RunNotFound {
        /// The run key, rendered for display.
        key: String,
    },

    /// No preview job exists under the given handle.
    #[error("Preview job not found: {job_id}")]
    JobNotFound {
        /// The job id.
        job_id: String,
    },

    /// The run is not in the state the operation requires.
    #[error("Payroll run is {actual}, expected {expected}")]
    InvalidRunState {
        /// The state the operation requires.
        expected: String,
        /// The state the run is actually in.
        actual: String,
    },

    /// The preview snapshot has per-employee errors the caller has not
    /// acknowledged.
    #[error("Preview has {skipped} skipped employee(s); pass override_skips to finalize anyway")]
    IncompletePreview {
        /// The number of employees that would be skipped.
        skipped: usize,
    },

    /// Finalize was called on a run that is already finalized. Carries the
    /// existing summary so the caller still receives the sealed result.
    #[error("Payroll run already finalized: {key}")]
    AlreadyFinalized {
        /// The run key, rendered for display.
        key: String,
        /// The summary produced when the run was first finalized.
        summary: Box<RunSummary>,
    },

    /// Challan generation was requested for a run that is not finalized.
    #[error("Payroll run {key} is not finalized; challans require a finalized run")]
    RunNotFinalized {
        /// The run key, rendered for display.
        key: String,
    },

    /// No challan exists under the given id.
    #[error("Challan not found: {challan_id}")]
    ChallanNotFound {
        /// The challan id.
        challan_id: String,
    },

    /// The challan is paid and can no longer be regenerated.
    #[error("Challan {challan_id} is paid and locked")]
    ChallanLocked {
        /// The locked challan id.
        challan_id: String,
    },

    // --- configuration errors ---
    /// A rule set file was not found at the specified path.
    #[error("Rule set file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A rule set file could not be parsed.
    #[error("Failed to parse rule set file '{path}': {message}")]
    ConfigParse {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl EngineError {
    /// True for errors that abort the whole preview batch rather than a
    /// single employee's entry.
    pub fn is_systemic(&self) -> bool {
        matches!(self, EngineError::Storage { .. })
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
