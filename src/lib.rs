//! Payroll Calculation & Run Lifecycle Engine
//!
//! This crate turns a versioned salary-structure definition, a date-effective
//! statutory rule set, and per-employee attendance data into auditable
//! payslips, and governs the irreversible transition from mutable preview
//! figures to finalized payroll records and statutory challans.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod challan;
pub mod config;
pub mod error;
pub mod models;
pub mod ports;
pub mod run;
