//! Collaborator contracts consumed by the run orchestrator.
//!
//! The engine does not own employee, attendance, or structure data; it
//! consumes them through these traits. In-memory implementations back the
//! tests and the demo API wiring; a deployment substitutes its own stores.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeeProfile, EmployeeStatus, PeriodAttendance, SalaryStructure};

/// Source of employee profiles.
pub trait EmployeeDirectory: Send + Sync {
    /// Fetches one employee by id.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeNotFound` for an unknown id.
    fn get_employee(&self, id: &str) -> EngineResult<EmployeeProfile>;

    /// Lists active employees for a tenant, in id order.
    fn list_active(&self, tenant_id: &str) -> EngineResult<Vec<EmployeeProfile>>;
}

/// Source of per-period attendance figures.
pub trait AttendanceSource: Send + Sync {
    /// Fetches attendance for one employee and period.
    ///
    /// # Errors
    ///
    /// Returns `MissingAttendance` when no record exists for the period.
    fn get_period_attendance(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> EngineResult<PeriodAttendance>;
}

/// Source of versioned salary structures.
pub trait StructureStore: Send + Sync {
    /// Fetches the structure version effective on `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `StructureNotFound` for an unknown code or when no version
    /// is effective on the date.
    fn get_structure(&self, code: &str, as_of: NaiveDate) -> EngineResult<SalaryStructure>;
}

/// In-memory employee directory keyed by (tenant, employee id).
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    employees: RwLock<HashMap<String, Vec<EmployeeProfile>>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an employee under a tenant.
    pub fn upsert(&self, tenant_id: &str, profile: EmployeeProfile) {
        let mut employees = match self.employees.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let tenant = employees.entry(tenant_id.to_string()).or_default();
        match tenant.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => tenant.push(profile),
        }
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn get_employee(&self, id: &str) -> EngineResult<EmployeeProfile> {
        let employees = match self.employees.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        employees
            .values()
            .flatten()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| EngineError::EmployeeNotFound { id: id.to_string() })
    }

    fn list_active(&self, tenant_id: &str) -> EngineResult<Vec<EmployeeProfile>> {
        let employees = match self.employees.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut active: Vec<EmployeeProfile> = employees
            .get(tenant_id)
            .map(|tenant| {
                tenant
                    .iter()
                    .filter(|p| p.status == EmployeeStatus::Active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(active)
    }
}

/// In-memory attendance records keyed by (employee id, month, year).
#[derive(Debug, Default)]
pub struct InMemoryAttendance {
    records: RwLock<HashMap<(String, u32, i32), PeriodAttendance>>,
}

impl InMemoryAttendance {
    /// Creates an empty attendance source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records attendance for one employee and period.
    pub fn record(&self, employee_id: &str, month: u32, year: i32, attendance: PeriodAttendance) {
        let mut records = match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.insert((employee_id.to_string(), month, year), attendance);
    }
}

impl AttendanceSource for InMemoryAttendance {
    fn get_period_attendance(
        &self,
        employee_id: &str,
        month: u32,
        year: i32,
    ) -> EngineResult<PeriodAttendance> {
        let records = match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records
            .get(&(employee_id.to_string(), month, year))
            .cloned()
            .ok_or_else(|| EngineError::MissingAttendance {
                employee_id: employee_id.to_string(),
                message: format!("no attendance recorded for {}-{:02}", year, month),
            })
    }
}

/// In-memory structure store holding every saved version of each structure.
#[derive(Debug, Default)]
pub struct InMemoryStructures {
    // (structure, effective_from) per version, newest last.
    versions: RwLock<HashMap<String, Vec<(SalaryStructure, NaiveDate)>>>,
}

impl InMemoryStructures {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves a structure version effective from a date, validating its
    /// definition first. Saving is the only gate where definition errors
    /// surface.
    ///
    /// # Errors
    ///
    /// Propagates validation errors; an invalid structure is never stored.
    pub fn save(&self, structure: SalaryStructure, effective_from: NaiveDate) -> EngineResult<()> {
        structure.validate()?;
        let mut versions = match self.versions.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = versions.entry(structure.code.clone()).or_default();
        entry.push((structure, effective_from));
        entry.sort_by_key(|(_, from)| *from);
        Ok(())
    }
}

impl StructureStore for InMemoryStructures {
    fn get_structure(&self, code: &str, as_of: NaiveDate) -> EngineResult<SalaryStructure> {
        let versions = match self.versions.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        versions
            .get(code)
            .and_then(|entry| {
                entry
                    .iter()
                    .rev()
                    .find(|(_, from)| *from <= as_of)
                    .map(|(structure, _)| structure.clone())
            })
            .ok_or_else(|| EngineError::StructureNotFound {
                code: code.to_string(),
            })
    }
}
