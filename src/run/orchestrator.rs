//! Payroll run orchestration.
//!
//! The orchestrator exclusively owns run state transitions. A preview
//! request returns a job handle immediately and spawns a background batch
//! that resolves every active employee; per-employee failures are recorded
//! in the snapshot without aborting the batch, while systemic faults fail
//! the whole run. Finalize converts a ready snapshot into immutable
//! payslips in one transition under the run lock, so finalization is all or
//! nothing.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::resolve_pay;
use crate::config::{RuleSetStore, StatutoryRuleSet};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    EmployeePreview, EmployeeProfile, Payslip, PreviewError, PreviewSnapshot, RunKey, RunSummary,
};
use crate::ports::{AttendanceSource, EmployeeDirectory, StructureStore};

use super::job::{JobPhase, PreviewJob, PreviewPoll};
use super::state::{PayrollRun, RunState};

/// Default wall-clock limit for one preview batch.
const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(60);

/// Drives payroll runs from preview request through finalization.
///
/// All run and job state lives behind internal locks; the orchestrator is
/// shared across request handlers as an `Arc`.
pub struct PayrollOrchestrator {
    directory: Arc<dyn EmployeeDirectory>,
    attendance: Arc<dyn AttendanceSource>,
    structures: Arc<dyn StructureStore>,
    rules: Arc<RuleSetStore>,
    runs: Mutex<HashMap<RunKey, PayrollRun>>,
    jobs: Mutex<HashMap<Uuid, PreviewJob>>,
    job_timeout: Duration,
}

impl PayrollOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        directory: Arc<dyn EmployeeDirectory>,
        attendance: Arc<dyn AttendanceSource>,
        structures: Arc<dyn StructureStore>,
        rules: Arc<RuleSetStore>,
    ) -> Self {
        Self {
            directory,
            attendance,
            structures,
            rules,
            runs: Mutex::new(HashMap::new()),
            jobs: Mutex::new(HashMap::new()),
            job_timeout: DEFAULT_JOB_TIMEOUT,
        }
    }

    /// Overrides the batch timeout.
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Requests a preview for a run and returns a job handle immediately.
    ///
    /// A repeat request on the same key supersedes any prior preview: the
    /// run's generation is bumped, the old snapshot is discarded, and an
    /// in-flight job under the old generation becomes stale.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyFinalized` if the run is sealed.
    pub fn start_preview(self: &Arc<Self>, key: RunKey) -> EngineResult<Uuid> {
        let generation = {
            let mut runs = self.lock_runs();
            match runs.entry(key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(PayrollRun::new(key.clone()));
                    1
                }
                Entry::Occupied(mut slot) => {
                    let run = slot.get_mut();
                    if let RunState::Finalized { summary, .. } = &run.state {
                        return Err(EngineError::AlreadyFinalized {
                            key: key.to_string(),
                            summary: Box::new(summary.clone()),
                        });
                    }
                    run.requeue_preview()
                }
            }
        };

        let job = PreviewJob::new(key.clone(), generation);
        let job_id = job.id;
        self.lock_jobs().insert(job_id, job);
        info!(run_key = %key, generation, %job_id, "Preview queued");

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let work = orchestrator.execute_preview(job_id, key.clone(), generation);
            if tokio::time::timeout(orchestrator.job_timeout, work)
                .await
                .is_err()
            {
                warn!(run_key = %key, generation, "Preview batch timed out");
                orchestrator.abort_run(&key, generation, job_id, "preview batch timed out");
            }
        });

        Ok(job_id)
    }

    /// Polls a preview job for phase, progress, and (once completed) the
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns `JobNotFound` for an unknown handle.
    pub fn get_preview(&self, job_id: Uuid) -> EngineResult<PreviewPoll> {
        let job = self
            .lock_jobs()
            .get(&job_id)
            .cloned()
            .ok_or_else(|| EngineError::JobNotFound {
                job_id: job_id.to_string(),
            })?;

        // The snapshot is handed out only while the run still holds this
        // job's result; a superseding preview makes it unavailable.
        let snapshot = if job.phase == JobPhase::Completed {
            let runs = self.lock_runs();
            runs.get(&job.run_key).and_then(|run| match &run.state {
                RunState::PreviewReady { snapshot } if snapshot.generation == job.generation => {
                    Some(snapshot.clone())
                }
                _ => None,
            })
        } else {
            None
        };

        Ok(PreviewPoll {
            job_id,
            phase: job.phase,
            progress: job.progress,
            snapshot,
            error: job.error,
        })
    }

    /// Finalizes a ready run: converts the snapshot into immutable payslips
    /// and seals the totals. All-or-nothing under the run lock.
    ///
    /// # Errors
    ///
    /// - `RunNotFound` for an unknown key.
    /// - `InvalidRunState` unless the run is `preview_ready`.
    /// - `IncompletePreview` if the snapshot has per-employee errors and
    ///   `override_skips` is false.
    /// - `AlreadyFinalized` (carrying the existing summary) on repeat calls.
    pub fn finalize(&self, key: &RunKey, override_skips: bool) -> EngineResult<RunSummary> {
        let mut runs = self.lock_runs();
        let run = runs.get_mut(key).ok_or_else(|| EngineError::RunNotFound {
            key: key.to_string(),
        })?;

        let snapshot = match &run.state {
            RunState::PreviewReady { snapshot } => snapshot,
            RunState::Finalized { summary, .. } => {
                return Err(EngineError::AlreadyFinalized {
                    key: key.to_string(),
                    summary: Box::new(summary.clone()),
                });
            }
            other => {
                return Err(EngineError::InvalidRunState {
                    expected: "preview_ready".to_string(),
                    actual: other.name().to_string(),
                });
            }
        };

        let skipped = snapshot.errors.len();
        if skipped > 0 && !override_skips {
            return Err(EngineError::IncompletePreview { skipped });
        }

        let payslips: Vec<Payslip> = snapshot
            .entries
            .iter()
            .map(|entry| Payslip {
                id: Uuid::new_v4(),
                run_key: key.to_string(),
                employee_id: entry.employee_id.clone(),
                employee_name: entry.display_name.clone(),
                period_month: key.period_month,
                period_year: key.period_year,
                pay: entry.pay.clone(),
            })
            .collect();

        let employer_cost: Decimal = payslips.iter().map(Payslip::employer_cost).sum();
        let summary = RunSummary {
            run_key: key.to_string(),
            period_month: key.period_month,
            period_year: key.period_year,
            run_type: key.run_type,
            employee_count: payslips.len(),
            skipped_count: skipped,
            total_gross: snapshot.summary.total_gross,
            total_deductions: snapshot.summary.total_deductions,
            total_net: snapshot.summary.total_net,
            employer_cost,
            finalized_at: Utc::now(),
        };

        info!(
            run_key = %key,
            employees = summary.employee_count,
            skipped = summary.skipped_count,
            "Payroll run finalized"
        );
        run.state = RunState::Finalized {
            payslips,
            summary: summary.clone(),
        };
        Ok(summary)
    }

    /// The payslip set of a finalized run.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` for an unknown key and `RunNotFinalized` while
    /// the run is still mutable.
    pub fn payslips(&self, key: &RunKey) -> EngineResult<Vec<Payslip>> {
        let runs = self.lock_runs();
        let run = runs.get(key).ok_or_else(|| EngineError::RunNotFound {
            key: key.to_string(),
        })?;
        match &run.state {
            RunState::Finalized { payslips, .. } => Ok(payslips.clone()),
            _ => Err(EngineError::RunNotFinalized {
                key: key.to_string(),
            }),
        }
    }

    /// The current state of a run.
    ///
    /// # Errors
    ///
    /// Returns `RunNotFound` for an unknown key.
    pub fn run_state(&self, key: &RunKey) -> EngineResult<RunState> {
        let runs = self.lock_runs();
        runs.get(key)
            .map(|run| run.state.clone())
            .ok_or_else(|| EngineError::RunNotFound {
                key: key.to_string(),
            })
    }

    /// The batch body: resolves every active employee and attaches the
    /// snapshot, unless the generation was superseded along the way.
    async fn execute_preview(&self, job_id: Uuid, key: RunKey, generation: u64) {
        if !self.begin_processing(&key, generation) {
            self.mark_job_superseded(job_id);
            return;
        }
        self.update_job(job_id, |job| job.phase = JobPhase::Processing);

        let Some(period_start) = key.period_start() else {
            self.abort_run(&key, generation, job_id, "invalid period in run key");
            return;
        };

        let rules = match self.rules.active_for(period_start) {
            Ok(rules) => rules.clone(),
            Err(e) => {
                // No rule set at all is systemic, not per-employee.
                self.abort_run(&key, generation, job_id, &e.to_string());
                return;
            }
        };

        let employees = match self.directory.list_active(&key.tenant_id) {
            Ok(employees) => employees,
            Err(e) => {
                self.abort_run(&key, generation, job_id, &e.to_string());
                return;
            }
        };

        let total = employees.len();
        self.update_job(job_id, |job| job.progress.total = total);

        let mut entries = Vec::new();
        let mut errors = Vec::new();
        for (processed, employee) in employees.iter().enumerate() {
            // Yield between employees so timeouts and supersession get a
            // chance to run against a large batch.
            tokio::task::yield_now().await;

            match self.compute_entry(employee, &key, period_start, &rules) {
                Ok(entry) => entries.push(entry),
                Err(e) if e.is_systemic() => {
                    self.abort_run(&key, generation, job_id, &e.to_string());
                    return;
                }
                Err(e) => {
                    warn!(run_key = %key, employee_id = %employee.id, error = %e, "Employee skipped in preview");
                    errors.push(PreviewError {
                        employee_id: employee.id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            self.update_job(job_id, |job| job.progress.processed = processed + 1);
        }

        let snapshot = PreviewSnapshot::new(generation, entries, errors);
        if self.attach_snapshot(&key, generation, snapshot) {
            self.update_job(job_id, |job| job.phase = JobPhase::Completed);
            info!(run_key = %key, generation, "Preview ready");
        } else {
            self.mark_job_superseded(job_id);
        }
    }

    /// Resolves one employee's pay for the period.
    fn compute_entry(
        &self,
        employee: &EmployeeProfile,
        key: &RunKey,
        period_start: NaiveDate,
        rules: &StatutoryRuleSet,
    ) -> EngineResult<EmployeePreview> {
        let structure_code =
            employee
                .structure_code
                .as_deref()
                .ok_or_else(|| EngineError::StructureNotFound {
                    code: format!("none assigned to employee {}", employee.id),
                })?;
        let structure = self.structures.get_structure(structure_code, period_start)?;
        let attendance =
            self.attendance
                .get_period_attendance(&employee.id, key.period_month, key.period_year)?;
        let pay = resolve_pay(&structure, employee, &attendance, rules)?;
        Ok(EmployeePreview {
            employee_id: employee.id.clone(),
            display_name: employee.display_name.clone(),
            pay,
        })
    }

    /// Moves the run into `preview_processing` if this generation is still
    /// current. Returns false when superseded.
    fn begin_processing(&self, key: &RunKey, generation: u64) -> bool {
        let mut runs = self.lock_runs();
        let Some(run) = runs.get_mut(key) else {
            return false;
        };
        if !run.is_current(generation) {
            return false;
        }
        match run.state {
            RunState::PreviewQueued { .. } => {
                run.state = RunState::PreviewProcessing { generation };
                true
            }
            _ => false,
        }
    }

    /// Attaches a snapshot if this generation is still current. A stale
    /// generation's result is discarded, never merged.
    fn attach_snapshot(&self, key: &RunKey, generation: u64, snapshot: PreviewSnapshot) -> bool {
        let mut runs = self.lock_runs();
        let Some(run) = runs.get_mut(key) else {
            return false;
        };
        if !run.is_current(generation) {
            return false;
        }
        match run.state {
            RunState::PreviewProcessing { .. } => {
                run.state = RunState::PreviewReady { snapshot };
                true
            }
            _ => false,
        }
    }

    /// Fails the run (if this generation still owns it) and the job.
    fn abort_run(&self, key: &RunKey, generation: u64, job_id: Uuid, reason: &str) {
        {
            let mut runs = self.lock_runs();
            if let Some(run) = runs.get_mut(key) {
                let live_preview = matches!(
                    run.state,
                    RunState::PreviewQueued { .. } | RunState::PreviewProcessing { .. }
                );
                if run.is_current(generation) && live_preview {
                    warn!(run_key = %key, generation, reason, "Payroll run failed");
                    run.state = RunState::Failed {
                        reason: reason.to_string(),
                    };
                }
            }
        }
        self.update_job(job_id, |job| {
            job.phase = JobPhase::Failed;
            job.error = Some(reason.to_string());
        });
    }

    fn mark_job_superseded(&self, job_id: Uuid) {
        self.update_job(job_id, |job| {
            job.phase = JobPhase::Failed;
            job.error = Some("superseded by a newer preview request".to_string());
        });
    }

    fn update_job<F: FnOnce(&mut PreviewJob)>(&self, job_id: Uuid, apply: F) {
        let mut jobs = self.lock_jobs();
        if let Some(job) = jobs.get_mut(&job_id) {
            apply(job);
        }
    }

    fn lock_runs(&self) -> MutexGuard<'_, HashMap<RunKey, PayrollRun>> {
        match self.runs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<Uuid, PreviewJob>> {
        match self.jobs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
