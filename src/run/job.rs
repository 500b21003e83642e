//! Preview batch job tracking.
//!
//! A preview request returns a job handle immediately; the batch runs in
//! the background and the handle is polled for phase and progress. Jobs are
//! bound to the run generation that created them; a superseded job finishes
//! in the `failed` phase with a superseded reason and its result is
//! discarded.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{PreviewSnapshot, RunKey};

/// Where a preview job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Accepted, not yet started.
    Queued,
    /// Consuming the employee population.
    Processing,
    /// Snapshot attached to the run.
    Completed,
    /// Aborted by a systemic fault, timeout, or supersession.
    Failed,
}

/// Coarse progress: employees processed out of the period's population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Employees processed so far (successes and per-employee errors).
    pub processed: usize,
    /// Total employees in the batch.
    pub total: usize,
}

/// The tracked state of one preview job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewJob {
    /// The job handle returned to the caller.
    pub id: Uuid,
    /// The run this job computes a preview for.
    pub run_key: RunKey,
    /// The run generation the job was started under.
    pub generation: u64,
    /// Current phase.
    pub phase: JobPhase,
    /// Coarse progress indicator.
    pub progress: JobProgress,
    /// Failure reason, set only in the `failed` phase.
    pub error: Option<String>,
}

impl PreviewJob {
    /// Creates a queued job for a run generation.
    pub fn new(run_key: RunKey, generation: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            run_key,
            generation,
            phase: JobPhase::Queued,
            progress: JobProgress::default(),
            error: None,
        }
    }

    /// True once the job can no longer change phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, JobPhase::Completed | JobPhase::Failed)
    }
}

/// The answer to a preview poll: the job's phase and progress, plus the
/// snapshot once the job has completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewPoll {
    /// The polled job id.
    pub job_id: Uuid,
    /// Current phase.
    pub phase: JobPhase,
    /// Coarse progress indicator.
    pub progress: JobProgress,
    /// The snapshot, present only when the phase is `completed` and the
    /// run still holds this job's result.
    pub snapshot: Option<PreviewSnapshot>,
    /// Failure reason, present only when the phase is `failed`.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunType;

    #[test]
    fn test_new_job_is_queued() {
        let job = PreviewJob::new(RunKey::new("acme", 4, 2024, RunType::Regular), 1);
        assert_eq!(job.phase, JobPhase::Queued);
        assert_eq!(job.progress, JobProgress::default());
        assert!(!job.is_terminal());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_terminal_phases() {
        let mut job = PreviewJob::new(RunKey::new("acme", 4, 2024, RunType::Regular), 1);
        job.phase = JobPhase::Completed;
        assert!(job.is_terminal());
        job.phase = JobPhase::Failed;
        assert!(job.is_terminal());
    }

    #[test]
    fn test_phase_serialization() {
        assert_eq!(
            serde_json::to_string(&JobPhase::Processing).unwrap(),
            "\"processing\""
        );
    }
}
