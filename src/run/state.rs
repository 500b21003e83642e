//! Payroll run state machine.
//!
//! A run moves `preview_queued -> preview_processing -> preview_ready ->
//! finalized`, with a terminal `failed` reachable from processing. Every
//! non-finalized state carries the generation that owns it; a batch job
//! whose generation no longer matches the run's current generation has been
//! superseded and must discard its result.

use serde::{Deserialize, Serialize};

use crate::models::{Payslip, PreviewSnapshot, RunKey, RunSummary};

/// The lifecycle state of a payroll run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    /// A preview has been requested; the batch job has not started yet.
    PreviewQueued {
        /// The generation that owns this preview.
        generation: u64,
    },
    /// The batch job is consuming the employee population.
    PreviewProcessing {
        /// The generation that owns this preview.
        generation: u64,
    },
    /// The snapshot is attached and the run can be finalized.
    PreviewReady {
        /// The computed snapshot, tagged with its generation.
        snapshot: PreviewSnapshot,
    },
    /// The run is sealed; payslips and totals are immutable.
    Finalized {
        /// The immutable payslip set.
        payslips: Vec<Payslip>,
        /// The immutable run totals.
        summary: RunSummary,
    },
    /// A systemic fault aborted the batch. Terminal.
    Failed {
        /// Why the run failed.
        reason: String,
    },
}

impl RunState {
    /// The state name used in conflict errors and API payloads.
    pub fn name(&self) -> &'static str {
        match self {
            RunState::PreviewQueued { .. } => "preview_queued",
            RunState::PreviewProcessing { .. } => "preview_processing",
            RunState::PreviewReady { .. } => "preview_ready",
            RunState::Finalized { .. } => "finalized",
            RunState::Failed { .. } => "failed",
        }
    }

    /// The generation owning the state, for states that carry one.
    pub fn generation(&self) -> Option<u64> {
        match self {
            RunState::PreviewQueued { generation } | RunState::PreviewProcessing { generation } => {
                Some(*generation)
            }
            RunState::PreviewReady { snapshot } => Some(snapshot.generation),
            RunState::Finalized { .. } | RunState::Failed { .. } => None,
        }
    }
}

/// A payroll run: its identity, its current generation, and its state.
///
/// The generation counts preview requests; each new request bumps it, which
/// invalidates any in-flight batch job started under an older generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// The run identity.
    pub key: RunKey,
    /// The current generation; preview states must match it to be live.
    pub generation: u64,
    /// The lifecycle state.
    pub state: RunState,
}

impl PayrollRun {
    /// Creates a run queued for its first preview.
    pub fn new(key: RunKey) -> Self {
        Self {
            key,
            generation: 1,
            state: RunState::PreviewQueued { generation: 1 },
        }
    }

    /// Queues a fresh preview, superseding whatever preview state existed.
    /// Any prior snapshot is discarded and in-flight jobs become stale.
    pub fn requeue_preview(&mut self) -> u64 {
        self.generation += 1;
        self.state = RunState::PreviewQueued {
            generation: self.generation,
        };
        self.generation
    }

    /// True if `generation` is still the run's current generation.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunType;

    fn key() -> RunKey {
        RunKey::new("acme", 4, 2024, RunType::Regular)
    }

    #[test]
    fn test_new_run_is_queued_at_generation_one() {
        let run = PayrollRun::new(key());
        assert_eq!(run.generation, 1);
        assert_eq!(run.state.name(), "preview_queued");
        assert_eq!(run.state.generation(), Some(1));
    }

    #[test]
    fn test_requeue_bumps_generation_and_discards_state() {
        let mut run = PayrollRun::new(key());
        run.state = RunState::PreviewReady {
            snapshot: PreviewSnapshot::new(1, vec![], vec![]),
        };

        let generation = run.requeue_preview();
        assert_eq!(generation, 2);
        assert_eq!(run.state.name(), "preview_queued");
        assert!(!run.is_current(1));
        assert!(run.is_current(2));
    }

    #[test]
    fn test_state_names() {
        assert_eq!(
            RunState::PreviewProcessing { generation: 1 }.name(),
            "preview_processing"
        );
        assert_eq!(
            RunState::Failed {
                reason: "storage".to_string()
            }
            .name(),
            "failed"
        );
    }

    #[test]
    fn test_terminal_states_carry_no_generation() {
        let failed = RunState::Failed {
            reason: "x".to_string(),
        };
        assert_eq!(failed.generation(), None);
    }
}
