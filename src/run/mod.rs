//! Payroll run lifecycle: the state machine, preview job tracking, and the
//! orchestrator that drives runs from preview request through finalization.

pub mod job;
pub mod orchestrator;
pub mod state;

pub use job::{JobPhase, JobProgress, PreviewJob, PreviewPoll};
pub use orchestrator::PayrollOrchestrator;
pub use state::{PayrollRun, RunState};
