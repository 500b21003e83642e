//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::challan::ChallanBook;
use crate::run::PayrollOrchestrator;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the run
/// orchestrator and the challan book.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<PayrollOrchestrator>,
    challans: Arc<ChallanBook>,
}

impl AppState {
    /// Creates a new application state around an orchestrator.
    pub fn new(orchestrator: Arc<PayrollOrchestrator>) -> Self {
        Self {
            orchestrator,
            challans: Arc::new(ChallanBook::new()),
        }
    }

    /// The run orchestrator.
    pub fn orchestrator(&self) -> &Arc<PayrollOrchestrator> {
        &self.orchestrator
    }

    /// The challan book.
    pub fn challans(&self) -> &ChallanBook {
        &self.challans
    }
}
