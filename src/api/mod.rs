//! HTTP API module for the payroll engine.
//!
//! This module provides the REST endpoints for driving payroll runs:
//! preview, polling, finalization, and challan management.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ChallanRequest, FinalizeRequest, MarkPaidRequest, PreviewRequest, RunSelector};
pub use response::{ApiError, PreviewAccepted};
pub use state::AppState;
