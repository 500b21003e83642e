//! Request types for the payroll engine API.

use serde::{Deserialize, Serialize};

use crate::models::{RunKey, RunType, StatutoryType};

/// Identifies the payroll run a request targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSelector {
    /// The owning tenant.
    pub tenant_id: String,
    /// Period month (1-12).
    pub period_month: u32,
    /// Period year.
    pub period_year: i32,
    /// The kind of run; defaults to the regular monthly run.
    #[serde(default = "default_run_type")]
    pub run_type: RunType,
}

fn default_run_type() -> RunType {
    RunType::Regular
}

impl RunSelector {
    /// The run key this selector names.
    pub fn run_key(&self) -> RunKey {
        RunKey::new(
            self.tenant_id.clone(),
            self.period_month,
            self.period_year,
            self.run_type,
        )
    }
}

/// Body of `POST /payroll/preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// The run to preview.
    #[serde(flatten)]
    pub run: RunSelector,
}

/// Body of `POST /payroll/finalize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeRequest {
    /// The run to finalize.
    #[serde(flatten)]
    pub run: RunSelector,
    /// Acknowledges skipped employees in the preview snapshot.
    #[serde(default)]
    pub override_skips: bool,
}

/// Body of `POST /payroll/challans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallanRequest {
    /// The finalized run to aggregate.
    #[serde(flatten)]
    pub run: RunSelector,
    /// The statutory scheme to aggregate.
    pub statutory_type: StatutoryType,
}

/// Body of `POST /payroll/challans/{id}/pay`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkPaidRequest {
    /// External payment reference for the remittance.
    pub payment_ref: String,
}
