//! Challan models: aggregated statutory payment instruments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StatutoryType;

/// Challan lifecycle state. `Draft` challans may be regenerated; `Paid`
/// challans are locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallanStatus {
    /// Generated but not yet remitted.
    Draft,
    /// Remitted to the authority; immutable.
    Paid,
}

/// One employee's contribution within a challan, kept for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallanLine {
    /// The employee.
    pub employee_id: String,
    /// The employee's display name at generation time.
    pub employee_name: String,
    /// The employee's contribution.
    pub employee_share: Decimal,
    /// The employer's contribution for this employee.
    pub employer_share: Decimal,
}

/// An aggregated payment instrument for one statutory scheme across one
/// finalized payroll run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challan {
    /// Unique challan id.
    pub id: Uuid,
    /// The finalized run the challan was generated from.
    pub run_key: String,
    /// The statutory scheme.
    pub statutory_type: StatutoryType,
    /// Lifecycle state.
    pub status: ChallanStatus,
    /// Sum of employee shares.
    pub employee_share: Decimal,
    /// Sum of employer shares.
    pub employer_share: Decimal,
    /// One line per contributing employee.
    pub lines: Vec<ChallanLine>,
    /// Payment reference, set when marked paid.
    pub payment_ref: Option<String>,
    /// When the challan was generated.
    pub generated_at: DateTime<Utc>,
    /// When the challan was marked paid.
    pub paid_at: Option<DateTime<Utc>>,
}

impl Challan {
    /// The total amount payable to the authority.
    pub fn total(&self) -> Decimal {
        self.employee_share + self.employer_share
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_total_sums_both_shares() {
        let challan = Challan {
            id: Uuid::nil(),
            run_key: "acme/2024-04/regular".to_string(),
            statutory_type: StatutoryType::Pf,
            status: ChallanStatus::Draft,
            employee_share: dec("3600"),
            employer_share: dec("3600"),
            lines: vec![],
            payment_ref: None,
            generated_at: Utc::now(),
            paid_at: None,
        };

        assert_eq!(challan.total(), dec("7200"));
    }

    #[test]
    fn test_challan_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ChallanStatus::Draft).unwrap(),
            "\"draft\""
        );
        assert_eq!(
            serde_json::to_string(&ChallanStatus::Paid).unwrap(),
            "\"paid\""
        );
    }
}
