//! Challan aggregation over finalized payroll runs.
//!
//! A challan rolls up one statutory scheme's contributions across every
//! payslip of a finalized run into a single payable instrument, with one
//! line per contributing employee for auditability. Draft challans may be
//! regenerated (the figures are replaced in place); a paid challan is
//! locked forever.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Challan, ChallanLine, ChallanStatus, Payslip, StatutoryType};

/// Holds every generated challan, keyed by id and by (run, scheme).
#[derive(Debug, Default)]
pub struct ChallanBook {
    inner: Mutex<Challans>,
}

#[derive(Debug, Default)]
struct Challans {
    by_id: HashMap<Uuid, Challan>,
    by_run: HashMap<(String, StatutoryType), Uuid>,
}

impl ChallanBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates (or regenerates) the challan for one run and scheme from
    /// the run's payslips. Employees without a share in the scheme are
    /// omitted from the lines.
    ///
    /// Regeneration keeps the challan id and replaces the figures; it is
    /// the caller's job to pass the payslips of a finalized run.
    ///
    /// # Errors
    ///
    /// Returns `ChallanLocked` if the existing challan is paid; the record
    /// is left unchanged.
    pub fn generate(
        &self,
        run_key: &str,
        statutory_type: StatutoryType,
        payslips: &[Payslip],
    ) -> EngineResult<Challan> {
        let mut inner = self.lock();

        let existing_id = inner
            .by_run
            .get(&(run_key.to_string(), statutory_type))
            .copied();
        if let Some(id) = existing_id {
            if let Some(existing) = inner.by_id.get(&id) {
                if existing.status == ChallanStatus::Paid {
                    return Err(EngineError::ChallanLocked {
                        challan_id: id.to_string(),
                    });
                }
            }
        }

        let mut lines = Vec::new();
        let mut employee_share = Decimal::ZERO;
        let mut employer_share = Decimal::ZERO;
        for payslip in payslips {
            let Some(share) = payslip
                .pay
                .statutory
                .iter()
                .find(|s| s.statutory_type == statutory_type)
            else {
                continue;
            };
            employee_share += share.employee_share;
            employer_share += share.employer_share;
            lines.push(ChallanLine {
                employee_id: payslip.employee_id.clone(),
                employee_name: payslip.employee_name.clone(),
                employee_share: share.employee_share,
                employer_share: share.employer_share,
            });
        }

        let id = existing_id.unwrap_or_else(Uuid::new_v4);
        let challan = Challan {
            id,
            run_key: run_key.to_string(),
            statutory_type,
            status: ChallanStatus::Draft,
            employee_share,
            employer_share,
            lines,
            payment_ref: None,
            generated_at: Utc::now(),
            paid_at: None,
        };

        info!(
            run_key,
            scheme = statutory_type.code(),
            %id,
            employees = challan.lines.len(),
            "Challan generated"
        );
        inner.by_id.insert(id, challan.clone());
        inner
            .by_run
            .insert((run_key.to_string(), statutory_type), id);
        Ok(challan)
    }

    /// Fetches a challan by id.
    ///
    /// # Errors
    ///
    /// Returns `ChallanNotFound` for an unknown id.
    pub fn get(&self, id: Uuid) -> EngineResult<Challan> {
        self.lock()
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::ChallanNotFound {
                challan_id: id.to_string(),
            })
    }

    /// Marks a draft challan paid with an external payment reference. This
    /// is one-way: the challan is locked from then on.
    ///
    /// # Errors
    ///
    /// Returns `ChallanNotFound` for an unknown id and `ChallanLocked` if
    /// the challan is already paid.
    pub fn mark_paid(&self, id: Uuid, payment_ref: &str) -> EngineResult<Challan> {
        let mut inner = self.lock();
        let challan = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| EngineError::ChallanNotFound {
                challan_id: id.to_string(),
            })?;

        if challan.status == ChallanStatus::Paid {
            return Err(EngineError::ChallanLocked {
                challan_id: id.to_string(),
            });
        }

        challan.status = ChallanStatus::Paid;
        challan.payment_ref = Some(payment_ref.to_string());
        challan.paid_at = Some(Utc::now());
        info!(%id, payment_ref, "Challan marked paid");
        Ok(challan.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Challans> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
