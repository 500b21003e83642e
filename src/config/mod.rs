//! Statutory rule configuration for the payroll engine.
//!
//! Rule sets are versioned and date-effective; the [`RuleSetStore`] selects
//! the set active on a calculation date.

mod loader;
mod types;

pub use loader::RuleSetStore;
pub use types::{EsiRule, PfRule, PtRule, PtSlab, StatutoryRuleSet};
