//! Rule set storage and effective-date selection.
//!
//! The [`RuleSetStore`] holds an immutable, effective-date-sorted list of
//! statutory rule sets and answers "which rule set applies on this date"
//! with a binary search. Stores are built either in code or by loading a
//! directory of YAML files, one rule set per file.

use chrono::NaiveDate;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::StatutoryRuleSet;

/// An immutable collection of statutory rule sets, sorted by
/// `effective_from`.
///
/// # Example
///
/// ```
/// use payroll_engine::config::{RuleSetStore, StatutoryRuleSet};
/// use chrono::NaiveDate;
///
/// let store = RuleSetStore::new(vec![StatutoryRuleSet {
///     version: "v2024_04".to_string(),
///     name: "FY 2024-25".to_string(),
///     effective_from: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
///     pf: None,
///     esi: None,
///     pt: None,
/// }]);
///
/// let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
/// assert_eq!(store.active_for(date).unwrap().version, "v2024_04");
/// ```
#[derive(Debug, Clone)]
pub struct RuleSetStore {
    /// Rule sets sorted by effective_from ascending.
    rule_sets: Vec<StatutoryRuleSet>,
}

impl RuleSetStore {
    /// Creates a store from rule sets in any order.
    pub fn new(rule_sets: Vec<StatutoryRuleSet>) -> Self {
        let mut sorted = rule_sets;
        sorted.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));
        Self { rule_sets: sorted }
    }

    /// Loads every `.yaml` file in a directory as a rule set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the directory is missing or holds no
    /// rule set files, and `ConfigParse` for unparseable files.
    pub fn load<P: AsRef<Path>>(dir: P) -> EngineResult<Self> {
        let dir = dir.as_ref();
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut rule_sets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let path_str = path.display().to_string();
                let content =
                    fs::read_to_string(&path).map_err(|_| EngineError::ConfigNotFound {
                        path: path_str.clone(),
                    })?;
                let rule_set: StatutoryRuleSet = serde_yaml::from_str(&content).map_err(|e| {
                    EngineError::ConfigParse {
                        path: path_str,
                        message: e.to_string(),
                    }
                })?;
                rule_sets.push(rule_set);
            }
        }

        if rule_sets.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no rule set files found)", dir_str),
            });
        }

        Ok(Self::new(rule_sets))
    }

    /// Returns the rule set active on `date`: the one with the greatest
    /// `effective_from` that is on or before the date.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveRuleSet` when no rule set is effective yet.
    pub fn active_for(&self, date: NaiveDate) -> EngineResult<&StatutoryRuleSet> {
        let idx = self
            .rule_sets
            .partition_point(|rs| rs.effective_from <= date);
        if idx == 0 {
            return Err(EngineError::NoActiveRuleSet { date });
        }
        Ok(&self.rule_sets[idx - 1])
    }

    /// All rule sets, oldest first.
    pub fn rule_sets(&self) -> &[StatutoryRuleSet] {
        &self.rule_sets
    }
}
