use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-table validation outcome: one violation tick per failed check kind,
/// one coverage tick per applicable check kind regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table: String,
    pub row_count: usize,
    #[serde(default)]
    pub violations: BTreeMap<String, usize>,
    #[serde(default)]
    pub rule_violations: usize,
    #[serde(default)]
    pub failed_rows: usize,
    #[serde(default)]
    pub constraint_coverage: BTreeMap<String, usize>,
    /// Spliced in by the orchestrator after generation; absent for
    /// standalone validator runs.
    #[serde(default)]
    pub repair_attempts: Option<usize>,
}

impl TableReport {
    pub fn new(table: impl Into<String>, row_count: usize) -> Self {
        Self {
            table: table.into(),
            row_count,
            violations: BTreeMap::new(),
            rule_violations: 0,
            failed_rows: 0,
            constraint_coverage: BTreeMap::new(),
            repair_attempts: None,
        }
    }

    /// All violations for this table, rule violations included.
    pub fn violation_total(&self) -> usize {
        self.violations.values().sum::<usize>() + self.rule_violations
    }
}

/// The dataset-wide validation report persisted as
/// `validation_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dataset: String,
    pub mode: String,
    pub total_violations: usize,
    pub tables: IndexMap<String, TableReport>,
    #[serde(default)]
    pub constraint_coverage: BTreeMap<String, usize>,
}

/// Bump a named counter.
pub(crate) fn bump(counter: &mut BTreeMap<String, usize>, key: &str) {
    *counter.entry(key.to_string()).or_insert(0) += 1;
}
