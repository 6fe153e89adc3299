//! # Generation Orchestrator
//!
//! Walks the planner order, drives the row builder and repair loop for
//! each table, streams accepted rows to the table's exporter, and finally
//! runs the validator over the persisted output. Owns the primary-key
//! pools and unique sets; the builder only reads them, and the acceptance
//! path below is the only writer.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SynthKitError};
use crate::export::{open_exporter, OutputFormat};
use crate::generate::row::{repair_loop, Row, RowBuilder};
use crate::generate::unique::{PkPools, UniqueSets};
use crate::graph::plan_tables;
use crate::schema::types::{Mode, SchemaSpec, TableSpec};
use crate::validate::report::ValidationReport;
use crate::validate::validate_output;

/// Progress reporting batch size; avoids callback overhead on every row.
const PROGRESS_BATCH_SIZE: usize = 100;

/// The record persisted as `run_metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub dataset_id: String,
    pub dataset_name: String,
    pub seed: u64,
    pub mode: String,
    pub timestamp: String,
    pub config_hash: String,
    pub format: String,
    pub row_counts: IndexMap<String, usize>,
    pub tables: Vec<String>,
    pub max_attempts: usize,
}

/// Generate the dataset described by `schema` into `out_dir`, then
/// validate the persisted files and write both `run_metadata.json` and
/// `validation_report.json`.
///
/// `progress` is invoked with `(table, rows_done, total_rows)` every
/// [`PROGRESS_BATCH_SIZE`] rows and at completion.
pub fn generate_dataset(
    schema: &SchemaSpec,
    config_hash: &str,
    out_dir: &Path,
    format: OutputFormat,
    progress: Option<&dyn Fn(&str, usize, usize)>,
) -> Result<RunMetadata> {
    std::fs::create_dir_all(out_dir).map_err(|source| SynthKitError::Output {
        message: format!("creating output directory {}", out_dir.display()),
        source,
    })?;

    let dataset_id = uuid::Uuid::new_v4().to_string();
    let root_rng = crate::rng::Rng::with_seed(schema.dataset.seed);
    let order = plan_tables(schema)?;

    let total_rows: usize = order
        .iter()
        .map(|t| schema.dataset.size.rows_for(t))
        .sum();
    let mut rows_done = 0usize;

    let mut pk_pools = PkPools::new();
    let mut row_counts: IndexMap<String, usize> = IndexMap::new();
    let mut repair_attempts: HashMap<String, usize> = HashMap::new();

    for table_name in &order {
        let Some(table) = schema.tables.get(table_name) else {
            continue;
        };
        let mut table_rng = root_rng.derive(table_name);
        let row_count = schema.dataset.size.rows_for(table_name);
        row_counts.insert(table_name.clone(), row_count);
        pk_pools.open_table(table_name);

        let mut unique_sets = UniqueSets::for_table(table);
        let mut pk_set: HashSet<String> = HashSet::new();
        let columns: Vec<String> = table.columns.keys().cloned().collect();
        let mut exporter = open_exporter(format, out_dir, table_name, columns)?;
        let mut builder = RowBuilder::new(schema, table, &mut table_rng);
        let mut attempts_total = 0usize;

        for row_index in 0..row_count {
            let row = match schema.dataset.mode {
                Mode::Valid => {
                    let outcome = repair_loop(
                        &mut builder,
                        &pk_pools,
                        &unique_sets,
                        &pk_set,
                        schema.dataset.max_attempts,
                    );
                    attempts_total += outcome.attempts;
                    if !outcome.success {
                        warn!(
                            table = %table_name,
                            row_index,
                            "row_generation_failed"
                        );
                    }
                    outcome.row
                }
                Mode::Invalid => builder.candidate(&pk_pools),
            };

            register_row(table, &row, &mut pk_pools, &mut unique_sets, &mut pk_set);

            if let Err(err) = exporter.write_row(&row) {
                let _ = exporter.finish();
                return Err(err);
            }
            rows_done += 1;
            if let Some(cb) = progress {
                if rows_done % PROGRESS_BATCH_SIZE == 0 || rows_done == total_rows {
                    cb(table_name, rows_done, total_rows);
                }
            }
        }

        exporter.finish()?;
        repair_attempts.insert(table_name.clone(), attempts_total);
        info!(table = %table_name, rows = row_count, "table_generated");
    }

    let metadata = RunMetadata {
        dataset_id,
        dataset_name: schema.dataset.name.clone(),
        seed: schema.dataset.seed,
        mode: schema.dataset.mode.to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        config_hash: config_hash.to_string(),
        format: format.to_string(),
        row_counts: row_counts.clone(),
        tables: row_counts.keys().cloned().collect(),
        max_attempts: schema.dataset.max_attempts,
    };
    write_json(&out_dir.join("run_metadata.json"), &metadata)?;

    let mut report = validate_output(schema, out_dir, format)?;
    splice_repair_attempts(&mut report, &repair_attempts);
    write_json(&out_dir.join("validation_report.json"), &report)?;

    Ok(metadata)
}

/// Record an emitted row's primary key and unique values. Exhausted rows
/// are persisted too, so their keys enter the pools like any other.
fn register_row(
    table: &TableSpec,
    row: &Row,
    pk_pools: &mut PkPools,
    unique_sets: &mut UniqueSets,
    pk_set: &mut HashSet<String>,
) {
    if let Some(pk_value) = row.get(&table.primary_key) {
        if !pk_value.is_null() {
            pk_set.insert(pk_value.to_unique_key());
            pk_pools.record(&table.name, pk_value.clone());
        }
    }
    for (col_name, column) in &table.columns {
        if column.unique {
            if let Some(value) = row.get(col_name) {
                if !value.is_null() {
                    unique_sets.record(col_name, value);
                }
            }
        }
    }
}

fn splice_repair_attempts(report: &mut ValidationReport, attempts: &HashMap<String, usize>) {
    for (table_name, total) in attempts {
        if let Some(table_report) = report.tables.get_mut(table_name) {
            table_report.repair_attempts = Some(*total);
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| {
        SynthKitError::config(format!("serializing {}: {}", path.display(), e))
    })?;
    std::fs::write(path, text).map_err(|source| SynthKitError::Output {
        message: format!("writing {}", path.display()),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::shop_schema;

    #[test]
    fn test_generate_writes_tables_metadata_and_report() {
        let schema = shop_schema(Mode::Valid);
        let dir = tempfile::tempdir().unwrap();
        let metadata =
            generate_dataset(&schema, "cafe01", dir.path(), OutputFormat::Csv, None).unwrap();

        assert_eq!(metadata.dataset_name, "shop");
        assert_eq!(metadata.row_counts["customers"], 5);
        assert_eq!(metadata.row_counts["orders"], 10);
        assert!(dir.path().join("customers.csv").exists());
        assert!(dir.path().join("orders.csv").exists());
        assert!(dir.path().join("run_metadata.json").exists());
        assert!(dir.path().join("validation_report.json").exists());

        let report_text =
            std::fs::read_to_string(dir.path().join("validation_report.json")).unwrap();
        let report: ValidationReport = serde_json::from_str(&report_text).unwrap();
        assert!(report.tables["orders"].repair_attempts.is_some());
    }

    #[test]
    fn test_parent_generated_before_child() {
        let schema = shop_schema(Mode::Valid);
        let dir = tempfile::tempdir().unwrap();
        generate_dataset(&schema, "cafe01", dir.path(), OutputFormat::Csv, None).unwrap();

        // every order references a customer, which is only possible when
        // the customers pool was filled first
        let report = validate_output(&schema, dir.path(), OutputFormat::Csv).unwrap();
        assert_eq!(report.tables["orders"].violations.get("foreign_key"), None);
    }

    #[test]
    fn test_progress_callback_reports_completion() {
        let schema = shop_schema(Mode::Valid);
        let dir = tempfile::tempdir().unwrap();
        let seen = std::cell::RefCell::new(Vec::new());
        let callback = |table: &str, done: usize, total: usize| {
            seen.borrow_mut().push((table.to_string(), done, total));
        };
        generate_dataset(&schema, "cafe01", dir.path(), OutputFormat::Csv, Some(&callback))
            .unwrap();
        let calls = seen.borrow();
        assert_eq!(calls.last(), Some(&("orders".to_string(), 15, 15)));
    }

    #[test]
    fn test_repair_bound_property() {
        let schema = shop_schema(Mode::Valid);
        let dir = tempfile::tempdir().unwrap();
        generate_dataset(&schema, "cafe01", dir.path(), OutputFormat::Csv, None).unwrap();
        let report_text =
            std::fs::read_to_string(dir.path().join("validation_report.json")).unwrap();
        let report: ValidationReport = serde_json::from_str(&report_text).unwrap();
        for (table_name, table_report) in &report.tables {
            let rows = schema.dataset.size.rows_for(table_name);
            let attempts = table_report.repair_attempts.unwrap_or(0);
            assert!(attempts <= rows * schema.dataset.max_attempts);
            assert!(attempts >= rows);
        }
    }
}
