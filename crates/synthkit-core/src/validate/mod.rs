//! # Validator
//!
//! Independent re-read of the persisted artifacts using each format's
//! inverse parser. Works only from the on-disk files and the schema —
//! never from in-process generation state. Every applicable check kind
//! gets exactly one coverage tick per column per row regardless of
//! outcome; failures tick the matching violation counter and mark the
//! row failed. Parse and coercion failures are `type` violations, never
//! errors.

pub mod report;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{Result, SynthKitError};
use crate::export::OutputFormat;
use crate::expr::RowContext;
use crate::generate::primitives::{
    parse_date_range, parse_datetime_range, parse_iso_date, parse_iso_datetime,
};
use crate::generate::row::Row;
use crate::generate::rules::evaluate_rules;
use crate::generate::value::Value;
use crate::schema::types::{ColumnSpec, ColumnType, SchemaSpec, TableSpec};
use report::{bump, TableReport, ValidationReport};

/// A row as read back from disk, before type coercion.
pub type RawRow = IndexMap<String, serde_json::Value>;

static NULL_RAW: serde_json::Value = serde_json::Value::Null;

/// Validate the persisted output of a dataset against its schema.
pub fn validate_output(
    schema: &SchemaSpec,
    out_dir: &Path,
    format: OutputFormat,
) -> Result<ValidationReport> {
    let mut table_rows: IndexMap<String, Vec<RawRow>> = IndexMap::new();
    for table_name in schema.tables.keys() {
        let path = out_dir.join(format.file_name(table_name));
        table_rows.insert(table_name.clone(), load_rows(&path, format)?);
    }

    // Primary-key sets are collected across all tables before per-row
    // validation so forward references resolve.
    let pk_sets: HashMap<String, HashSet<String>> = schema
        .tables
        .iter()
        .map(|(name, table)| (name.clone(), collect_pk(table, &table_rows[name])))
        .collect();

    let mut tables = IndexMap::new();
    let mut total_violations = 0;
    let mut aggregate_coverage: BTreeMap<String, usize> = BTreeMap::new();

    for (table_name, table) in &schema.tables {
        let table_report = validate_table(table, &table_rows[table_name], &pk_sets, schema);
        total_violations += table_report.violation_total();
        for (kind, count) in &table_report.constraint_coverage {
            *aggregate_coverage.entry(kind.clone()).or_insert(0) += count;
        }
        tables.insert(table_name.clone(), table_report);
    }

    Ok(ValidationReport {
        dataset: schema.dataset.name.clone(),
        mode: schema.dataset.mode.to_string(),
        total_violations,
        tables,
        constraint_coverage: aggregate_coverage,
    })
}

fn collect_pk(table: &TableSpec, rows: &[RawRow]) -> HashSet<String> {
    let mut set = HashSet::new();
    let Some(column) = table.columns.get(&table.primary_key) else {
        return set;
    };
    for row in rows {
        let raw = row.get(&table.primary_key).unwrap_or(&NULL_RAW);
        let (value, type_error) = coerce_value(raw, column);
        if let Some(value) = value {
            if !type_error {
                set.insert(value.to_unique_key());
            }
        }
    }
    set
}

fn validate_table(
    table: &TableSpec,
    rows: &[RawRow],
    pk_sets: &HashMap<String, HashSet<String>>,
    schema: &SchemaSpec,
) -> TableReport {
    let mut table_report = TableReport::new(&table.name, rows.len());
    let mut unique_seen: HashMap<&str, HashSet<String>> = table
        .columns
        .values()
        .filter(|col| col.unique)
        .map(|col| (col.name.as_str(), HashSet::new()))
        .collect();
    let regexes: HashMap<&str, Regex> = table
        .columns
        .values()
        .filter(|col| col.column_type.is_text_family())
        .filter_map(|col| {
            let pattern = col.regex.as_ref()?;
            Regex::new(&format!("^(?:{})$", pattern))
                .ok()
                .map(|re| (col.name.as_str(), re))
        })
        .collect();

    for row in rows {
        let mut row_failed = false;
        let mut parsed_row = Row::with_capacity(table.columns.len());

        for (col_name, column) in &table.columns {
            let raw = row.get(col_name).unwrap_or(&NULL_RAW);
            bump(&mut table_report.constraint_coverage, "type");
            let (value, type_error) = coerce_value(raw, column);
            parsed_row.insert(col_name.clone(), value.clone().unwrap_or(Value::Null));

            let Some(value) = value else {
                bump(&mut table_report.constraint_coverage, "nullable");
                if !column.nullable {
                    bump(&mut table_report.violations, "nullability");
                    row_failed = true;
                }
                continue;
            };
            if type_error {
                bump(&mut table_report.violations, "type");
                row_failed = true;
                continue;
            }

            let range_applies = column.range.as_ref().is_some_and(|r| !r.is_empty())
                && (column.column_type.is_numeric() || column.column_type.is_temporal());
            if range_applies {
                bump(&mut table_report.constraint_coverage, "range");
                if !check_range(&value, column) {
                    bump(&mut table_report.violations, "range");
                    row_failed = true;
                }
            }

            if column.regex.is_some() && column.column_type.is_text_family() {
                bump(&mut table_report.constraint_coverage, "regex");
                if let Some(re) = regexes.get(col_name.as_str()) {
                    let matched = value.as_str().map(|s| re.is_match(s)).unwrap_or(false);
                    if !matched {
                        bump(&mut table_report.violations, "regex");
                        row_failed = true;
                    }
                }
            }

            if column.column_type == ColumnType::Enum {
                if let Some(values) = column.values.as_deref().filter(|v| !v.is_empty()) {
                    bump(&mut table_report.constraint_coverage, "enum");
                    let member = value
                        .as_str()
                        .map(|s| values.iter().any(|v| v == s))
                        .unwrap_or(false);
                    if !member {
                        bump(&mut table_report.violations, "enum");
                        row_failed = true;
                    }
                }
            }

            if column.unique {
                bump(&mut table_report.constraint_coverage, "unique");
                let key = value.to_unique_key();
                if let Some(seen) = unique_seen.get_mut(col_name.as_str()) {
                    if seen.contains(&key) {
                        bump(&mut table_report.violations, "unique");
                        row_failed = true;
                    }
                    seen.insert(key);
                }
            }

            if let Some(fk) = table.foreign_key_for(col_name) {
                bump(&mut table_report.constraint_coverage, "foreign_key");
                let resolves = pk_sets
                    .get(&fk.ref_table)
                    .is_some_and(|pks| pks.contains(&value.to_unique_key()));
                if !resolves {
                    bump(&mut table_report.violations, "foreign_key");
                    row_failed = true;
                }
            }
        }

        bump(&mut table_report.constraint_coverage, "rules");
        let mut ctx = RowContext::new();
        ctx.insert(table.name.as_str(), &parsed_row);
        if !evaluate_rules(&schema.rules, &ctx).is_empty() {
            table_report.rule_violations += 1;
            row_failed = true;
        }

        if row_failed {
            table_report.failed_rows += 1;
        }
    }

    table_report
}

/// Coerce a raw on-disk value to the column's declared type.
///
/// Returns `(None, false)` for nulls (JSON null, empty string, or the
/// `NULL` sentinel) and `(Some(raw-as-text), true)` when coercion fails so
/// the caller can count a `type` violation while rules still see the raw
/// text.
fn coerce_value(raw: &serde_json::Value, column: &ColumnSpec) -> (Option<Value>, bool) {
    if raw.is_null() {
        return (None, false);
    }
    if let Some(s) = raw.as_str() {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "NULL" || trimmed == "null" {
            return (None, false);
        }
    }

    match column.column_type {
        ColumnType::Uuid => match raw.as_str().and_then(|s| uuid::Uuid::parse_str(s.trim()).ok())
        {
            Some(u) => (Some(Value::Uuid(u)), false),
            None => type_failure(raw),
        },
        ColumnType::Int => {
            if let Some(i) = raw.as_i64() {
                (Some(Value::Int(i)), false)
            } else if let Some(f) = raw.as_f64() {
                (Some(Value::Int(f.trunc() as i64)), false)
            } else if let Some(i) = raw.as_str().and_then(|s| s.trim().parse::<i64>().ok()) {
                (Some(Value::Int(i)), false)
            } else {
                type_failure(raw)
            }
        }
        ColumnType::Decimal => {
            if let Some(f) = raw.as_f64() {
                (Some(Value::Float(f)), false)
            } else if let Some(f) = raw.as_str().and_then(|s| s.trim().parse::<f64>().ok()) {
                (Some(Value::Float(f)), false)
            } else {
                type_failure(raw)
            }
        }
        ColumnType::Bool => {
            if let Some(b) = raw.as_bool() {
                return (Some(Value::Bool(b)), false);
            }
            match json_to_text(raw).to_ascii_lowercase().as_str() {
                "true" | "1" => (Some(Value::Bool(true)), false),
                "false" | "0" => (Some(Value::Bool(false)), false),
                _ => type_failure(raw),
            }
        }
        ColumnType::Datetime => match raw.as_str().and_then(parse_iso_datetime) {
            Some(dt) => (Some(Value::Timestamp(dt)), false),
            None => type_failure(raw),
        },
        ColumnType::Date => match raw.as_str().and_then(parse_iso_date) {
            Some(d) => (Some(Value::Date(d)), false),
            None => type_failure(raw),
        },
        ColumnType::Enum
        | ColumnType::Text
        | ColumnType::Email
        | ColumnType::Phone
        | ColumnType::Country
        | ColumnType::PostcodeUk
        | ColumnType::Name => (Some(Value::owned(json_to_text(raw))), false),
    }
}

fn type_failure(raw: &serde_json::Value) -> (Option<Value>, bool) {
    (Some(Value::owned(json_to_text(raw))), true)
}

fn json_to_text(raw: &serde_json::Value) -> String {
    match raw {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Inclusive range check on an already-coerced value.
fn check_range(value: &Value, column: &ColumnSpec) -> bool {
    match column.column_type {
        ColumnType::Int | ColumnType::Decimal => {
            match (column.numeric_range(), value.as_f64()) {
                (Some((min, max)), Some(v)) => v >= min && v <= max,
                _ => true,
            }
        }
        ColumnType::Date => match (parse_date_range(column.range.as_deref()), value) {
            ((Some(start), Some(end)), Value::Date(d)) => *d >= start && *d <= end,
            _ => true,
        },
        ColumnType::Datetime => match (parse_datetime_range(column.range.as_deref()), value) {
            ((Some(start), Some(end)), Value::Timestamp(ts)) => *ts >= start && *ts <= end,
            _ => true,
        },
        _ => true,
    }
}

/// Read a persisted table file back into raw rows. A missing file yields
/// zero rows; unparseable lines are skipped.
fn load_rows(path: &Path, format: OutputFormat) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path).map_err(|source| SynthKitError::Output {
        message: format!("reading {}", path.display()),
        source,
    })?;

    Ok(match format {
        OutputFormat::Csv => parse_csv(&text),
        OutputFormat::Jsonl => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<RawRow>(line).ok())
            .collect(),
        OutputFormat::Sql => text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| parse_sql_insert(line.trim()))
            .collect(),
    })
}

fn parse_csv(text: &str) -> Vec<RawRow> {
    let mut lines = text.lines().filter(|l| !l.is_empty());
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let header = split_csv_line(header_line);
    lines
        .map(|line| {
            let fields = split_csv_line(line);
            header
                .iter()
                .zip(fields)
                .map(|(col, field)| (col.clone(), serde_json::Value::String(field)))
                .collect()
        })
        .collect()
}

/// Split one CSV line, honoring double-quoted fields with `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
}

fn insert_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^INSERT INTO\s+(\w+)\s*\(([^)]+)\)\s*VALUES\s*\((.*)\);$")
            .expect("static insert pattern compiles")
    })
}

/// Parse one `INSERT INTO t (cols…) VALUES (…);` statement into a raw row.
fn parse_sql_insert(line: &str) -> Option<RawRow> {
    let captures = insert_pattern().captures(line)?;
    let columns: Vec<&str> = captures
        .get(2)?
        .as_str()
        .split(',')
        .map(str::trim)
        .collect();
    let values = split_sql_values(captures.get(3)?.as_str());
    Some(
        columns
            .iter()
            .zip(values)
            .map(|(col, val)| (col.to_string(), parse_sql_value(&val)))
            .collect(),
    )
}

/// Split a VALUES blob on commas outside single-quoted literals. An
/// escaped `''` inside a literal toggles the quote state twice and so
/// stays intact.
fn split_sql_values(blob: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    for c in blob.chars() {
        match c {
            '\'' => {
                in_string = !in_string;
                current.push(c);
            }
            ',' if !in_string => {
                values.push(current.trim().to_string());
                current.clear();
            }
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        values.push(current.trim().to_string());
    }
    values
}

fn parse_sql_value(value: &str) -> serde_json::Value {
    if value.eq_ignore_ascii_case("NULL") {
        return serde_json::Value::Null;
    }
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        let inner = &value[1..value.len() - 1];
        return serde_json::Value::String(inner.replace("''", "'"));
    }
    serde_json::Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema_from_yaml;

    fn users_schema() -> SchemaSpec {
        let yaml = r#"
dataset: { name: demo, seed: 1, mode: valid, size: { users: 1 } }
tables:
  users:
    primary_key: id
    columns:
      id: { type: uuid }
      age: { type: int, range: [0, 120] }
      status: { type: enum, values: [ACTIVE, INACTIVE] }
"#;
        schema_from_yaml(yaml).unwrap().0
    }

    #[test]
    fn test_clean_csv_has_no_violations() {
        let schema = users_schema();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("users.csv"),
            "id,age,status\n123e4567-e89b-12d3-a456-426614174000,30,ACTIVE\n",
        )
        .unwrap();

        let report = validate_output(&schema, dir.path(), OutputFormat::Csv).unwrap();
        assert_eq!(report.total_violations, 0);
        assert_eq!(report.tables["users"].row_count, 1);
        assert_eq!(report.tables["users"].failed_rows, 0);
    }

    #[test]
    fn test_out_of_range_value_is_one_range_violation() {
        let schema = users_schema();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("users.csv"),
            "id,age,status\n123e4567-e89b-12d3-a456-426614174000,200,ACTIVE\n",
        )
        .unwrap();

        let report = validate_output(&schema, dir.path(), OutputFormat::Csv).unwrap();
        assert_eq!(report.total_violations, 1);
        let table = &report.tables["users"];
        assert_eq!(table.violations.get("range"), Some(&1));
        assert_eq!(table.failed_rows, 1);
    }

    #[test]
    fn test_bad_uuid_and_enum_counted_separately() {
        let schema = users_schema();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("users.csv"),
            "id,age,status\nnot-a-uuid,30,GHOST\n",
        )
        .unwrap();

        let report = validate_output(&schema, dir.path(), OutputFormat::Csv).unwrap();
        let table = &report.tables["users"];
        assert_eq!(table.violations.get("type"), Some(&1));
        assert_eq!(table.violations.get("enum"), Some(&1));
        assert_eq!(table.failed_rows, 1);
    }

    #[test]
    fn test_null_in_non_nullable_column() {
        let schema = users_schema();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("users.csv"),
            "id,age,status\n123e4567-e89b-12d3-a456-426614174000,,ACTIVE\n",
        )
        .unwrap();

        let report = validate_output(&schema, dir.path(), OutputFormat::Csv).unwrap();
        let table = &report.tables["users"];
        assert_eq!(table.violations.get("nullability"), Some(&1));
        assert_eq!(table.constraint_coverage.get("nullable"), Some(&1));
    }

    #[test]
    fn test_coverage_at_least_violations() {
        let schema = users_schema();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("users.csv"),
            "id,age,status\nnot-a-uuid,200,GHOST\nnot-a-uuid,30,ACTIVE\n",
        )
        .unwrap();

        let report = validate_output(&schema, dir.path(), OutputFormat::Csv).unwrap();
        let table = &report.tables["users"];
        for (kind, violations) in &table.violations {
            let coverage = table.constraint_coverage.get(kind).copied().unwrap_or(0);
            assert!(
                coverage >= *violations,
                "kind {}: coverage {} < violations {}",
                kind,
                coverage,
                violations
            );
        }
    }

    #[test]
    fn test_missing_file_is_zero_rows() {
        let schema = users_schema();
        let dir = tempfile::tempdir().unwrap();
        let report = validate_output(&schema, dir.path(), OutputFormat::Csv).unwrap();
        assert_eq!(report.tables["users"].row_count, 0);
        assert_eq!(report.total_violations, 0);
    }

    #[test]
    fn test_split_csv_line_quotes() {
        assert_eq!(split_csv_line("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(
            split_csv_line("\"x,y\",plain,\"say \"\"hi\"\"\""),
            vec!["x,y", "plain", "say \"hi\""]
        );
        assert_eq!(split_csv_line("a,,c"), vec!["a", "", "c"]);
    }

    #[test]
    fn test_parse_sql_insert_with_escaped_quote() {
        let row =
            parse_sql_insert("INSERT INTO users (id, name) VALUES (1, 'O''Brien, Jr');").unwrap();
        assert_eq!(row["id"], serde_json::Value::String("1".to_string()));
        assert_eq!(
            row["name"],
            serde_json::Value::String("O'Brien, Jr".to_string())
        );
    }

    #[test]
    fn test_parse_sql_insert_null_sentinel() {
        let row = parse_sql_insert("INSERT INTO users (id, age) VALUES (1, NULL);").unwrap();
        assert!(row["age"].is_null());
    }

    #[test]
    fn test_non_insert_lines_are_skipped() {
        assert!(parse_sql_insert("-- comment").is_none());
        assert!(parse_sql_insert("BEGIN;").is_none());
    }

    #[test]
    fn test_sql_file_round_trip_counts_rows() {
        let schema = users_schema();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("users.sql"),
            "INSERT INTO users (id, age, status) VALUES ('123e4567-e89b-12d3-a456-426614174000', 30, 'ACTIVE');\n",
        )
        .unwrap();
        let report = validate_output(&schema, dir.path(), OutputFormat::Sql).unwrap();
        assert_eq!(report.tables["users"].row_count, 1);
        assert_eq!(report.total_violations, 0);
    }

    #[test]
    fn test_jsonl_nulls_and_numbers() {
        let yaml = r#"
dataset: { name: demo, seed: 1, size: { users: 1 } }
tables:
  users:
    primary_key: id
    columns:
      id: { type: uuid }
      age: { type: int, range: [0, 120], nullable: true }
"#;
        let schema = schema_from_yaml(yaml).unwrap().0;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("users.jsonl"),
            "{\"id\": \"123e4567-e89b-12d3-a456-426614174000\", \"age\": null}\n",
        )
        .unwrap();
        let report = validate_output(&schema, dir.path(), OutputFormat::Jsonl).unwrap();
        assert_eq!(report.total_violations, 0);
        assert_eq!(report.tables["users"].constraint_coverage.get("nullable"), Some(&1));
    }
}
