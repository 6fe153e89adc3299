//! # Row Builder & Repair Loop
//!
//! `RowBuilder` assembles candidate rows column by column: foreign keys
//! sample the parent's primary-key pool, every other column runs its typed
//! primitive, and each produced value passes through the edge-case
//! injector. In valid mode the repair loop resamples a row until the local
//! validity predicate passes or the attempt cap is reached; the retry
//! policy lives here and nowhere else.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use regex::Regex;

use crate::expr::RowContext;
use crate::generate::corpus;
use crate::generate::edge_cases::apply_edge_cases;
use crate::generate::primitives;
use crate::generate::rules::evaluate_rules;
use crate::generate::unique::{PkPools, UniqueSets};
use crate::generate::value::Value;
use crate::rng::Rng;
use crate::schema::types::{ColumnSpec, ColumnType, Mode, SchemaSpec, TableSpec};

/// A finished row: column name → typed value, in declared column order.
pub type Row = IndexMap<String, Value>;

/// Probability that an invalid-mode foreign-key draw is a deliberately
/// broken reference instead of a pool sample.
const BROKEN_FK_PROB: f64 = 0.20;

/// Assembles candidate rows for one table.
///
/// Carries explicit borrows of the schema, table, and table RNG instead of
/// capturing them in closures; the orchestrator owns the pool and
/// unique-set lifetimes and passes them per call.
pub struct RowBuilder<'a> {
    schema: &'a SchemaSpec,
    table: &'a TableSpec,
    rng: &'a mut Rng,
    regexes: HashMap<String, Regex>,
}

impl<'a> RowBuilder<'a> {
    pub fn new(schema: &'a SchemaSpec, table: &'a TableSpec, rng: &'a mut Rng) -> Self {
        // Anchored compile of each declared text pattern; unparseable
        // patterns drop out of local validation rather than failing rows
        // forever.
        let regexes = table
            .columns
            .iter()
            .filter(|(_, col)| col.column_type == ColumnType::Text)
            .filter_map(|(name, col)| {
                let pattern = col.regex.as_ref()?;
                Regex::new(&format!("^(?:{})$", pattern))
                    .ok()
                    .map(|re| (name.clone(), re))
            })
            .collect();
        Self {
            schema,
            table,
            rng,
            regexes,
        }
    }

    /// Build one candidate row: primitive, then edge-case injector, per
    /// column in declared order.
    pub fn candidate(&mut self, pools: &PkPools) -> Row {
        let mut row = Row::with_capacity(self.table.columns.len());
        let mode = self.schema.dataset.mode;
        for (col_name, column) in &self.table.columns {
            let value = generate_value(self.table, column, self.rng, pools, mode);
            let value = apply_edge_cases(value, column, mode, self.rng);
            row.insert(col_name.clone(), value);
        }
        row
    }

    /// The local validity predicate: nullability, uniqueness, primary-key
    /// freshness, enum membership, numeric range, regex, referential
    /// integrity, then the rules engine.
    pub fn is_locally_valid(
        &self,
        row: &Row,
        pools: &PkPools,
        unique_sets: &UniqueSets,
        pk_set: &HashSet<String>,
    ) -> bool {
        for (col_name, column) in &self.table.columns {
            let value = row.get(col_name).unwrap_or(&Value::Null);
            if value.is_null() {
                if !column.nullable {
                    return false;
                }
                continue;
            }
            if column.unique && unique_sets.contains(col_name, value) {
                return false;
            }
            if *col_name == self.table.primary_key && pk_set.contains(&value.to_unique_key()) {
                return false;
            }
            if column.column_type == ColumnType::Enum {
                if let Some(values) = column.values.as_deref().filter(|v| !v.is_empty()) {
                    match value.as_str() {
                        Some(s) if values.iter().any(|v| v == s) => {}
                        _ => return false,
                    }
                }
            }
            if column.column_type.is_numeric() {
                if let Some((min, max)) = column.numeric_range() {
                    let numeric = value
                        .as_f64()
                        .or_else(|| value.as_str().and_then(|s| s.parse().ok()));
                    match numeric {
                        Some(n) if n >= min && n <= max => {}
                        _ => return false,
                    }
                }
            }
            if let Some(re) = self.regexes.get(col_name) {
                match value.as_str() {
                    Some(s) if re.is_match(s) => {}
                    _ => return false,
                }
            }
            if let Some(fk) = self.table.foreign_key_for(col_name) {
                if !pools.contains(&fk.ref_table, value) {
                    return false;
                }
            }
        }

        let mut ctx = RowContext::new();
        ctx.insert(self.table.name.as_str(), row);
        evaluate_rules(&self.schema.rules, &ctx).is_empty()
    }
}

/// Produce the raw value for one column, before edge-case injection.
fn generate_value(
    table: &TableSpec,
    column: &ColumnSpec,
    rng: &mut Rng,
    pools: &PkPools,
    mode: Mode,
) -> Value {
    if let Some(fk) = table.foreign_key_for(&column.name) {
        if mode == Mode::Invalid && rng.random() < BROKEN_FK_PROB {
            return broken_reference(column, rng);
        }
        return pools.pick(&fk.ref_table, rng).unwrap_or(Value::Null);
    }

    match column.column_type {
        ColumnType::Uuid => Value::Uuid(primitives::generate_uuid(rng)),
        ColumnType::Int => {
            let (min, max) = split_range(column);
            Value::Int(primitives::generate_int(rng, min, max, column.distribution))
        }
        ColumnType::Decimal => {
            let (min, max) = split_range(column);
            Value::Float(primitives::generate_decimal(rng, min, max, column.distribution))
        }
        ColumnType::Bool => Value::Bool(primitives::generate_bool(rng)),
        ColumnType::Datetime => {
            let (start, end) = primitives::parse_datetime_range(column.range.as_deref());
            Value::Timestamp(primitives::generate_datetime(rng, start, end))
        }
        ColumnType::Date => {
            let (start, end) = primitives::parse_date_range(column.range.as_deref());
            Value::Date(primitives::generate_date(rng, start, end))
        }
        ColumnType::Enum => Value::owned(primitives::generate_enum(
            rng,
            column.values.as_deref().unwrap_or(&[]),
            column.weights.as_deref(),
        )),
        ColumnType::Text => match &column.regex {
            Some(pattern) => Value::owned(primitives::generate_text_from_regex(rng, pattern)),
            None => {
                let lengths = column.length_pair();
                Value::owned(primitives::generate_text(
                    rng,
                    lengths.map(|l| l.0),
                    lengths.map(|l| l.1),
                ))
            }
        },
        ColumnType::Email => Value::owned(corpus::email(rng)),
        ColumnType::Phone => Value::owned(corpus::phone(rng)),
        ColumnType::Country => Value::borrowed(corpus::country(rng)),
        ColumnType::PostcodeUk => Value::owned(corpus::postcode_uk(rng)),
        ColumnType::Name => Value::owned(corpus::full_name(rng)),
    }
}

/// A reference guaranteed (up to collision odds) to dangle: null half the
/// time, otherwise a fresh value of the column's type that was never
/// recorded in the parent pool.
fn broken_reference(column: &ColumnSpec, rng: &mut Rng) -> Value {
    if rng.random() < 0.5 {
        return Value::Null;
    }
    match column.column_type {
        ColumnType::Uuid => Value::Uuid(primitives::generate_uuid(rng)),
        ColumnType::Int => Value::Int(rng.rand_int(1_000_000, 9_999_999)),
        _ => Value::borrowed("invalid_fk"),
    }
}

fn split_range(column: &ColumnSpec) -> (Option<f64>, Option<f64>) {
    match column.numeric_range() {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    }
}

/// Outcome of one repair-loop run.
pub struct RepairOutcome {
    pub row: Row,
    pub attempts: usize,
    pub success: bool,
}

/// Resample rows until `is_locally_valid` passes or `max_attempts` is
/// exhausted. Attempts are counted whether they succeed or fail; on
/// exhaustion the last candidate is returned unchanged.
pub fn repair_loop(
    builder: &mut RowBuilder<'_>,
    pools: &PkPools,
    unique_sets: &UniqueSets,
    pk_set: &HashSet<String>,
    max_attempts: usize,
) -> RepairOutcome {
    let mut attempts = 0;
    let mut last_row = Row::new();
    while attempts < max_attempts {
        attempts += 1;
        let row = builder.candidate(pools);
        if builder.is_locally_valid(&row, pools, unique_sets, pk_set) {
            return RepairOutcome {
                row,
                attempts,
                success: true,
            };
        }
        last_row = row;
    }
    RepairOutcome {
        row: last_row,
        attempts,
        success: false,
    }
}
