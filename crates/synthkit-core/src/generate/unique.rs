//! # Unique and Primary-Key Tracking
//!
//! Per-table bookkeeping created empty at the start of a table's generation
//! and populated only on the row acceptance path: one value set per column
//! flagged unique, one set for the primary key, and the ordered primary-key
//! pool that descendant tables sample for foreign-key columns.

use std::collections::{HashMap, HashSet};

use crate::generate::value::Value;
use crate::rng::Rng;
use crate::schema::types::TableSpec;

/// Per-column sets of values already used for columns marked unique.
#[derive(Debug, Default)]
pub struct UniqueSets {
    sets: HashMap<String, HashSet<String>>,
}

impl UniqueSets {
    /// One empty set per unique column of `table`.
    pub fn for_table(table: &TableSpec) -> Self {
        let sets = table
            .columns
            .values()
            .filter(|col| col.unique)
            .map(|col| (col.name.clone(), HashSet::new()))
            .collect();
        Self { sets }
    }

    /// True when `value` collides with an already-recorded value.
    pub fn contains(&self, column: &str, value: &Value) -> bool {
        self.sets
            .get(column)
            .is_some_and(|seen| seen.contains(&value.to_unique_key()))
    }

    /// Record a value for a tracked column. Untracked columns are ignored.
    pub fn record(&mut self, column: &str, value: &Value) {
        if let Some(seen) = self.sets.get_mut(column) {
            seen.insert(value.to_unique_key());
        }
    }
}

/// Ordered pools of emitted primary-key values, keyed by table name.
#[derive(Debug, Default)]
pub struct PkPools {
    pools: HashMap<String, Vec<Value>>,
}

impl PkPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the (empty) pool for a table about to generate.
    pub fn open_table(&mut self, table: &str) {
        self.pools.entry(table.to_string()).or_default();
    }

    /// Append an emitted primary-key value. Pools are append-only.
    pub fn record(&mut self, table: &str, value: Value) {
        self.pools.entry(table.to_string()).or_default().push(value);
    }

    /// Uniform draw from a table's pool. `None` when the pool is empty or
    /// the table has not generated yet.
    pub fn pick(&self, table: &str, rng: &mut Rng) -> Option<Value> {
        self.pools
            .get(table)
            .and_then(|pool| rng.choice(pool))
            .cloned()
    }

    /// Membership test by canonical value key.
    pub fn contains(&self, table: &str, value: &Value) -> bool {
        let key = value.to_unique_key();
        self.pools
            .get(table)
            .is_some_and(|pool| pool.iter().any(|v| v.to_unique_key() == key))
    }

    pub fn len(&self, table: &str) -> usize {
        self.pools.get(table).map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}
