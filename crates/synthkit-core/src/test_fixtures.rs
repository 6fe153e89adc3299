//! In-crate copies of the shared schema fixtures from `synthkit-testutil`.
//!
//! `synthkit-testutil` depends on this crate, so it can't be used from
//! this crate's own unit tests without creating a dev-dependency cycle
//! that Cargo compiles as two distinct instances of `synthkit-core` (and
//! then rejects as mismatched types). These fixtures stay in lockstep
//! with `synthkit-testutil`'s and are only used by `#[cfg(test)]` code.

use crate::config::schema_from_yaml;
use crate::schema::types::{ColumnSpec, ColumnType, Mode, SchemaSpec, SizeSpec};

/// The two-table shop schema used across the test suite: customers with
/// unique emails, orders referencing them, an enum status, a ranged total,
/// and the rule that failed orders stay at or under 500.
///
/// Seed 7, 5 customers, 10 orders.
pub fn shop_schema(mode: Mode) -> SchemaSpec {
    let yaml = r#"
dataset:
  name: shop
  seed: 7
  size: { customers: 5, orders: 10 }
  max_attempts: 10
tables:
  customers:
    primary_key: customer_id
    columns:
      customer_id: { type: uuid }
      email: { type: email, unique: true }
  orders:
    primary_key: order_id
    foreign_keys:
      - { column: customer_id, ref_table: customers, ref_column: customer_id }
    columns:
      order_id: { type: uuid }
      customer_id: { type: uuid }
      status: { type: enum, values: [PAID, FAILED] }
      total: { type: decimal, range: [0, 1000] }
rules:
  - if: "orders.status == 'FAILED'"
    then: ["orders.total <= 500.0"]
"#;
    let (mut schema, _) = schema_from_yaml(yaml).expect("shop schema parses");
    schema.dataset.mode = mode;
    schema
}

/// A one-table schema: `items` with a uuid primary key and one extra
/// `payload` column supplied by the caller.
pub fn single_table_schema(
    mut payload: ColumnSpec,
    mode: Mode,
    seed: u64,
    rows: usize,
) -> SchemaSpec {
    let yaml = r#"
dataset:
  name: single
  seed: 0
tables:
  items:
    primary_key: id
    columns:
      id: { type: uuid }
      payload: { type: text }
"#;
    let (mut schema, _) = schema_from_yaml(yaml).expect("single-table schema parses");
    schema.dataset.mode = mode;
    schema.dataset.seed = seed;
    schema.dataset.size = SizeSpec::Broadcast(rows);
    payload.name = "payload".to_string();
    let items = schema
        .tables
        .get_mut("items")
        .expect("items table is declared");
    items.columns.insert("payload".to_string(), payload);
    schema
}

/// A bare column spec of the given type, non-nullable and non-unique.
pub fn column_of(column_type: ColumnType) -> ColumnSpec {
    ColumnSpec {
        name: String::new(),
        column_type,
        nullable: false,
        unique: false,
        range: None,
        regex: None,
        values: None,
        weights: None,
        distribution: None,
        length: None,
        pii: false,
    }
}
