use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default row count for tables absent from the dataset `size` mapping.
pub const DEFAULT_ROW_COUNT: usize = 10;

fn default_max_attempts() -> usize {
    10
}

/// Top-level representation of a dataset schema. Frozen after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSpec {
    pub dataset: DatasetSpec,
    pub tables: IndexMap<String, TableSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl SchemaSpec {
    /// Copy mapping keys into the `name` fields of tables and columns.
    ///
    /// The on-disk form keys tables and columns by name instead of repeating
    /// it inside each spec; downstream code reads `spec.name` directly.
    pub fn assign_names(&mut self) {
        for (table_name, table) in self.tables.iter_mut() {
            table.name = table_name.clone();
            for (col_name, column) in table.columns.iter_mut() {
                column.name = col_name.clone();
            }
        }
    }

    /// Check the structural invariants serde cannot enforce.
    ///
    /// Referenced-table existence is deliberately not checked here; that is
    /// the dependency planner's error to raise.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SynthKitError;

        for (table_name, table) in &self.tables {
            if !table.columns.contains_key(&table.primary_key) {
                return Err(SynthKitError::config(format!(
                    "table '{}' declares primary key '{}' which is not among its columns",
                    table_name, table.primary_key
                )));
            }
            for fk in &table.foreign_keys {
                if !table.columns.contains_key(&fk.column) {
                    return Err(SynthKitError::config(format!(
                        "table '{}' declares a foreign key on unknown column '{}'",
                        table_name, fk.column
                    )));
                }
            }
            for (col_name, column) in &table.columns {
                if let (Some(values), Some(weights)) = (&column.values, &column.weights) {
                    if values.len() != weights.len() {
                        return Err(SynthKitError::config(format!(
                            "column '{}.{}' has {} values but {} weights",
                            table_name,
                            col_name,
                            values.len(),
                            weights.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Dataset-wide metadata: identity, seed, mode, sizing, retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub seed: u64,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub size: SizeSpec,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

/// Dataset-wide switch between constraint-satisfying generation (with
/// repair) and deliberate injection of violations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Valid,
    Invalid,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Valid => write!(f, "valid"),
            Mode::Invalid => write!(f, "invalid"),
        }
    }
}

/// Per-table row counts: either one scalar broadcast to every table or an
/// explicit mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeSpec {
    Broadcast(usize),
    PerTable(IndexMap<String, usize>),
}

impl Default for SizeSpec {
    fn default() -> Self {
        SizeSpec::PerTable(IndexMap::new())
    }
}

impl SizeSpec {
    pub fn rows_for(&self, table: &str) -> usize {
        match self {
            SizeSpec::Broadcast(n) => *n,
            SizeSpec::PerTable(map) => map.get(table).copied().unwrap_or(DEFAULT_ROW_COUNT),
        }
    }
}

/// A table: primary key, ordered columns, and outgoing foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    #[serde(default, skip_serializing)]
    pub name: String,
    pub primary_key: String,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySpec>,
    pub columns: IndexMap<String, ColumnSpec>,
}

impl TableSpec {
    /// The foreign key declared on `column`, if any.
    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKeySpec> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }
}

/// A foreign-key link: this table's `column` references
/// `ref_table.ref_column`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

/// A single column with its type and optional constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(default, skip_serializing)]
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    /// Inclusive [min, max] pair for numeric and temporal types.
    #[serde(default)]
    pub range: Option<Vec<Bound>>,
    /// Generation and validation pattern for text-family types.
    #[serde(default)]
    pub regex: Option<String>,
    /// Enum value list.
    #[serde(default)]
    pub values: Option<Vec<String>>,
    /// Weights parallel to `values`.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    #[serde(default)]
    pub distribution: Option<Distribution>,
    /// [min, max] length pair for text.
    #[serde(default)]
    pub length: Option<Vec<u32>>,
    /// Informational only; carried through untouched.
    #[serde(default)]
    pub pii: bool,
}

impl ColumnSpec {
    /// The declared range as an ordered pair, when both endpoints exist.
    pub fn range_pair(&self) -> Option<(&Bound, &Bound)> {
        match self.range.as_deref() {
            Some([min, max, ..]) => Some((min, max)),
            _ => None,
        }
    }

    /// The declared range coerced to floats, when both endpoints coerce.
    pub fn numeric_range(&self) -> Option<(f64, f64)> {
        let (min, max) = self.range_pair()?;
        Some((min.as_f64()?, max.as_f64()?))
    }

    /// The declared [min, max] text length pair.
    pub fn length_pair(&self) -> Option<(u32, u32)> {
        match self.length.as_deref() {
            Some([min, max, ..]) => Some((*min, *max)),
            _ => None,
        }
    }
}

/// The closed set of column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Uuid,
    Int,
    Decimal,
    Datetime,
    Date,
    Bool,
    Enum,
    Text,
    Email,
    Phone,
    Country,
    PostcodeUk,
    Name,
}

impl ColumnType {
    /// Returns true for int and decimal.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Decimal)
    }

    /// Returns true for date and datetime.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Datetime)
    }

    /// Returns true for the types whose values are free-form text, i.e.
    /// those a regex constraint can apply to.
    pub fn is_text_family(&self) -> bool {
        matches!(
            self,
            ColumnType::Text
                | ColumnType::Email
                | ColumnType::Phone
                | ColumnType::PostcodeUk
                | ColumnType::Name
        )
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Uuid => "uuid",
            ColumnType::Int => "int",
            ColumnType::Decimal => "decimal",
            ColumnType::Datetime => "datetime",
            ColumnType::Date => "date",
            ColumnType::Bool => "bool",
            ColumnType::Enum => "enum",
            ColumnType::Text => "text",
            ColumnType::Email => "email",
            ColumnType::Phone => "phone",
            ColumnType::Country => "country",
            ColumnType::PostcodeUk => "postcode_uk",
            ColumnType::Name => "name",
        };
        write!(f, "{}", name)
    }
}

/// Distribution family hint for numeric generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Uniform,
    Normal,
    Lognormal,
    Categorical,
}

/// One endpoint of a declared range: a YAML/JSON scalar that may be an
/// integer, a float, or a string (ISO date, ISO datetime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Bound {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bound::Int(i) => Some(*i as f64),
            Bound::Float(f) => Some(*f),
            Bound::Text(s) => s.parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Bound::Int(i) => i.to_string(),
            Bound::Float(f) => f.to_string(),
            Bound::Text(s) => s.clone(),
        }
    }
}

/// A conditional constraint: when `if` holds in a row context, every
/// expression in `then` must hold too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(rename = "if")]
    pub condition: String,
    pub then: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
dataset:
  name: demo
  seed: 7
  size:
    users: 5
tables:
  users:
    primary_key: id
    columns:
      id: { type: uuid }
      age: { type: int, range: [0, 120] }
"#
    }

    #[test]
    fn test_parse_minimal_schema() {
        let mut schema: SchemaSpec = serde_yaml::from_str(minimal_yaml()).unwrap();
        schema.assign_names();
        assert_eq!(schema.dataset.name, "demo");
        assert_eq!(schema.dataset.seed, 7);
        assert_eq!(schema.dataset.mode, Mode::Valid);
        assert_eq!(schema.dataset.max_attempts, 10);
        assert_eq!(schema.dataset.size.rows_for("users"), 5);
        assert_eq!(schema.dataset.size.rows_for("unknown"), DEFAULT_ROW_COUNT);

        let users = &schema.tables["users"];
        assert_eq!(users.name, "users");
        assert_eq!(users.columns["age"].name, "age");
        assert_eq!(users.columns["age"].column_type, ColumnType::Int);
        assert_eq!(users.columns["age"].numeric_range(), Some((0.0, 120.0)));
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_scalar_size_broadcasts() {
        let yaml = r#"
dataset: { name: demo, seed: 1, size: 25 }
tables:
  a: { primary_key: id, columns: { id: { type: uuid } } }
  b: { primary_key: id, columns: { id: { type: uuid } } }
"#;
        let schema: SchemaSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.dataset.size.rows_for("a"), 25);
        assert_eq!(schema.dataset.size.rows_for("b"), 25);
    }

    #[test]
    fn test_validate_rejects_missing_pk_column() {
        let yaml = r#"
dataset: { name: demo, seed: 1 }
tables:
  users:
    primary_key: missing
    columns:
      id: { type: uuid }
"#;
        let schema: SchemaSpec = serde_yaml::from_str(yaml).unwrap();
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_validate_rejects_mismatched_weights() {
        let yaml = r#"
dataset: { name: demo, seed: 1 }
tables:
  users:
    primary_key: id
    columns:
      id: { type: uuid }
      status:
        type: enum
        values: [A, B, C]
        weights: [0.5, 0.5]
"#;
        let schema: SchemaSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_fk_on_unknown_column() {
        let yaml = r#"
dataset: { name: demo, seed: 1 }
tables:
  orders:
    primary_key: id
    foreign_keys:
      - { column: ghost, ref_table: users, ref_column: id }
    columns:
      id: { type: uuid }
"#;
        let schema: SchemaSpec = serde_yaml::from_str(yaml).unwrap();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_bound_parses_mixed_scalars() {
        let yaml = r#"
dataset: { name: demo, seed: 1 }
tables:
  t:
    primary_key: id
    columns:
      id: { type: uuid }
      joined: { type: date, range: ["2021-01-01", "2021-12-31"] }
      score: { type: decimal, range: [0.5, 9.5] }
"#;
        let schema: SchemaSpec = serde_yaml::from_str(yaml).unwrap();
        let joined = &schema.tables["t"].columns["joined"];
        let (lo, hi) = joined.range_pair().unwrap();
        assert_eq!(lo, &Bound::Text("2021-01-01".to_string()));
        assert_eq!(hi.as_text(), "2021-12-31");
        let score = &schema.tables["t"].columns["score"];
        assert_eq!(score.numeric_range(), Some((0.5, 9.5)));
    }

    #[test]
    fn test_column_type_snake_case_names() {
        let col: ColumnSpec = serde_yaml::from_str("{ type: postcode_uk }").unwrap();
        assert_eq!(col.column_type, ColumnType::PostcodeUk);
        assert_eq!(col.column_type.to_string(), "postcode_uk");
    }
}
