//! # Schema File Loader
//!
//! Reads a declarative schema file (YAML or JSON, chosen by extension) into
//! a [`SchemaSpec`] and computes its configuration hash: the SHA-256 of the
//! canonical JSON form with sorted keys and no whitespace. The hash is
//! recorded in run metadata so two runs can be compared for identical input.
//!
//! Example schema:
//!
//! ```yaml
//! dataset:
//!   name: shop
//!   seed: 7
//!   mode: valid
//!   size: { customers: 5, orders: 10 }
//!   max_attempts: 10
//! tables:
//!   customers:
//!     primary_key: customer_id
//!     columns:
//!       customer_id: { type: uuid }
//!       email: { type: email, unique: true }
//!   orders:
//!     primary_key: order_id
//!     foreign_keys:
//!       - { column: customer_id, ref_table: customers, ref_column: customer_id }
//!     columns:
//!       order_id: { type: uuid }
//!       customer_id: { type: uuid }
//!       status: { type: enum, values: [PAID, FAILED] }
//!       total: { type: decimal, range: [0, 1000] }
//! rules:
//!   - if: "orders.status == 'FAILED'"
//!     then: ["orders.total <= 500.0"]
//! ```

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Result, SynthKitError};
use crate::schema::types::SchemaSpec;

/// Load a schema file and return it with its configuration hash.
pub fn load_schema(path: &Path) -> Result<(SchemaSpec, String)> {
    if !path.exists() {
        return Err(SynthKitError::config(format!(
            "schema file not found: {}",
            path.display()
        )));
    }
    let text = std::fs::read_to_string(path).map_err(|e| {
        SynthKitError::config(format!("failed to read {}: {}", path.display(), e))
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "yaml" | "yml" => schema_from_yaml(&text),
        "json" => schema_from_json(&text),
        _ => Err(SynthKitError::config(format!(
            "schema file must be .yaml, .yml, or .json: {}",
            path.display()
        ))),
    }
}

/// Parse a YAML schema document and compute its config hash.
pub fn schema_from_yaml(text: &str) -> Result<(SchemaSpec, String)> {
    let raw: serde_json::Value = serde_yaml::from_str(text)
        .map_err(|e| SynthKitError::config(format!("schema is not a YAML mapping: {}", e)))?;
    let schema: SchemaSpec = serde_yaml::from_str(text)
        .map_err(|e| SynthKitError::config(format!("malformed schema: {}", e)))?;
    finalize(schema, &raw)
}

/// Parse a JSON schema document and compute its config hash.
pub fn schema_from_json(text: &str) -> Result<(SchemaSpec, String)> {
    let raw: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| SynthKitError::config(format!("schema is not a JSON object: {}", e)))?;
    let schema: SchemaSpec = serde_json::from_str(text)
        .map_err(|e| SynthKitError::config(format!("malformed schema: {}", e)))?;
    finalize(schema, &raw)
}

fn finalize(mut schema: SchemaSpec, raw: &serde_json::Value) -> Result<(SchemaSpec, String)> {
    if !raw.is_object() {
        return Err(SynthKitError::config("schema must be a mapping"));
    }
    schema.assign_names();
    schema.validate()?;
    Ok((schema, hash_config(raw)))
}

/// SHA-256 of the canonical JSON rendering of `raw`.
///
/// `serde_json` keeps object keys in a sorted map and `to_string` emits no
/// whitespace, so this is the canonical sorted-key compact form.
pub fn hash_config(raw: &serde_json::Value) -> String {
    let blob = raw.to_string();
    let digest = Sha256::digest(blob.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Mode;

    const DEMO: &str = r#"
dataset:
  name: demo
  seed: 7
  mode: invalid
  size: { users: 3 }
tables:
  users:
    primary_key: id
    columns:
      id: { type: uuid }
      email: { type: email, unique: true }
"#;

    #[test]
    fn test_yaml_roundtrip() {
        let (schema, hash) = schema_from_yaml(DEMO).unwrap();
        assert_eq!(schema.dataset.mode, Mode::Invalid);
        assert_eq!(schema.tables["users"].name, "users");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_hash_is_stable_across_key_order() {
        let a: serde_json::Value =
            serde_json::from_str(r#"{"b": 1, "a": {"y": 2, "x": 3}}"#).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(r#"{"a": {"x": 3, "y": 2}, "b": 1}"#).unwrap();
        assert_eq!(hash_config(&a), hash_config(&b));
    }

    #[test]
    fn test_hash_differs_for_different_content() {
        let a: serde_json::Value = serde_json::from_str(r#"{"seed": 1}"#).unwrap();
        let b: serde_json::Value = serde_json::from_str(r#"{"seed": 2}"#).unwrap();
        assert_ne!(hash_config(&a), hash_config(&b));
    }

    #[test]
    fn test_load_schema_missing_file() {
        let err = load_schema(Path::new("/nonexistent/schema.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_schema_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        std::fs::write(&path, DEMO).unwrap();
        assert!(load_schema(&path).is_err());
    }

    #[test]
    fn test_load_schema_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, DEMO).unwrap();
        let (schema, _) = load_schema(&path).unwrap();
        assert_eq!(schema.dataset.name, "demo");
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = schema_from_yaml("tables: [not: a: mapping").unwrap_err();
        assert!(matches!(err, crate::error::SynthKitError::Config { .. }));
    }

    #[test]
    fn test_unknown_column_type_is_config_error() {
        let yaml = r#"
dataset: { name: demo, seed: 1 }
tables:
  t:
    primary_key: id
    columns:
      id: { type: flux_capacitor }
"#;
        assert!(schema_from_yaml(yaml).is_err());
    }
}
