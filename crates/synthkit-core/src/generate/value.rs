use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated cell value.
///
/// The `String` variant uses `Cow<'static, str>` so values drawn from the
/// fixed corpora (names, domains, countries, postcode areas) are held as
/// zero-cost `&'static str` borrows, while formatted values (emails, regex
/// walks, sentinels) are owned `String`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    /// Convert to a SQL literal suitable for an INSERT statement: numerics
    /// and booleans bare, text single-quoted with `'` doubled, `NULL` for
    /// null.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%dT%H:%M:%S")),
            Value::Uuid(u) => format!("'{}'", u),
        }
    }

    /// Convert to the delimited-text rendering: empty string for null,
    /// ISO-8601 for temporals.
    pub fn to_csv_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::Uuid(u) => u.to_string(),
        }
    }

    /// Convert to the line-delimited JSON rendering.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(*i),
            Value::Float(f) => serde_json::json!(*f),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::Timestamp(ts) => {
                serde_json::Value::String(ts.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
        }
    }

    /// A canonical string form for uniqueness and pool-membership tracking.
    /// Floats are fixed to ten decimal places so `1.0` and `1` coincide
    /// only when they should.
    pub fn to_unique_key(&self) -> String {
        match self {
            Value::Null => "__NULL__".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format!("{:.10}", f),
            Value::String(s) => s.to_string(),
            Value::Date(d) => d.to_string(),
            Value::Timestamp(ts) => ts.to_string(),
            Value::Uuid(u) => u.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The numeric magnitude of an int or float value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Owned-string convenience constructor.
    pub fn owned(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }

    /// Static-string convenience constructor (zero heap allocation).
    pub fn borrowed(s: &'static str) -> Self {
        Value::String(Cow::Borrowed(s))
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Uuid(u) => write!(f, "{}", u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literal_escapes_quotes() {
        let v = Value::owned("O'Brien".to_string());
        assert_eq!(v.to_sql_literal(), "'O''Brien'");
    }

    #[test]
    fn test_sql_literal_null() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
    }

    #[test]
    fn test_csv_field_temporals_are_iso() {
        let d = Value::Date(NaiveDate::from_ymd_opt(2021, 3, 9).unwrap());
        assert_eq!(d.to_csv_field(), "2021-03-09");
        let ts = Value::Timestamp(
            NaiveDate::from_ymd_opt(2021, 3, 9)
                .unwrap()
                .and_hms_opt(12, 30, 5)
                .unwrap(),
        );
        assert_eq!(ts.to_csv_field(), "2021-03-09T12:30:05");
    }

    #[test]
    fn test_unique_key_distinguishes_int_and_float() {
        assert_ne!(
            Value::Int(1).to_unique_key(),
            Value::Float(1.0).to_unique_key()
        );
    }
}
