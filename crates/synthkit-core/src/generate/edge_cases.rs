//! # Edge-Case Injector
//!
//! Probabilistic post-processor that may replace a freshly produced value
//! with an invalid sentinel (invalid mode only), a null (nullable columns
//! only), or a boundary variant. This is the only place a null or a
//! deliberately constraint-violating value may originate.

use crate::generate::value::Value;
use crate::generate::primitives::{parse_date_range, parse_datetime_range};
use crate::rng::Rng;
use crate::schema::types::{ColumnSpec, ColumnType, Mode};

pub const INVALID_PROB: f64 = 0.25;
pub const NULL_PROB: f64 = 0.10;
pub const BOUNDARY_PROB: f64 = 0.15;

/// Possibly replace `value` according to the injection priority:
/// invalid sentinel, then null, then boundary, then passthrough.
pub fn apply_edge_cases(value: Value, column: &ColumnSpec, mode: Mode, rng: &mut Rng) -> Value {
    if mode == Mode::Invalid && rng.random() < INVALID_PROB {
        return invalid_value(column);
    }
    if column.nullable && rng.random() < NULL_PROB {
        return Value::Null;
    }
    if rng.random() < BOUNDARY_PROB {
        return boundary_value(value, column, rng);
    }
    value
}

/// A range, length, or enum endpoint for the column, when one is declared;
/// the value unchanged otherwise.
fn boundary_value(value: Value, column: &ColumnSpec, rng: &mut Rng) -> Value {
    if column.column_type.is_numeric() {
        if let Some((min, max)) = column.numeric_range() {
            let endpoint = if rng.random() < 0.5 { min } else { max };
            return match column.column_type {
                ColumnType::Int => Value::Int(endpoint as i64),
                _ => Value::Float(endpoint),
            };
        }
    }
    if column.column_type == ColumnType::Date && column.range_pair().is_some() {
        let (start, end) = parse_date_range(column.range.as_deref());
        let endpoint = if rng.random() < 0.5 { start } else { end };
        return endpoint.map_or(Value::Null, Value::Date);
    }
    if column.column_type == ColumnType::Datetime && column.range_pair().is_some() {
        let (start, end) = parse_datetime_range(column.range.as_deref());
        let endpoint = if rng.random() < 0.5 { start } else { end };
        return endpoint.map_or(Value::Null, Value::Timestamp);
    }
    if column.column_type == ColumnType::Text {
        if let Some((min_len, max_len)) = column.length_pair() {
            let target = if rng.random() < 0.5 { min_len } else { max_len } as usize;
            let text = match &value {
                Value::Null => String::new(),
                other => other.to_csv_field(),
            };
            let truncated: String = text.chars().take(target).collect();
            if truncated.chars().count() >= target {
                return Value::owned(truncated);
            }
            let padding = target - truncated.chars().count();
            let mut padded = truncated;
            padded.extend(std::iter::repeat('x').take(padding));
            return Value::owned(padded);
        }
    }
    if column.column_type == ColumnType::Enum {
        if let Some(values) = column.values.as_deref().filter(|v| !v.is_empty()) {
            let pick = if rng.random() < 0.5 {
                &values[0]
            } else {
                &values[values.len() - 1]
            };
            return Value::owned(pick.clone());
        }
    }
    value
}

/// The deliberately invalid sentinel for the column's type.
fn invalid_value(column: &ColumnSpec) -> Value {
    match column.column_type {
        ColumnType::Int | ColumnType::Decimal => match column.numeric_range() {
            Some((_, max)) => Value::Float(max + 9999.0),
            None => Value::borrowed("not_a_number"),
        },
        ColumnType::Date | ColumnType::Datetime => Value::borrowed("not_a_date"),
        ColumnType::Bool => Value::borrowed("not_bool"),
        ColumnType::Enum => Value::borrowed("INVALID_ENUM"),
        ColumnType::Uuid => Value::borrowed("not-a-uuid"),
        ColumnType::Email => Value::borrowed("invalid-email"),
        ColumnType::Phone => Value::borrowed("invalid-phone"),
        ColumnType::Country => Value::borrowed("Atlantis"),
        ColumnType::PostcodeUk => Value::borrowed("INVALID"),
        ColumnType::Name => Value::borrowed(""),
        ColumnType::Text if column.regex.is_some() => Value::borrowed("!!!"),
        ColumnType::Text if column.length.is_some() => Value::borrowed(""),
        ColumnType::Text => Value::borrowed("invalid"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Bound;

    fn column(column_type: ColumnType) -> ColumnSpec {
        ColumnSpec {
            name: "c".to_string(),
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

    #[test]
    fn test_valid_mode_never_emits_invalid_sentinel() {
        let mut rng = Rng::with_seed(1);
        let col = column(ColumnType::Enum);
        for _ in 0..200 {
            let v = apply_edge_cases(Value::borrowed("A"), &col, Mode::Valid, &mut rng);
            assert_ne!(v.as_str(), Some("INVALID_ENUM"));
        }
    }

    #[test]
    fn test_null_requires_nullable() {
        let mut rng = Rng::with_seed(2);
        let col = column(ColumnType::Text);
        for _ in 0..200 {
            let v = apply_edge_cases(Value::borrowed("abc"), &col, Mode::Valid, &mut rng);
            assert!(!v.is_null());
        }
    }

    #[test]
    fn test_nullable_column_sees_nulls() {
        let mut rng = Rng::with_seed(3);
        let mut col = column(ColumnType::Text);
        col.nullable = true;
        let saw_null = (0..200).any(|_| {
            apply_edge_cases(Value::borrowed("abc"), &col, Mode::Valid, &mut rng).is_null()
        });
        assert!(saw_null);
    }

    #[test]
    fn test_invalid_numeric_sentinel_exceeds_range() {
        let mut rng = Rng::with_seed(4);
        let mut col = column(ColumnType::Decimal);
        col.range = Some(vec![Bound::Int(0), Bound::Int(100)]);
        let saw_overflow = (0..100).any(|_| {
            matches!(
                apply_edge_cases(Value::Float(50.0), &col, Mode::Invalid, &mut rng),
                Value::Float(f) if f > 100.0
            )
        });
        assert!(saw_overflow);
    }

    #[test]
    fn test_boundary_hits_numeric_endpoints() {
        let mut rng = Rng::with_seed(5);
        let mut col = column(ColumnType::Int);
        col.range = Some(vec![Bound::Int(10), Bound::Int(20)]);
        let mut saw_endpoint = false;
        for _ in 0..300 {
            if let Value::Int(i) =
                apply_edge_cases(Value::Int(15), &col, Mode::Valid, &mut rng)
            {
                if i == 10 || i == 20 {
                    saw_endpoint = true;
                }
            }
        }
        assert!(saw_endpoint);
    }

    #[test]
    fn test_boundary_pads_text_to_length() {
        let mut rng = Rng::with_seed(6);
        let mut col = column(ColumnType::Text);
        col.length = Some(vec![8, 12]);
        for _ in 0..300 {
            let v = apply_edge_cases(Value::borrowed("abc"), &col, Mode::Valid, &mut rng);
            if let Some(s) = v.as_str() {
                if s != "abc" {
                    assert!(s.len() == 8 || s.len() == 12);
                    assert!(s.ends_with('x'));
                }
            }
        }
    }

    #[test]
    fn test_boundary_enum_endpoints() {
        let mut rng = Rng::with_seed(7);
        let mut col = column(ColumnType::Enum);
        col.values = Some(vec!["first".into(), "mid".into(), "last".into()]);
        for _ in 0..300 {
            let v = apply_edge_cases(Value::borrowed("mid"), &col, Mode::Valid, &mut rng);
            let s = v.as_str().unwrap();
            assert!(s == "mid" || s == "first" || s == "last");
        }
    }

    #[test]
    fn test_invalid_text_sentinels() {
        let mut col = column(ColumnType::Text);
        col.regex = Some("[a-z]{3}".to_string());
        assert_eq!(invalid_value(&col).as_str(), Some("!!!"));
        let mut col = column(ColumnType::Text);
        col.length = Some(vec![1, 5]);
        assert_eq!(invalid_value(&col).as_str(), Some(""));
        assert_eq!(invalid_value(&column(ColumnType::Text)).as_str(), Some("invalid"));
    }
}
