//! # Typed Value Primitives
//!
//! One constrained producer per column type. Every producer honors the
//! declared range, length, and distribution hints when supplied and clamps
//! its final value into the declared range; deliberate violations are the
//! edge-case injector's job, never a primitive's.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::rng::Rng;
use crate::schema::types::{Bound, Distribution};

const TEXT_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 ";
const DIGITS: &str = "0123456789";
const WORD_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_";

fn default_date_span() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
    )
}

fn default_datetime_span() -> (NaiveDateTime, NaiveDateTime) {
    let (start, end) = default_date_span();
    (
        start.and_hms_opt(0, 0, 0).unwrap_or_default(),
        end.and_hms_opt(23, 59, 59).unwrap_or_default(),
    )
}

/// 128 random bits in canonical UUID text form.
pub fn generate_uuid(rng: &mut Rng) -> Uuid {
    Uuid::from_u128(rng.rand_u128())
}

/// Integer in `[min, max]` (defaults `[0, 1000]`) under the requested
/// distribution, rounded then clamped.
pub fn generate_int(
    rng: &mut Rng,
    min: Option<f64>,
    max: Option<f64>,
    distribution: Option<Distribution>,
) -> i64 {
    let min_val = min.map(|m| m as i64).unwrap_or(0);
    let max_val = max.map(|m| m as i64).unwrap_or(1000);
    let value = match distribution {
        Some(Distribution::Normal) => {
            let mean = (min_val + max_val) as f64 / 2.0;
            let mut sigma = (max_val - min_val) as f64 / 6.0;
            if sigma == 0.0 {
                sigma = 1.0;
            }
            rng.gauss(mean, sigma).round() as i64
        }
        Some(Distribution::Lognormal) => {
            scaled_lognormal(rng, min_val as f64, max_val as f64).round() as i64
        }
        _ => rng.rand_int(min_val, max_val),
    };
    value.min(max_val).max(min_val)
}

/// Float in `[min, max]` (defaults `[0.0, 1000.0]`) under the requested
/// distribution, clamped.
pub fn generate_decimal(
    rng: &mut Rng,
    min: Option<f64>,
    max: Option<f64>,
    distribution: Option<Distribution>,
) -> f64 {
    let min_val = min.unwrap_or(0.0);
    let max_val = max.unwrap_or(1000.0);
    let value = match distribution {
        Some(Distribution::Normal) => {
            let mean = (min_val + max_val) / 2.0;
            let mut sigma = (max_val - min_val) / 6.0;
            if sigma == 0.0 {
                sigma = 1.0;
            }
            rng.gauss(mean, sigma)
        }
        Some(Distribution::Lognormal) => scaled_lognormal(rng, min_val, max_val),
        _ => rng.uniform(min_val, max_val),
    };
    value.min(max_val).max(min_val)
}

/// `lognormal(0, 1)` squashed through `log1p` and mapped into `[min, max]`.
fn scaled_lognormal(rng: &mut Rng, min: f64, max: f64) -> f64 {
    let min = if min <= 0.0 { 0.01 } else { min };
    let max = if max <= min { min + 1.0 } else { max };
    let raw = rng.lognormal(0.0, 1.0);
    let squashed = raw.ln_1p();
    min + (max - min) * (squashed / (1.0 + squashed))
}

/// Fair coin.
pub fn generate_bool(rng: &mut Rng) -> bool {
    rng.random() < 0.5
}

/// Uniform day offset within the span (defaults 2020-01-01..2025-12-31).
pub fn generate_date(rng: &mut Rng, start: Option<NaiveDate>, end: Option<NaiveDate>) -> NaiveDate {
    let defaults = default_date_span();
    let start = start.unwrap_or(defaults.0);
    let end = end.unwrap_or(defaults.1);
    let delta_days = (end - start).num_days();
    let offset = rng.rand_int(0, delta_days.max(0));
    start
        .checked_add_signed(Duration::days(offset))
        .unwrap_or(start)
}

/// Uniform second offset within the span (defaults 2020-01-01T00:00:00..
/// 2025-12-31T23:59:59).
pub fn generate_datetime(
    rng: &mut Rng,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> NaiveDateTime {
    let defaults = default_datetime_span();
    let start = start.unwrap_or(defaults.0);
    let end = end.unwrap_or(defaults.1);
    let delta_seconds = (end - start).num_seconds();
    let offset = rng.rand_int(0, delta_seconds.max(0));
    start
        .checked_add_signed(Duration::seconds(offset))
        .unwrap_or(start)
}

/// Random text of uniform length in the length range (defaults `[5, 20]`),
/// characters drawn from letters, digits, and space. Falls back to the
/// literal `"text"` when the draw trims down to nothing.
pub fn generate_text(rng: &mut Rng, min_len: Option<u32>, max_len: Option<u32>) -> String {
    let min_len = min_len.unwrap_or(5) as i64;
    let max_len = max_len.unwrap_or(20) as i64;
    let length = rng.rand_int(min_len, max_len);
    let mut out = String::with_capacity(length.max(0) as usize);
    for _ in 0..length {
        if let Some(b) = rng.choice(TEXT_ALPHABET) {
            out.push(char::from(*b));
        }
    }
    let trimmed = out.trim();
    if trimmed.is_empty() {
        "text".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Generate text by walking a regex pattern left to right.
///
/// Supported subset: `^`/`$` as strip hints, `\d` and `\w` escapes, other
/// escaped characters as literals, character classes with `a-z` ranges,
/// and `{n}` / `{n,m}` quantifiers. Unknown constructs degrade to literal
/// character emission.
pub fn generate_text_from_regex(rng: &mut Rng, pattern: &str) -> String {
    let mut cleaned = pattern.trim();
    cleaned = cleaned.strip_prefix('^').unwrap_or(cleaned);
    cleaned = cleaned.strip_suffix('$').unwrap_or(cleaned);
    let chars: Vec<char> = cleaned.chars().collect();

    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut charset: Option<String> = None;
        let mut literal: Option<char> = None;

        if c == '\\' && i + 1 < chars.len() {
            match chars[i + 1] {
                'd' => charset = Some(DIGITS.to_string()),
                'w' => charset = Some(WORD_CHARS.to_string()),
                esc => literal = Some(esc),
            }
            i += 2;
        } else if c == '[' {
            match chars[i + 1..].iter().position(|&ch| ch == ']') {
                Some(rel_end) => {
                    let end = i + 1 + rel_end;
                    charset = Some(expand_class(&chars[i + 1..end]));
                    i = end + 1;
                }
                None => {
                    literal = Some(c);
                    i += 1;
                }
            }
        } else {
            literal = Some(c);
            i += 1;
        }

        let mut repeat = 1i64;
        if i < chars.len() && chars[i] == '{' {
            if let Some(rel_end) = chars[i..].iter().position(|&ch| ch == '}') {
                let end = i + rel_end;
                let quant: String = chars[i + 1..end].iter().collect();
                if let Some((low_raw, high_raw)) = quant.split_once(',') {
                    let low = low_raw.trim().parse::<i64>().unwrap_or(0);
                    let high = high_raw.trim().parse::<i64>().unwrap_or(low);
                    repeat = rng.rand_int(low, low.max(high));
                } else if let Ok(exact) = quant.trim().parse::<i64>() {
                    repeat = exact;
                }
                i = end + 1;
            }
        }

        for _ in 0..repeat {
            if let Some(ref set) = charset {
                if let Some(ch) = rng.choice_char(set) {
                    out.push(ch);
                }
            } else if let Some(ch) = literal {
                out.push(ch);
            }
        }
    }
    out
}

/// Expand a character-class body, honoring `a-z` style ranges.
fn expand_class(content: &[char]) -> String {
    let mut chars = String::new();
    let mut i = 0;
    while i < content.len() {
        if i + 2 < content.len() && content[i + 1] == '-' {
            let start = content[i] as u32;
            let end = content[i + 2] as u32;
            for code in start..=end {
                if let Some(ch) = char::from_u32(code) {
                    chars.push(ch);
                }
            }
            i += 3;
        } else {
            chars.push(content[i]);
            i += 1;
        }
    }
    chars
}

/// Weighted choice when the weights parallel the values; otherwise uniform.
pub fn generate_enum(rng: &mut Rng, values: &[String], weights: Option<&[f64]>) -> String {
    if values.is_empty() {
        return String::new();
    }
    match weights {
        Some(w) if w.len() == values.len() => rng
            .weighted_choice(values, w)
            .cloned()
            .unwrap_or_default(),
        _ => rng.choice(values).cloned().unwrap_or_default(),
    }
}

/// Interpret a declared range as a date pair. Numeric bounds are epoch
/// seconds; strings are ISO-8601.
pub fn parse_date_range(range: Option<&[Bound]>) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match range {
        Some([start, end, ..]) => (bound_to_date(start), bound_to_date(end)),
        _ => (None, None),
    }
}

/// Interpret a declared range as a datetime pair.
pub fn parse_datetime_range(
    range: Option<&[Bound]>,
) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
    match range {
        Some([start, end, ..]) => (bound_to_datetime(start), bound_to_datetime(end)),
        _ => (None, None),
    }
}

fn bound_to_date(bound: &Bound) -> Option<NaiveDate> {
    match bound {
        Bound::Int(secs) => chrono::DateTime::from_timestamp(*secs, 0).map(|dt| dt.date_naive()),
        Bound::Float(secs) => {
            chrono::DateTime::from_timestamp(*secs as i64, 0).map(|dt| dt.date_naive())
        }
        Bound::Text(s) => parse_iso_date(s),
    }
}

fn bound_to_datetime(bound: &Bound) -> Option<NaiveDateTime> {
    match bound {
        Bound::Int(secs) => chrono::DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
        Bound::Float(secs) => {
            chrono::DateTime::from_timestamp(*secs as i64, 0).map(|dt| dt.naive_utc())
        }
        Bound::Text(s) => parse_iso_datetime(s),
    }
}

/// Parse an ISO-8601 date, `YYYY-MM-DD`.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

/// Parse an ISO-8601 datetime. Accepts `T` or space separators, an
/// optional trailing `Z`, and bare dates (midnight).
pub fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| parse_iso_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_stays_in_range() {
        let mut rng = Rng::with_seed(123);
        for _ in 0..100 {
            let v = generate_int(&mut rng, Some(10.0), Some(20.0), Some(Distribution::Uniform));
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_int_normal_clamped() {
        let mut rng = Rng::with_seed(123);
        for _ in 0..200 {
            let v = generate_int(&mut rng, Some(0.0), Some(10.0), Some(Distribution::Normal));
            assert!((0..=10).contains(&v));
        }
    }

    #[test]
    fn test_decimal_normal_clamped() {
        let mut rng = Rng::with_seed(123);
        for _ in 0..100 {
            let v = generate_decimal(&mut rng, Some(1.5), Some(2.5), Some(Distribution::Normal));
            assert!((1.5..=2.5).contains(&v));
        }
    }

    #[test]
    fn test_decimal_lognormal_clamped() {
        let mut rng = Rng::with_seed(9);
        for _ in 0..100 {
            let v =
                generate_decimal(&mut rng, Some(0.0), Some(100.0), Some(Distribution::Lognormal));
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn test_int_defaults() {
        let mut rng = Rng::with_seed(5);
        for _ in 0..50 {
            let v = generate_int(&mut rng, None, None, None);
            assert!((0..=1000).contains(&v));
        }
    }

    #[test]
    fn test_uuid_deterministic() {
        let mut a = Rng::with_seed(42);
        let mut b = Rng::with_seed(42);
        assert_eq!(generate_uuid(&mut a), generate_uuid(&mut b));
    }

    #[test]
    fn test_date_within_declared_span() {
        let mut rng = Rng::with_seed(8);
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 1, 31).unwrap();
        for _ in 0..50 {
            let d = generate_date(&mut rng, Some(start), Some(end));
            assert!(d >= start && d <= end);
        }
    }

    #[test]
    fn test_text_length_and_fallback() {
        let mut rng = Rng::with_seed(4);
        for _ in 0..50 {
            let t = generate_text(&mut rng, Some(5), Some(20));
            assert!(!t.is_empty());
            // trimming can only shorten
            assert!(t.len() <= 20);
        }
    }

    #[test]
    fn test_regex_walker_basic_pattern() {
        let mut rng = Rng::with_seed(1);
        let re = regex::Regex::new(r"^[A-Z]{3}\d{2}$").unwrap();
        for _ in 0..50 {
            let s = generate_text_from_regex(&mut rng, r"^[A-Z]{3}\d{2}$");
            assert!(re.is_match(&s), "generated '{}' does not match", s);
        }
    }

    #[test]
    fn test_regex_walker_escapes_and_literals() {
        let mut rng = Rng::with_seed(2);
        let s = generate_text_from_regex(&mut rng, r"INV-\d{4}");
        assert!(s.starts_with("INV-"));
        assert_eq!(s.len(), 8);
        assert!(s[4..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_regex_walker_bounded_quantifier() {
        let mut rng = Rng::with_seed(3);
        for _ in 0..50 {
            let s = generate_text_from_regex(&mut rng, r"[ab]{2,4}");
            assert!((2..=4).contains(&s.len()));
            assert!(s.chars().all(|c| c == 'a' || c == 'b'));
        }
    }

    #[test]
    fn test_regex_walker_word_escape() {
        let mut rng = Rng::with_seed(6);
        let s = generate_text_from_regex(&mut rng, r"\w{10}");
        assert_eq!(s.len(), 10);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }

    #[test]
    fn test_enum_weighted_and_uniform() {
        let mut rng = Rng::with_seed(10);
        let values: Vec<String> = vec!["a".into(), "b".into()];
        let mut count_a = 0;
        for _ in 0..500 {
            if generate_enum(&mut rng, &values, Some(&[0.95, 0.05])) == "a" {
                count_a += 1;
            }
        }
        assert!(count_a > 400);
        // mismatched weights fall back to uniform without panicking
        let v = generate_enum(&mut rng, &values, Some(&[1.0]));
        assert!(v == "a" || v == "b");
    }

    #[test]
    fn test_enum_empty_values() {
        let mut rng = Rng::with_seed(10);
        assert_eq!(generate_enum(&mut rng, &[], None), "");
    }

    #[test]
    fn test_parse_ranges() {
        let bounds = vec![
            Bound::Text("2021-01-01".to_string()),
            Bound::Text("2021-12-31".to_string()),
        ];
        let (start, end) = parse_date_range(Some(&bounds));
        assert_eq!(start, NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(end, NaiveDate::from_ymd_opt(2021, 12, 31));

        let dt_bounds = vec![
            Bound::Text("2021-01-01T06:00:00".to_string()),
            Bound::Text("2021-01-02".to_string()),
        ];
        let (s, e) = parse_datetime_range(Some(&dt_bounds));
        assert!(s.is_some());
        assert_eq!(e.unwrap().time(), chrono::NaiveTime::default());
    }
}
