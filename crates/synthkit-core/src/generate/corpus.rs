//! # Fixed Corpora
//!
//! The lookup tables behind the person-shaped column types. These are fixed
//! arrays rather than a faker dependency: the exact corpora and formats are
//! part of the reproducibility contract, and validators match against them.

use crate::rng::Rng;

pub const FIRST_NAMES: [&str; 10] = [
    "Alex", "Sam", "Jordan", "Taylor", "Morgan", "Riley", "Jamie", "Casey", "Avery", "Quinn",
];

pub const LAST_NAMES: [&str; 10] = [
    "Smith", "Patel", "Kim", "Garcia", "Brown", "Jones", "Miller", "Davis", "Wilson", "Clark",
];

pub const DOMAINS: [&str; 4] = ["example.com", "test.local", "sample.org", "demo.dev"];

pub const COUNTRIES: [&str; 8] = [
    "United Kingdom",
    "United States",
    "Canada",
    "Germany",
    "France",
    "Australia",
    "Japan",
    "Brazil",
];

pub const PHONE_PREFIXES: [&str; 6] = ["+1", "+44", "+49", "+33", "+81", "+61"];

pub const UK_AREAS: [&str; 15] = [
    "SW", "SE", "NW", "NE", "EC", "WC", "W", "E", "N", "S", "B", "M", "L", "G", "EH",
];

/// "First Last" from the name corpora.
pub fn full_name(rng: &mut Rng) -> String {
    let first = rng.choice(&FIRST_NAMES).copied().unwrap_or("Alex");
    let last = rng.choice(&LAST_NAMES).copied().unwrap_or("Smith");
    format!("{} {}", first, last)
}

/// "first.last@domain", lowercased.
pub fn email(rng: &mut Rng) -> String {
    let first = rng.choice(&FIRST_NAMES).copied().unwrap_or("Alex");
    let last = rng.choice(&LAST_NAMES).copied().unwrap_or("Smith");
    let domain = rng.choice(&DOMAINS).copied().unwrap_or("example.com");
    format!("{}.{}@{}", first.to_lowercase(), last.to_lowercase(), domain)
}

/// "<prefix><10 digits>".
pub fn phone(rng: &mut Rng) -> String {
    let prefix = rng.choice(&PHONE_PREFIXES).copied().unwrap_or("+44");
    let mut number = String::with_capacity(prefix.len() + 10);
    number.push_str(prefix);
    for _ in 0..10 {
        number.push(char::from(b'0' + rng.rand_int(0, 9) as u8));
    }
    number
}

/// A country name from the fixed list.
pub fn country(rng: &mut Rng) -> &'static str {
    rng.choice(&COUNTRIES).copied().unwrap_or("United Kingdom")
}

/// "<area><1-9> <0-9><A-Z><A-Z>", e.g. "SW1 2AB".
pub fn postcode_uk(rng: &mut Rng) -> String {
    let area = rng.choice(&UK_AREAS).copied().unwrap_or("SW");
    let district = rng.rand_int(1, 9);
    let sector = rng.rand_int(0, 9);
    let unit_a = char::from(rng.rand_int(65, 90) as u8);
    let unit_b = char::from(rng.rand_int(65, 90) as u8);
    format!("{}{} {}{}{}", area, district, sector, unit_a, unit_b)
}
