//! Ingress normalization: period names and account numbers.
//!
//! Everything that crosses into the core from an HTTP request or from the
//! ERP's own string-typed columns goes through here first. `spec.md` §3
//! calls out two hazards this module exists to close:
//!
//! - period names must always end up `Mon YYYY`, whether they arrived as a
//!   spreadsheet date serial, an ISO date, or already in canonical form;
//! - account numbers must always end up strings, reversing any numeric
//!   coercion a JSON transport layer may have applied.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{GatewayError, GatewayResult};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Excel/Sheets serial date epoch: day 0 is 1899-12-30 (the well-known
/// "1900 leap year bug" offset, which every spreadsheet engine preserves
/// for backward compatibility).
fn spreadsheet_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch date")
}

fn date_to_canonical_period(date: NaiveDate) -> String {
    format!("{} {}", MONTH_NAMES[date.month0() as usize], date.year())
}

/// Parse an already-canonical `Mon YYYY` string, rejecting anything that
/// isn't exactly a three-letter English month abbreviation plus a
/// four-digit year.
fn parse_canonical(input: &str) -> Option<(String, i32)> {
    let mut parts = input.split_whitespace();
    let month = parts.next()?;
    let year = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    let month_index = MONTH_NAMES.iter().position(|m| *m == month)?;
    let year: i32 = year.parse().ok()?;
    if year < 1000 || year > 9999 {
        return None;
    }
    Some((MONTH_NAMES[month_index].to_string(), year))
}

/// Normalize a period string to canonical `Mon YYYY` form.
///
/// Accepts, in order of attempt: an already-canonical `Mon YYYY` string, an
/// ISO `YYYY-MM-DD` date, or a spreadsheet date serial (an integer or
/// integer-valued float, as add-ins commonly send dates).
pub fn normalize_period_name(input: &str) -> GatewayResult<String> {
    let trimmed = input.trim();

    if let Some((month, year)) = parse_canonical(trimmed) {
        return Ok(format!("{month} {year}"));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date_to_canonical_period(date));
    }

    if let Ok(serial) = trimmed.parse::<f64>() {
        if serial.is_finite() && serial >= 0.0 {
            let days = serial.trunc() as i64;
            let date = spreadsheet_epoch() + Duration::days(days);
            return Ok(date_to_canonical_period(date));
        }
    }

    Err(GatewayError::validation(format!(
        "unrecognized period '{input}': expected 'Mon YYYY', an ISO date, or a spreadsheet date serial"
    )))
}

/// Parse an already-canonical `Mon YYYY` string into `(year, month)` with
/// `month` in `1..=12`. Used by the SQL builder to determine which of
/// several requested periods is chronologically latest without needing a
/// full [`crate::models::Period`] lookup.
pub fn canonical_period_year_month(name: &str) -> GatewayResult<(i32, u32)> {
    let (month, year) =
        parse_canonical(name).ok_or_else(|| GatewayError::validation(format!("not a canonical period: '{name}'")))?;
    let month_index = MONTH_NAMES
        .iter()
        .position(|m| *m == month)
        .expect("parse_canonical only returns known month abbreviations");
    Ok((year, month_index as u32 + 1))
}

/// The first and last calendar day of a canonical `Mon YYYY` period.
pub fn canonical_period_bounds(name: &str) -> GatewayResult<(NaiveDate, NaiveDate)> {
    let (year, month) = canonical_period_year_month(name)?;
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| GatewayError::validation(format!("invalid period '{name}'")))?;
    let end = next_month_start(start) - Duration::days(1);
    Ok((start, end))
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).expect("valid date")
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).expect("valid date")
    }
}

/// Normalize a GL account number.
///
/// Account numbers are always strings in the core; this only trims
/// surrounding whitespace and never attempts numeric interpretation — a
/// number like `15000-1` must survive unchanged.
pub fn normalize_account_number(input: &str) -> GatewayResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(GatewayError::validation("account number must not be empty"));
    }
    if trimmed.contains('\0') {
        return Err(GatewayError::validation("account number contains a NUL byte"));
    }
    Ok(trimmed.to_string())
}

/// `serde` helper for request fields that may arrive as either a JSON
/// string or a bare JSON number (some transport layers coerce a numeric-
/// looking account number into a number). Always yields a `String`.
pub mod flexible_string {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "expected a string or number, got {other}"
            ))),
        }
    }
}
