use std::{cmp::Ordering, fmt, sync::OnceLock};

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The type a lot column is read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Integer,
    Quantity,
    Date,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueKind::Text => "text value",
            ValueKind::Integer => "integer",
            ValueKind::Quantity => "non-negative quantity",
            ValueKind::Date => "date",
        };
        f.write_str(label)
    }
}

/// A typed view of one cell, used for filtering, sorting and key matching.
///
/// A given column always yields the same variant, so the derived ordering only
/// ever compares like with like.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Date(NaiveDate),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Orders present values ascending and pushes missing values to the end,
/// whatever the direction of the present-value comparison.
pub fn compare_missing_last<T: Ord>(left: Option<T>, right: Option<T>, ascending: bool) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(l), Some(r)) => {
            if ascending {
                l.cmp(&r)
            } else {
                r.cmp(&l)
            }
        }
    }
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d", "%d/%m/%Y", "%m/%d/%Y",
    ];
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed.date());
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

fn thousands_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+$").expect("valid pattern"))
}

/// Reads an integer the way spreadsheet exports spell them: `1200`,
/// `1,200` or `1200.0`.
pub fn parse_integer(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    let digits = if thousands_pattern().is_match(trimmed) {
        trimmed.replace(',', "")
    } else {
        trimmed.to_string()
    };
    if let Ok(parsed) = digits.parse::<i64>() {
        return Ok(parsed);
    }
    match digits.parse::<f64>() {
        Ok(float)
            if float.is_finite()
                && float.fract() == 0.0
                && float >= i64::MIN as f64
                && float <= i64::MAX as f64 =>
        {
            Ok(float as i64)
        }
        _ => Err(anyhow!("Failed to parse '{value}' as integer")),
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
