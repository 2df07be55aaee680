//! Typed failures surfaced by the lot engine.
//!
//! The engine never prints or logs. Fatal conditions come back as
//! [`EngineError`] / [`NormalizeError`]; cells that fail coercion are carried
//! alongside the data as [`CoercionWarning`]s so callers can decide how loudly
//! to report them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::ValueKind;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("row {row} has {found} cell(s) but the header defines {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("columns {} all normalize to '{canonical}'", .sources.join(", "))]
    Collision {
        canonical: String,
        sources: Vec<String>,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A field the operation depends on is absent from the normalized schema.
    #[error("{operation} requires missing column(s): {}", .missing.join(", "))]
    Schema {
        operation: &'static str,
        missing: Vec<String>,
    },
    #[error("invalid filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl EngineError {
    pub fn missing_columns(&self) -> &[String] {
        match self {
            EngineError::Schema { missing, .. } => missing,
            _ => &[],
        }
    }
}

/// A cell that could not be read as its field's type and was treated as missing.
///
/// `row` is the 1-based data row (the header is not counted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionWarning {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub expected: ValueKind,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} column '{}': '{}' is not a valid {}; treated as missing",
            self.row, self.column, self.value, self.expected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_missing_column() {
        let err = EngineError::Schema {
            operation: "overlap detection",
            missing: vec!["serial_start".to_string(), "serial_end".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "overlap detection requires missing column(s): serial_start, serial_end"
        );
        assert_eq!(err.missing_columns().len(), 2);
    }

    #[test]
    fn coercion_warning_renders_row_and_column() {
        let warning = CoercionWarning {
            row: 3,
            column: "serial_start".to_string(),
            value: "A12".to_string(),
            expected: ValueKind::Integer,
        };
        assert_eq!(
            warning.to_string(),
            "row 3 column 'serial_start': 'A12' is not a valid integer; treated as missing"
        );
    }
}
