use std::{cmp::Ordering, fmt};

use anyhow::{Result, anyhow};
use serde::{Serialize, Serializer};

use crate::{
    data::compare_missing_last,
    error::EngineError,
    filter::{FilterCondition, apply_filters},
    lots::{Field, LotRecord, LotTable},
};

/// Sort priority applied before overlap detection when none is configured.
pub const DEFAULT_SORT_PRIORITY: [Field; 5] = [
    Field::ProductCode,
    Field::LotNo,
    Field::TestDate,
    Field::ShipDate,
    Field::SerialStart,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub ascending: bool,
}

impl SortKey {
    pub fn ascending(field: Field) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    /// Parses `field[:asc|desc]`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.split(':');
        let column = parts
            .next()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Sort directive is missing a column"))?;
        let field = column.parse::<Field>().map_err(|err| anyhow!(err))?;
        let direction = parts.next().unwrap_or("asc");
        let ascending = match direction.trim().to_ascii_lowercase().as_str() {
            "asc" => true,
            "desc" => false,
            other => {
                return Err(anyhow!("Unknown sort direction '{other}'"));
            }
        };
        Ok(SortKey { field, ascending })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ascending {
            write!(f, "{}", self.field)
        } else {
            write!(f, "{}:desc", self.field)
        }
    }
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn default_sort_keys() -> Vec<SortKey> {
    DEFAULT_SORT_PRIORITY.into_iter().map(SortKey::ascending).collect()
}

/// The subset of `priority` the table can actually be sorted by, in order.
pub fn effective_sort_keys(table: &LotTable, priority: &[SortKey]) -> Vec<SortKey> {
    priority
        .iter()
        .filter(|key| table.has_field(key.field))
        .copied()
        .collect()
}

fn compare_lots(a: &LotRecord, b: &LotRecord, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = compare_missing_last(a.value(key.field), b.value(key.field), key.ascending);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Stable multi-key sort; missing values trail whatever the direction.
pub fn sort_lots(mut table: LotTable, priority: &[SortKey]) -> LotTable {
    let keys = effective_sort_keys(&table, priority);
    if !keys.is_empty() {
        table.rows.sort_by(|a, b| compare_lots(a, b, &keys));
    }
    table
}

pub fn filter_and_sort(
    table: LotTable,
    filters: &[FilterCondition],
    priority: &[SortKey],
) -> Result<LotTable, EngineError> {
    let filtered = apply_filters(table, filters)?;
    Ok(sort_lots(filtered, priority))
}
