//! Serial-range collision detection.
//!
//! Rows are partitioned by product code and ordered by serial start (missing
//! starts trail). Each adjacent pair whose first end reaches the next start
//! (`end >= next_start`, so touching ranges count) flags both rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    data::{FieldValue, compare_missing_last},
    error::EngineError,
    lots::{Field, LotRecord, LotTable},
};

/// Rows grouped by product code, each group in input order. Rows without a
/// code belong to no group.
pub(crate) fn partition_by_code(rows: &[LotRecord]) -> BTreeMap<&str, Vec<&LotRecord>> {
    let mut partitions: BTreeMap<&str, Vec<&LotRecord>> = BTreeMap::new();
    for row in rows {
        if let Some(code) = row.product_code.as_deref() {
            partitions.entry(code).or_default().push(row);
        }
    }
    partitions
}

fn flag_adjacent_overlaps(group: &[&LotRecord]) -> Vec<bool> {
    let mut flagged = vec![false; group.len()];
    for (idx, pair) in group.windows(2).enumerate() {
        if let (Some(end), Some(next_start)) = (pair[0].serial_end, pair[1].serial_start)
            && end >= next_start
        {
            flagged[idx] = true;
            flagged[idx + 1] = true;
        }
    }
    flagged
}

/// Returns every row involved in an overlapping pair, grouped by product code
/// ascending and ordered by serial start. Rows identical on every field are
/// reported once.
pub fn detect_overlaps(table: &LotTable) -> Result<LotTable, EngineError> {
    table.require(
        "overlap detection",
        &[Field::ProductCode, Field::SerialStart, Field::SerialEnd],
    )?;

    let mut seen: HashSet<&LotRecord> = HashSet::new();
    let mut duplicates = Vec::new();
    for (_, mut group) in partition_by_code(&table.rows) {
        if group.len() < 2 {
            continue;
        }
        group.sort_by(|a, b| compare_missing_last(a.serial_start, b.serial_start, true));
        let flagged = flag_adjacent_overlaps(&group);
        for (row, is_flagged) in group.into_iter().zip(flagged) {
            if is_flagged && seen.insert(row) {
                duplicates.push(row.clone());
            }
        }
    }

    Ok(LotTable::new(table.columns.clone(), duplicates))
}

/// Key set used for repeated-row detection when the caller names none.
pub fn default_repeat_keys(table: &LotTable) -> Vec<Field> {
    let date = if table.has_field(Field::ShipDate) || !table.has_field(Field::TestDate) {
        Field::ShipDate
    } else {
        Field::TestDate
    };
    vec![Field::ProductCode, Field::SerialStart, Field::SerialEnd, date]
}

fn repeat_key<'a>(row: &'a LotRecord, keys: &[Field]) -> Vec<Option<FieldValue<'a>>> {
    keys.iter().map(|field| row.value(*field)).collect()
}

/// Returns every row whose values on `keys` occur more than once, keeping
/// all occurrences in table order. Missing values match each other.
pub fn find_repeated_rows(table: &LotTable, keys: &[Field]) -> Result<LotTable, EngineError> {
    table.require("repeated-row detection", keys)?;

    let mut counts: HashMap<Vec<Option<FieldValue<'_>>>, usize> = HashMap::new();
    for row in &table.rows {
        *counts.entry(repeat_key(row, keys)).or_insert(0) += 1;
    }
    let rows = table
        .rows
        .iter()
        .filter(|row| counts.get(&repeat_key(row, keys)).is_some_and(|count| *count > 1))
        .cloned()
        .collect();
    Ok(LotTable::new(table.columns.clone(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lot(code: &str, start: Option<i64>, end: Option<i64>) -> LotRecord {
        LotRecord::new(code).with_serials(start, end)
    }

    fn serial_table(rows: Vec<LotRecord>) -> LotTable {
        LotTable::with_fields(&[Field::ProductCode, Field::SerialStart, Field::SerialEnd], rows)
    }

    #[test]
    fn adjacent_flags_mark_both_sides() {
        let a = lot("A", Some(1), Some(10));
        let b = lot("A", Some(10), Some(20));
        let c = lot("A", Some(30), Some(40));
        assert_eq!(flag_adjacent_overlaps(&[&a, &b, &c]), vec![true, true, false]);
    }

    #[test]
    fn detection_sorts_within_partition_before_scanning() {
        let table = serial_table(vec![
            lot("A", Some(50), Some(60)),
            lot("A", Some(1), Some(55)),
            lot("A", Some(100), Some(110)),
        ]);
        let found = detect_overlaps(&table).unwrap();
        let starts = found.rows.iter().map(|r| r.serial_start).collect::<Vec<_>>();
        assert_eq!(starts, vec![Some(1), Some(50)]);
    }

    #[test]
    fn rows_without_code_are_ignored() {
        let mut orphan = lot("A", Some(1), Some(10));
        orphan.product_code = None;
        let table = serial_table(vec![orphan.clone(), orphan]);
        assert!(detect_overlaps(&table).unwrap().is_empty());
    }

    #[test]
    fn default_repeat_keys_fall_back_to_test_date() {
        let table = LotTable::with_fields(
            &[Field::ProductCode, Field::SerialStart, Field::SerialEnd, Field::TestDate],
            Vec::new(),
        );
        assert_eq!(default_repeat_keys(&table)[3], Field::TestDate);
    }
}
