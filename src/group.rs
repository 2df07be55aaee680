use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    data::compare_missing_last,
    error::EngineError,
    lots::{Field, LotTable},
    overlap::partition_by_code,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialLog {
    pub test_date: Option<NaiveDate>,
    pub ship_date: Option<NaiveDate>,
    pub serial_start: i64,
    pub serial_end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialLogGroup {
    pub product_code: String,
    pub serial_logs: Vec<SerialLog>,
}

/// Per product code (ascending), the rows carrying both serial bounds ordered
/// by ship date with undated shipments last.
pub fn group_serial_logs(table: &LotTable) -> Result<Vec<SerialLogGroup>, EngineError> {
    table.require(
        "serial grouping",
        &[
            Field::ProductCode,
            Field::TestDate,
            Field::ShipDate,
            Field::SerialStart,
            Field::SerialEnd,
        ],
    )?;

    let groups = partition_by_code(&table.rows)
        .into_iter()
        .filter_map(|(code, mut rows)| {
            rows.retain(|row| row.serial_start.is_some() && row.serial_end.is_some());
            rows.sort_by(|a, b| compare_missing_last(a.ship_date, b.ship_date, true));
            let serial_logs = rows
                .into_iter()
                .filter_map(|row| {
                    Some(SerialLog {
                        test_date: row.test_date,
                        ship_date: row.ship_date,
                        serial_start: row.serial_start?,
                        serial_end: row.serial_end?,
                    })
                })
                .collect::<Vec<_>>();
            (!serial_logs.is_empty()).then(|| SerialLogGroup {
                product_code: code.to_string(),
                serial_logs,
            })
        })
        .collect();
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lots::LotRecord;

    fn dated(code: &str, ship: Option<(i32, u32, u32)>, start: Option<i64>) -> LotRecord {
        let mut row = LotRecord::new(code).with_serials(start, start.map(|s| s + 9));
        row.ship_date = ship.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        row
    }

    #[test]
    fn groups_order_by_ship_date_and_drop_rows_without_serials() {
        let table = LotTable::with_fields(
            &[
                Field::ProductCode,
                Field::TestDate,
                Field::ShipDate,
                Field::SerialStart,
                Field::SerialEnd,
            ],
            vec![
                dated("B", None, Some(1)),
                dated("B", Some((2024, 2, 1)), Some(20)),
                dated("A", Some((2024, 1, 1)), None),
                dated("B", Some((2024, 1, 15)), Some(10)),
            ],
        );
        let groups = group_serial_logs(&table).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].product_code, "B");
        let starts = groups[0]
            .serial_logs
            .iter()
            .map(|log| log.serial_start)
            .collect::<Vec<_>>();
        assert_eq!(starts, vec![10, 20, 1]);
    }

    #[test]
    fn grouping_requires_date_columns() {
        let table = LotTable::with_fields(
            &[Field::ProductCode, Field::SerialStart, Field::SerialEnd],
            Vec::new(),
        );
        let err = group_serial_logs(&table).unwrap_err();
        assert_eq!(err.missing_columns(), ["test_date", "ship_date"]);
    }
}
