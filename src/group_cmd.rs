use anyhow::{Context, Result};
use log::info;

use crate::{
    LoadedSheet,
    cli::GroupArgs,
    group::{SerialLogGroup, group_serial_logs},
    io_utils,
};

const EXPORT_COLUMNS: [&str; 5] = ["product_code", "test_date", "ship_date", "serial_start", "serial_end"];

pub fn execute(args: &GroupArgs) -> Result<()> {
    let sheet = LoadedSheet::load(&args.input)?;
    let prepared = sheet.prepare()?;
    let groups = group_serial_logs(&prepared.table)
        .with_context(|| format!("Grouping serial logs from {:?}", args.input.input))?;
    info!(
        "Grouped {} serial range(s) under {} product code(s)",
        groups.iter().map(|g| g.serial_logs.len()).sum::<usize>(),
        groups.len()
    );

    match args.output.as_deref() {
        Some(path) => {
            let delimiter = io_utils::resolve_output_delimiter(Some(path), sheet.delimiter);
            let headers = EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>();
            io_utils::write_rows(Some(path), delimiter, &headers, &flatten_groups(&groups))?;
        }
        None => {
            let json = serde_json::to_string_pretty(&groups).context("Serializing serial log groups")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn flatten_groups(groups: &[SerialLogGroup]) -> Vec<Vec<String>> {
    let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    groups
        .iter()
        .flat_map(|group| {
            group.serial_logs.iter().map(move |log| {
                vec![
                    group.product_code.clone(),
                    date(log.test_date),
                    date(log.ship_date),
                    log.serial_start.to_string(),
                    log.serial_end.to_string(),
                ]
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::SerialLog;
    use chrono::NaiveDate;

    #[test]
    fn flattened_rows_repeat_the_product_code() {
        let groups = vec![SerialLogGroup {
            product_code: "A".to_string(),
            serial_logs: vec![
                SerialLog {
                    test_date: None,
                    ship_date: NaiveDate::from_ymd_opt(2024, 2, 1),
                    serial_start: 1,
                    serial_end: 10,
                },
                SerialLog {
                    test_date: None,
                    ship_date: None,
                    serial_start: 11,
                    serial_end: 20,
                },
            ],
        }];
        assert_eq!(
            flatten_groups(&groups),
            vec![
                vec!["A", "", "2024-02-01", "1", "10"],
                vec!["A", "", "", "11", "20"],
            ]
        );
    }
}
