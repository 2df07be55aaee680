//! Human-oriented cell formatting for previews: thousands separators on
//! quantity columns and the yield ratio rendered as a percentage.

use crate::{data::parse_integer, lots::LotTable};

const QUANTITY_COLUMNS: &[&str] = &["in_qty", "curr_qty", "tested_qty", "good_qty"];
const YIELD_COLUMN: &str = "yield";

pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats one cell for display. Values that do not parse are shown as-is.
pub fn format_preview_cell(column: &str, cell: &str) -> String {
    if cell.is_empty() {
        return String::new();
    }
    if QUANTITY_COLUMNS.contains(&column) {
        return parse_integer(cell)
            .map(format_thousands)
            .unwrap_or_else(|_| cell.to_string());
    }
    if column == YIELD_COLUMN {
        return match cell.trim().parse::<f64>() {
            Ok(ratio) => format!("{:.1}%", ratio * 100.0),
            Err(_) => cell.to_string(),
        };
    }
    cell.to_string()
}

/// Renders up to `limit` rows (0 = all) with preview formatting applied.
pub fn preview_rows(table: &LotTable, limit: usize) -> Vec<Vec<String>> {
    let take = if limit == 0 { table.len() } else { limit };
    table
        .rows
        .iter()
        .take(take)
        .map(|row| {
            table
                .columns
                .iter()
                .map(|column| format_preview_cell(column, &row.render_cell(column)))
                .collect()
        })
        .collect()
}
