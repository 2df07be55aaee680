use std::borrow::Cow;
use std::fmt::Write as _;

use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Renders an elastic text table. Columns whose non-empty cells are all
/// numeric (thousands separators, a decimal point or a trailing `%` allowed)
/// are right-aligned.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(3);
    }
    let aligns = (0..column_count)
        .map(|idx| column_alignment(rows, idx))
        .collect::<Vec<_>>();

    let mut output = String::new();
    let header_aligns = vec![Align::Left; column_count];
    let _ = writeln!(output, "{}", format_row(headers, &widths, &header_aligns));
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &widths, &header_aligns));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &aligns));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

/// Two-column `metric  value` listing used for run summaries.
pub fn print_summary(pairs: &[(&str, String)]) {
    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = pairs
        .iter()
        .map(|(metric, value)| vec![metric.to_string(), value.clone()])
        .collect::<Vec<_>>();
    print_table(&headers, &rows);
}

fn column_alignment(rows: &[Vec<String>], idx: usize) -> Align {
    let mut saw_value = false;
    for cell in rows.iter().filter_map(|row| row.get(idx)) {
        if cell.is_empty() {
            continue;
        }
        if !looks_numeric(cell) {
            return Align::Left;
        }
        saw_value = true;
    }
    if saw_value { Align::Right } else { Align::Left }
}

fn looks_numeric(cell: &str) -> bool {
    let body = cell.strip_suffix('%').unwrap_or(cell);
    let body = body.strip_prefix('-').unwrap_or(body);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn format_row(values: &[String], widths: &[usize], aligns: &[Align]) -> String {
    let cells = values
        .iter()
        .zip(widths.iter().zip(aligns))
        .map(|(value, (width, align))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            match align {
                Align::Left => format!("{sanitized}{padding}"),
                Align::Right => format!("{padding}{sanitized}"),
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // ANSI colour sequence, e.g. \x1b[31m
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            // Hangul and other wide glyphs take two terminal columns.
            width += ch.width().unwrap_or(0);
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_columns_align_right() {
        let headers = vec!["code".to_string(), "qty".to_string()];
        let rows = vec![
            vec!["A".to_string(), "1,000".to_string()],
            vec!["BB".to_string(), "5".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["code  qty", "----  -----", "A     1,000", "BB        5"]);
    }

    #[test]
    fn wide_characters_count_double() {
        assert_eq!(display_width("재검사"), 6);
        assert_eq!(display_width("\u{1b}[31mA1\u{1b}[0m"), 2);
        let headers = vec!["이슈사항".to_string(), "qty".to_string()];
        let rows = vec![vec!["재검사".to_string(), "5".to_string()]];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["이슈사항  qty", "--------  ---", "재검사      5"]);
    }

    #[test]
    fn control_characters_are_flattened() {
        let headers = vec!["notes".to_string()];
        let rows = vec![vec!["line1\nline2\tvalue".to_string()]];
        let rendered = render_table(&headers, &rows);
        assert_eq!(rendered.lines().nth(2), Some("line1 line2 value"));
    }

    #[test]
    fn percent_and_negative_values_count_as_numeric() {
        assert!(looks_numeric("97.5%"));
        assert!(looks_numeric("-12"));
        assert!(!looks_numeric("%"));
        assert!(!looks_numeric("L-01"));
    }
}
