//! I/O helpers for reading sheet exports and writing CSV output.
//!
//! All file access in sheetflow flows through this module:
//!
//! - **Delimiter resolution**: `.tsv` → tab, anything else → comma, with
//!   manual override support.
//! - **Encoding**: input decoding via `encoding_rs` (UTF-8 by default; legacy
//!   exports are often `euc-kr`). A leading byte-order mark is stripped.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::normalize::Table;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Output files follow their extension; stdout keeps the input delimiter.
pub fn resolve_output_delimiter(path: Option<&Path>, input_delimiter: u8) -> u8 {
    match path
        .filter(|p| !is_dash(p))
        .and_then(|p| p.extension())
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        Some(ext) if ext.eq_ignore_ascii_case("csv") => DEFAULT_CSV_DELIMITER,
        _ => input_delimiter,
    }
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    Ok(builder.from_reader(reader))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    // `decode` sniffs and strips a byte-order mark, which spreadsheet exports
    // put in front of the first header cell.
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads a whole delimited file into a [`Table`].
pub fn read_table(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let header_record = reader
        .byte_headers()
        .with_context(|| format!("Reading headers from {path:?}"))?
        .clone();
    let headers = decode_record(&header_record, encoding)?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        rows.push(decoded);
    }
    Ok(Table::new(headers, rows))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn write_rows(
    path: Option<&Path>,
    delimiter: u8,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<()> {
    let mut writer = open_csv_writer(path, delimiter)?;
    writer
        .write_record(headers.iter())
        .context("Writing output headers")?;
    for row in rows {
        writer.write_record(row.iter()).context("Writing output row")?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::EUC_KR;
    use tempfile::tempdir;

    #[test]
    fn read_table_strips_bom_and_decodes_legacy_encodings() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("lots.csv");
        let (encoded, _, _) = EUC_KR.encode("codes,이슈사항\nA,재검사\n");
        std::fs::write(&path, encoded.as_ref()).expect("write fixture");
        let table = read_table(&path, b',', EUC_KR).expect("read table");
        assert_eq!(table.headers, vec!["codes", "이슈사항"]);
        assert_eq!(table.rows, vec![vec!["A".to_string(), "재검사".to_string()]]);

        let bom_path = dir.path().join("bom.csv");
        std::fs::write(&bom_path, "\u{feff}codes\nA\n").expect("write bom fixture");
        let table = read_table(&bom_path, b',', UTF_8).expect("read bom table");
        assert_eq!(table.headers, vec!["codes"]);
    }

    #[test]
    fn delimiter_follows_extension() {
        assert_eq!(resolve_input_delimiter(Path::new("lots.tsv"), None), b'\t');
        assert_eq!(resolve_input_delimiter(Path::new("lots.csv"), None), b',');
        assert_eq!(resolve_input_delimiter(Path::new("lots.tsv"), Some(b';')), b';');
        assert_eq!(resolve_output_delimiter(Some(Path::new("out.tsv")), b','), b'\t');
        assert_eq!(resolve_output_delimiter(Some(Path::new("-")), b';'), b';');
        assert_eq!(resolve_output_delimiter(None, b'|'), b'|');
    }
}
