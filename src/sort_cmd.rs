use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::info;

use crate::{LoadedSheet, cli::SortArgs, format::preview_rows, io_utils, sort::SortKey, table};

pub fn execute(args: &SortArgs) -> Result<()> {
    if args.preview.is_some() && args.output.is_some() {
        return Err(anyhow!("--preview cannot be combined with --output"));
    }
    let mut sheet = LoadedSheet::load(&args.input)?;
    let overrides = parse_sort_keys(&args.sort)?;
    if !overrides.is_empty() {
        sheet.config.sort_keys = overrides;
    }

    let prepared = sheet
        .prepare()
        .with_context(|| format!("Sorting {:?}", args.input.input))?;
    let lots = prepared.table;
    info!(
        "Sorted {} row(s) by {}",
        lots.len(),
        prepared.sort_keys.iter().join(", ")
    );

    if let Some(limit) = args.preview {
        table::print_table(&lots.columns, &preview_rows(&lots, limit));
        return Ok(());
    }

    let output_path = args.output.as_deref();
    let delimiter = io_utils::resolve_output_delimiter(output_path, sheet.delimiter);
    io_utils::write_rows(output_path, delimiter, &lots.columns, &lots.render_rows())?;
    if let Some(path) = output_path.filter(|p| !io_utils::is_dash(p)) {
        info!("Wrote {} row(s) to {path:?}", lots.len());
    }
    Ok(())
}

/// Accepts repeated `--sort` flags as well as comma-separated lists.
fn parse_sort_keys(specs: &[String]) -> Result<Vec<SortKey>> {
    specs
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SortKey::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lots::Field;

    #[test]
    fn sort_flags_split_on_commas() {
        let keys = parse_sort_keys(&[
            "product_code, serial_start:desc".to_string(),
            "ship_date".to_string(),
        ])
        .expect("parse keys");
        assert_eq!(
            keys,
            vec![
                SortKey::ascending(Field::ProductCode),
                SortKey {
                    field: Field::SerialStart,
                    ascending: false
                },
                SortKey::ascending(Field::ShipDate),
            ]
        );
        assert!(parse_sort_keys(&["bogus".to_string()]).is_err());
    }
}
