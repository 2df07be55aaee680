use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::info;
use serde::Serialize;

use crate::{
    LoadedSheet,
    analyze_cmd::print_yield_stats,
    cli::{RepeatsArgs, YieldArgs},
    format::preview_rows,
    insight::summarize_insights,
    lots::Field,
    normalize::{SynonymTable, fold_header},
    overlap::{default_repeat_keys, detect_overlaps, find_repeated_rows},
    table,
    yields::{ProductYieldStat, aggregate_yield},
};

#[derive(Debug, Serialize)]
struct YieldReport<'a> {
    yield_stats: &'a [ProductYieldStat],
    insight: &'a str,
}

pub fn execute_yield(args: &YieldArgs) -> Result<()> {
    let sheet = LoadedSheet::load(&args.input)?;
    let prepared = sheet.prepare()?;
    let lots = if args.duplicates_only {
        let duplicates = detect_overlaps(&prepared.table)?;
        info!("Restricting yield to {} overlapping row(s)", duplicates.len());
        duplicates
    } else {
        prepared.table
    };
    let stats = aggregate_yield(&lots)
        .with_context(|| format!("Aggregating yield for {:?}", args.input.input))?;
    let locale = args.locale.unwrap_or(sheet.config.locale);
    let insight = summarize_insights(&stats, locale);

    if args.json {
        let report = YieldReport {
            yield_stats: &stats,
            insight: &insight,
        };
        let json = serde_json::to_string_pretty(&report).context("Serializing yield report")?;
        println!("{json}");
        return Ok(());
    }
    print_yield_stats(&stats);
    if !insight.is_empty() {
        println!();
        println!("{insight}");
    }
    Ok(())
}

pub fn execute_repeats(args: &RepeatsArgs) -> Result<()> {
    let sheet = LoadedSheet::load(&args.input)?;
    let prepared = sheet.prepare()?;
    let keys = if args.keys.is_empty() {
        default_repeat_keys(&prepared.table)
    } else {
        resolve_keys(&args.keys, &sheet.config.synonyms)?
    };
    let repeated = find_repeated_rows(&prepared.table, &keys)?;
    info!(
        "{} row(s) share a key on [{}]",
        repeated.len(),
        keys.iter().join(", ")
    );
    table::print_table(&repeated.columns, &preview_rows(&repeated, 0));
    Ok(())
}

/// Accepts canonical field names or any raw header the profile maps to one.
fn resolve_keys(names: &[String], synonyms: &SynonymTable) -> Result<Vec<Field>> {
    names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            let folded = fold_header(name);
            Field::from_name(synonyms.resolve(&folded))
                .ok_or_else(|| anyhow!("Unknown key field '{name}'"))
        })
        .collect()
}
