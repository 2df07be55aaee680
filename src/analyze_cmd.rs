use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    LoadedSheet,
    analysis::{AnalysisResult, ResultEnvelope, analyze},
    cache::LatestResult,
    cli::{AnalyzeArgs, ResultArgs},
    format::{format_thousands, preview_rows},
    report_warnings, table,
    yields::ProductYieldStat,
};

pub fn execute(args: &AnalyzeArgs) -> Result<()> {
    let mut sheet = LoadedSheet::load(&args.input)?;
    if let Some(locale) = args.locale {
        sheet.config.locale = locale;
    }
    debug!("Filters: {:?}", sheet.config.filters);

    let result = analyze(&sheet.raw, &sheet.config)
        .with_context(|| format!("Analyzing {:?}", args.input.input))?;
    report_warnings(&result.warnings);
    info!(
        "{} of {} row(s) fall in overlapping serial ranges",
        result.duplicate_rows, result.total_rows
    );

    if let Some(path) = &args.cache {
        let store = LatestResult::new();
        store.set(result.clone());
        store.persist(path)?;
        info!("Latest result saved to {path:?}");
    }

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Serializing analysis result")?;
        println!("{json}");
    } else {
        print_report(&result, args.preview);
    }
    Ok(())
}

/// Prints the cached latest result wrapped as `{"result": ...}`.
pub fn show_latest(args: &ResultArgs) -> Result<()> {
    let store = LatestResult::load(&args.cache)?;
    let latest = store.get();
    if latest.is_none() {
        info!("No analysis result cached at {:?}", args.cache);
    }
    let envelope = ResultEnvelope {
        result: latest.as_ref(),
    };
    let json = serde_json::to_string_pretty(&envelope).context("Serializing latest result")?;
    println!("{json}");
    Ok(())
}

fn print_report(result: &AnalysisResult, preview: usize) {
    let filters = if result.applied_filters.is_empty() {
        "-".to_string()
    } else {
        result.applied_filters.join("; ")
    };
    table::print_summary(&[
        ("rows", format_thousands(result.total_rows as i64)),
        ("duplicate rows", format_thousands(result.duplicate_rows as i64)),
        ("filters", filters),
        ("sort", result.sort_keys.join(", ")),
        ("warnings", result.warnings.len().to_string()),
    ]);

    if !result.duplicates.is_empty() {
        let duplicates = result.duplicate_table();
        let rows = preview_rows(&duplicates, preview);
        println!();
        table::print_table(&duplicates.columns, &rows);
        if rows.len() < duplicates.len() {
            println!("... {} more row(s)", duplicates.len() - rows.len());
        }
    }

    if !result.yield_stats.is_empty() {
        println!();
        print_yield_stats(&result.yield_stats);
    }
    if !result.insight.is_empty() {
        println!();
        println!("{}", result.insight);
    }
}

pub(crate) fn print_yield_stats(stats: &[ProductYieldStat]) {
    let headers = ["product_code", "tested", "good", "defects", "yield %", "defect %"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = stats
        .iter()
        .map(|stat| {
            vec![
                stat.product_code.clone(),
                format_thousands(stat.tested_total),
                format_thousands(stat.good_total),
                format_thousands(stat.defect_count),
                format!("{:.1}", stat.yield_rate),
                format!("{:.1}", stat.defect_rate),
            ]
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}
