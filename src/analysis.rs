//! The end-to-end lot pipeline:
//! normalize → coerce → filter/sort → detect overlaps → aggregate → summarize.

use serde::{Deserialize, Serialize, Serializer};

use crate::{
    error::{CoercionWarning, EngineError},
    filter::FilterCondition,
    insight::{Locale, summarize_insights},
    lots::{LotRecord, LotTable},
    normalize::{CollisionPolicy, SynonymTable, Table, normalize},
    overlap::detect_overlaps,
    sort::{SortKey, effective_sort_keys, filter_and_sort},
    yields::{ProductYieldStat, aggregate_yield},
};

/// Everything the pipeline needs besides the table itself.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub allowed_columns: Vec<String>,
    pub synonyms: SynonymTable,
    pub collision: CollisionPolicy,
    pub sort_keys: Vec<SortKey>,
    pub filters: Vec<FilterCondition>,
    pub locale: Locale,
}

/// A normalized, coerced, filtered and sorted lot table.
#[derive(Debug, Clone)]
pub struct PreparedLots {
    pub table: LotTable,
    pub sort_keys: Vec<SortKey>,
    pub warnings: Vec<CoercionWarning>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_rows: usize,
    pub duplicate_rows: usize,
    /// Canonical columns of the normalized sheet, in order.
    pub columns: Vec<String>,
    pub duplicates: Vec<LotRecord>,
    pub yield_stats: Vec<ProductYieldStat>,
    pub insight: String,
    pub applied_filters: Vec<String>,
    pub sort_keys: Vec<String>,
    pub warnings: Vec<CoercionWarning>,
}

pub fn prepare(raw: &Table, config: &PipelineConfig) -> Result<PreparedLots, EngineError> {
    let normalized = normalize(raw, &config.allowed_columns, &config.synonyms, &config.collision)?;
    let (lots, warnings) = LotTable::from_table(&normalized);
    let sort_keys = effective_sort_keys(&lots, &config.sort_keys);
    let table = filter_and_sort(lots, &config.filters, &sort_keys)?;
    Ok(PreparedLots {
        table,
        sort_keys,
        warnings,
    })
}

/// Runs the whole pipeline. Yield stats cover the duplicate rows.
pub fn analyze(raw: &Table, config: &PipelineConfig) -> Result<AnalysisResult, EngineError> {
    let prepared = prepare(raw, config)?;
    let duplicates = detect_overlaps(&prepared.table)?;
    let yield_stats = aggregate_yield(&duplicates)?;
    let insight = summarize_insights(&yield_stats, config.locale);
    Ok(AnalysisResult {
        total_rows: prepared.table.len(),
        duplicate_rows: duplicates.len(),
        columns: duplicates.columns,
        duplicates: duplicates.rows,
        yield_stats,
        insight,
        applied_filters: display_all(&config.filters),
        sort_keys: display_all(&prepared.sort_keys),
        warnings: prepared.warnings,
    })
}

impl AnalysisResult {
    pub fn duplicate_table(&self) -> LotTable {
        LotTable::new(self.columns.clone(), self.duplicates.clone())
    }
}

fn display_all<T: ToString>(items: &[T]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

/// Wraps a result the way the result endpoint always has: `{"result": ...}`.
#[derive(Debug, Serialize)]
pub struct ResultEnvelope<'a> {
    #[serde(serialize_with = "serialize_or_empty")]
    pub result: Option<&'a AnalysisResult>,
}

fn serialize_or_empty<S: Serializer>(
    result: &Option<&AnalysisResult>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match result {
        Some(result) => result.serialize(serializer),
        None => AnalysisResult::default().serialize(serializer),
    }
}
