//! Column profile: which headers are admissible, what they are called, and
//! how the pipeline orders and describes the result.
//!
//! Profiles are YAML documents; every key is optional and falls back to the
//! built-in profile for lot ledgers exported from the shop-floor workbook.

use std::{collections::BTreeMap, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    analysis::PipelineConfig,
    filter::{FilterCondition, parse_filters},
    insight::Locale,
    normalize::{CollisionPolicy, SynonymTable, fold_header},
    sort::{SortKey, default_sort_keys},
};

const DEFAULT_ALLOWED_COLUMNS: &[&str] = &[
    "package", "partno", "codes", "lotno", "dcode", "testdate", "shipdate", "boxno", "serialst",
    "serialsp", "inqty", "currqty", "testedqty", "goodqty", "yld", "이슈사항",
];

const DEFAULT_SYNONYMS: &[(&str, &str)] = &[
    ("package", "package"),
    ("partno", "part_no"),
    ("codes", "product_code"),
    ("lotno", "lot_no"),
    ("dcode", "date_code"),
    ("testdate", "test_date"),
    ("shipdate", "ship_date"),
    ("boxno", "box_no"),
    ("serialst", "serial_start"),
    ("serialsp", "serial_end"),
    ("inqty", "in_qty"),
    ("currqty", "curr_qty"),
    ("testedqty", "tested_qty"),
    ("goodqty", "good_qty"),
    ("yld", "yield"),
    ("이슈사항", "notes"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnProfile {
    pub allowed_columns: Vec<String>,
    pub synonyms: BTreeMap<String, String>,
    pub collision: CollisionPolicy,
    pub sort_keys: Vec<String>,
    pub locale: Locale,
}

impl Default for ColumnProfile {
    fn default() -> Self {
        Self {
            allowed_columns: DEFAULT_ALLOWED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            synonyms: DEFAULT_SYNONYMS
                .iter()
                .map(|(raw, canonical)| (raw.to_string(), canonical.to_string()))
                .collect(),
            collision: CollisionPolicy::default(),
            sort_keys: default_sort_keys().iter().map(|k| k.to_string()).collect(),
            locale: Locale::default(),
        }
    }
}

impl ColumnProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("Opening profile file {path:?}"))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Parsing profile {path:?}"))
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = self.to_yaml_string()?;
        fs::write(path, yaml).with_context(|| format!("Writing profile to {path:?}"))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing profile")
    }

    pub fn synonym_table(&self) -> SynonymTable {
        SynonymTable::new(self.synonyms.iter())
    }

    pub fn sort_keys(&self) -> Result<Vec<SortKey>> {
        self.sort_keys
            .iter()
            .map(|spec| SortKey::parse(spec).with_context(|| format!("Profile sort key '{spec}'")))
            .collect()
    }

    /// Maps a user-facing column name (raw or canonical) to its canonical form.
    pub fn canonical_column(&self, name: &str) -> String {
        let folded = fold_header(name);
        self.synonym_table().resolve(&folded).to_string()
    }

    /// Parses `filters` and resolves their column names against the profile
    /// so `codes in A` and `product_code in A` mean the same thing.
    pub fn filters(&self, filters: &[String]) -> Result<Vec<FilterCondition>> {
        let mut conditions = parse_filters(filters)?;
        for condition in &mut conditions {
            condition.column = self.canonical_column(&condition.column);
        }
        Ok(conditions)
    }

    pub fn pipeline_config(&self, filters: &[String]) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            allowed_columns: self.allowed_columns.clone(),
            synonyms: self.synonym_table(),
            collision: self.collision.clone(),
            sort_keys: self.sort_keys()?,
            filters: self.filters(filters)?,
            locale: self.locale,
        })
    }
}
