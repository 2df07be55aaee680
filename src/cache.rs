//! Single-slot store for the most recent analysis result.
//!
//! The store is owned by the command layer and handed the result after the
//! pipeline returns; the engine never sees it. Writes are last-writer-wins.

use std::{
    fs,
    path::Path,
    sync::{PoisonError, RwLock},
};

use anyhow::{Context, Result};

use crate::analysis::AnalysisResult;

#[derive(Debug, Default)]
pub struct LatestResult {
    slot: RwLock<Option<AnalysisResult>>,
}

impl LatestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, result: AnalysisResult) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(result);
    }

    pub fn get(&self) -> Option<AnalysisResult> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reads a persisted slot; a missing file is an empty slot.
    pub fn load(path: &Path) -> Result<Self> {
        let store = Self::new();
        if !path.exists() {
            return Ok(store);
        }
        let raw = fs::read_to_string(path).with_context(|| format!("Opening result cache {path:?}"))?;
        let result: AnalysisResult =
            serde_json::from_str(&raw).with_context(|| format!("Parsing result cache {path:?}"))?;
        store.set(result);
        Ok(store)
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let Some(result) = self.get() else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating result cache directory {parent:?}"))?;
        }
        let json = serde_json::to_string_pretty(&result).context("Serializing analysis result")?;
        fs::write(path, json).with_context(|| format!("Writing result cache {path:?}"))
    }
}
