#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use sheetflow::{
    analysis::PipelineConfig, io_utils, normalize::Table, profile::ColumnProfile,
};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Reads a UTF-8 fixture into a raw table.
pub fn fixture_table(name: &str) -> Table {
    io_utils::read_table(&fixture_path(name), b',', encoding_rs::UTF_8).expect("read fixture")
}

/// Builds a raw table from string literals.
pub fn raw_table(headers: &[&str], rows: &[&[&str]]) -> Table {
    Table::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
}

/// Pipeline settings from the built-in profile plus `filters`.
pub fn default_config(filters: &[&str]) -> PipelineConfig {
    let filters = filters.iter().map(|f| f.to_string()).collect::<Vec<_>>();
    ColumnProfile::default()
        .pipeline_config(&filters)
        .expect("default pipeline config")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
