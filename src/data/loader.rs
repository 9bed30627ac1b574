// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads a comma-separated file into a RawTable: a header row
// plus rows of optional string cells.
//
// The source files mark missing values three different ways:
//   ""          — empty cell
//   "NA"        — R's missing marker
//   "#DIV/0!"   — spreadsheet division error
// All three become `None` here, so later stages only ever see
// `Option<String>` and never have to know about the markers.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{io::Read, path::PathBuf};

use crate::domain::traits::TableSource;

/// Cell values treated as missing.
pub const DEFAULT_MISSING_MARKERS: [&str; 3] = ["", "NA", "#DIV/0!"];

/// Header row plus rows of cells; `None` marks a missing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows:    Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Parse CSV text from any reader. The first record is the header.
    pub fn from_reader<R: Read>(reader: R, missing_markers: &[String]) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (i, result) in csv_reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read CSV record {}", i + 1))?;
            let row = record
                .iter()
                .map(|cell| {
                    if missing_markers.iter().any(|m| m == cell) {
                        None
                    } else {
                        Some(cell.to_string())
                    }
                })
                .collect();
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Position of a header by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of `None` cells in one column
    pub fn missing_count(&self, column: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.get(column).map_or(true, Option::is_none))
            .count()
    }
}

/// Loads a RawTable from a CSV file on disk.
/// Implements the TableSource trait from Layer 3.
pub struct CsvLoader {
    path:            PathBuf,
    missing_markers: Vec<String>,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>, missing_markers: &[String]) -> Self {
        Self {
            path:            path.into(),
            missing_markers: missing_markers.to_vec(),
        }
    }
}

impl TableSource for CsvLoader {
    fn load(&self) -> Result<RawTable> {
        let file = std::fs::File::open(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;

        let table = RawTable::from_reader(file, &self.missing_markers)
            .with_context(|| format!("Cannot parse '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded '{}': {} rows x {} columns",
            self.path.display(),
            table.row_count(),
            table.headers.len()
        );
        Ok(table)
    }
}

/// The default markers as owned strings, for configuration defaults
pub fn default_missing_markers() -> Vec<String> {
    DEFAULT_MISSING_MARKERS.iter().map(|s| s.to_string()).collect()
}
