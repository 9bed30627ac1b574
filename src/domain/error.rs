// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Three families of failure, all fatal to a run:
//
//   data errors      — missing/malformed columns or cells
//   training errors  — a classifier could not be fitted
//   degenerate split — a class too small for the fold count
//
// The application layer wraps these in anyhow::Error with
// context about which step failed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("column '{0}' is not present in the input")]
    MissingColumn(String),

    #[error("no feature columns remain after removing missing-value and identifier columns")]
    NoFeatures,

    #[error("row {row}, column '{column}': '{value}' is not a finite number")]
    MalformedValue {
        row:    usize,
        column: String,
        value:  String,
    },

    #[error("unknown label '{0}' (expected one of A, B, C, D, E)")]
    UnknownLabel(String),

    #[error("{0} is empty")]
    EmptyDataset(&'static str),

    #[error("fraction {0} must lie in (0, 1]")]
    InvalidFraction(f64),

    #[error("fold count {0} must be at least 2")]
    InvalidFoldCount(usize),

    #[error("class {label} has {count} records, fewer than the {folds} folds requested")]
    DegenerateClass {
        label: String,
        count: usize,
        folds: usize,
    },

    #[error("training failed: {0}")]
    Training(String),

    #[error("expected {expected} inputs, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}
