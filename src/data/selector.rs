// ============================================================
// Layer 4 — Feature Selector
// ============================================================
// Turns a RawTable into a fully numeric, fully labelled Dataset.
//
// Selection rules (applied in order):
//   1. The label column must exist                → else MissingColumn
//   2. Any column with a missing cell is dropped  (whole input)
//   3. Identifier / timestamp / window columns are dropped
//   4. Rows with a missing label are dropped
//   5. Every remaining cell must parse as a finite f64
//                                                 → else MalformedValue
//   6. At least one feature must remain           → else NoFeatures
//
// For the real training file this leaves 52 sensor features
// out of 160 columns.
//
// The quiz pool is projected onto the same feature names so the
// trained models see exactly the training layout.

use crate::data::{dataset::Dataset, loader::RawTable};
use crate::domain::{
    error::PipelineError,
    label::Label,
    record::{QuizRecord, Record},
};

/// Identifier, timestamp and windowing columns of the sensor files.
pub const DEFAULT_EXCLUDED_COLUMNS: [&str; 8] = [
    "",
    "X",
    "user_name",
    "raw_timestamp_part_1",
    "raw_timestamp_part_2",
    "cvtd_timestamp",
    "new_window",
    "num_window",
];

pub const DEFAULT_LABEL_COLUMN: &str = "classe";

pub const DEFAULT_QUIZ_ID_COLUMN: &str = "problem_id";

pub struct FeatureSelector {
    label_column: String,
    excluded:     Vec<String>,
}

impl FeatureSelector {
    pub fn new(label_column: impl Into<String>, excluded: &[String]) -> Self {
        Self {
            label_column: label_column.into(),
            excluded:     excluded.to_vec(),
        }
    }

    /// Apply the selection rules and build the labelled Dataset.
    pub fn select(&self, table: &RawTable) -> Result<Dataset, PipelineError> {
        let label_idx = table
            .column_index(&self.label_column)
            .ok_or_else(|| PipelineError::MissingColumn(self.label_column.clone()))?;

        let feature_cols: Vec<usize> = (0..table.headers.len())
            .filter(|&c| c != label_idx)
            .filter(|&c| !self.is_excluded(&table.headers[c]))
            .filter(|&c| table.missing_count(c) == 0)
            .collect();

        if feature_cols.is_empty() {
            return Err(PipelineError::NoFeatures);
        }

        let feature_names: Vec<String> = feature_cols
            .iter()
            .map(|&c| table.headers[c].clone())
            .collect();

        let mut records     = Vec::with_capacity(table.row_count());
        let mut unlabelled  = 0usize;

        for (row_idx, row) in table.rows.iter().enumerate() {
            let label = match row.get(label_idx).and_then(Option::as_deref) {
                Some(symbol) => symbol.parse::<Label>()?,
                None => {
                    unlabelled += 1;
                    continue;
                }
            };

            let features = feature_cols
                .iter()
                .map(|&c| parse_cell(row_idx, &table.headers[c], row.get(c).and_then(Option::as_deref)))
                .collect::<Result<Vec<f64>, PipelineError>>()?;

            records.push(Record::new(row_idx, features, label));
        }

        if unlabelled > 0 {
            tracing::warn!("Dropped {} rows without a '{}' value", unlabelled, self.label_column);
        }

        tracing::info!(
            "Feature selection kept {} of {} columns and {} of {} rows",
            feature_names.len(),
            table.headers.len(),
            records.len(),
            table.row_count()
        );

        Ok(Dataset::new(feature_names, records))
    }

    /// Project the quiz pool onto `feature_names`.
    /// Every listed feature must exist and be present in every quiz row.
    pub fn project_quiz(
        &self,
        table:         &RawTable,
        feature_names: &[String],
        id_column:     &str,
    ) -> Result<Vec<QuizRecord>, PipelineError> {
        let cols = feature_names
            .iter()
            .map(|name| {
                table
                    .column_index(name)
                    .ok_or_else(|| PipelineError::MissingColumn(name.clone()))
            })
            .collect::<Result<Vec<usize>, PipelineError>>()?;

        let id_idx = table.column_index(id_column);

        table
            .rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let problem_id = id_idx
                    .and_then(|i| row.get(i).cloned().flatten())
                    .unwrap_or_else(|| (row_idx + 1).to_string());

                let features = cols
                    .iter()
                    .zip(feature_names)
                    .map(|(&c, name)| parse_cell(row_idx, name, row.get(c).and_then(Option::as_deref)))
                    .collect::<Result<Vec<f64>, PipelineError>>()?;

                Ok(QuizRecord::new(problem_id, features))
            })
            .collect()
    }

    fn is_excluded(&self, header: &str) -> bool {
        self.excluded.iter().any(|e| e == header)
    }
}

pub fn default_excluded_columns() -> Vec<String> {
    DEFAULT_EXCLUDED_COLUMNS.iter().map(|s| s.to_string()).collect()
}

fn parse_cell(row: usize, column: &str, cell: Option<&str>) -> Result<f64, PipelineError> {
    let malformed = |value: &str| PipelineError::MalformedValue {
        row,
        column: column.to_string(),
        value:  value.to_string(),
    };

    let text = cell.ok_or_else(|| malformed("<missing>"))?;
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(malformed(text)),
    }
}
