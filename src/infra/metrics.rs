// ============================================================
// Layer 6 — Fold Metrics Logger
// ============================================================
// Records every candidate forest the Fold Trainer scored, one
// CSV row per (fold, ensemble size):
//
//   fold,ensemble_size,check_accuracy,selected
//   1,50,0.981200,false
//   1,75,0.982900,true
//   ...
//
// Output file: <output_dir>/fold_metrics.csv, rewritten per run.
//
// Reference: csv crate documentation (Writer + serde)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::ml::trainer::FoldModel;

/// One row of the fold metrics CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    /// 1-based fold number
    pub fold:           usize,
    pub ensemble_size:  usize,
    pub check_accuracy: f64,
    pub selected:       bool,
}

impl CandidateRow {
    /// Flatten every candidate of every fold into rows
    pub fn from_models(models: &[FoldModel]) -> Vec<CandidateRow> {
        models
            .iter()
            .flat_map(|m| {
                let chosen = m.candidates.iter().position(|c| {
                    c.ensemble_size == m.ensemble_size && c.check_accuracy == m.check_accuracy
                });
                m.candidates.iter().enumerate().map(move |(i, c)| CandidateRow {
                    fold:           m.fold + 1,
                    ensemble_size:  c.ensemble_size,
                    check_accuracy: c.check_accuracy,
                    selected:       Some(i) == chosen,
                })
            })
            .collect()
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        Ok(Self { csv_path: dir.join("fold_metrics.csv") })
    }

    /// Write all candidate rows, replacing any previous file.
    pub fn log(&self, rows: &[CandidateRow]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;

        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        tracing::debug!("Wrote {} candidate rows to '{}'", rows.len(), self.csv_path.display());
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_round_trip_through_csv() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path().join("out")).unwrap();
        let rows   = vec![
            CandidateRow { fold: 1, ensemble_size: 50, check_accuracy: 0.97, selected: false },
            CandidateRow { fold: 1, ensemble_size: 75, check_accuracy: 0.98, selected: true },
        ];
        logger.log(&rows).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        assert!(text.starts_with("fold,ensemble_size,check_accuracy,selected\n"));

        let mut reader = csv::Reader::from_path(logger.csv_path()).unwrap();
        let back: Vec<CandidateRow> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_rows_from_models_mark_one_selection_per_fold() {
        use crate::data::fixtures::blobs;
        use crate::ml::trainer::{train_folds, FoldConfig};

        let cfg    = FoldConfig { folds: 2, candidate_sizes: vec![3, 5], max_features: None, seed: 1 };
        let models = train_folds(&blobs(10, 4, 1), &cfg).unwrap();
        let rows   = CandidateRow::from_models(&models);

        assert_eq!(rows.len(), 4);
        for fold in 1..=2 {
            let selected = rows.iter().filter(|r| r.fold == fold && r.selected).count();
            assert_eq!(selected, 1);
        }
    }
}
