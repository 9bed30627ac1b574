// ============================================================
// Layer 6 — Artifact Store
// ============================================================
// Owns the output directory of a run and everything written
// into it:
//
//   report/
//     run_config.json    ← the exact ReportConfig of the run
//     report.md          ← Markdown report (tables + scatter)
//     summary.json       ← headline numbers, machine readable
//     fold_metrics.csv   ← written by MetricsLogger
//
// The saved config can be passed back with `--config` to
// reproduce a run.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::report_use_case::{ReportConfig, RunOutcome, SplitSizes};
use crate::domain::label::Label;
use crate::ml::evaluator::{ClassStats, QuizPrediction};

const CONFIG_FILE:  &str = "run_config.json";
const REPORT_FILE:  &str = "report.md";
const SUMMARY_FILE: &str = "summary.json";

/// Headline numbers of a run as written to summary.json
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub sizes:                      SplitSizes,
    pub feature_count:              usize,
    pub fold_ensemble_sizes:        Vec<usize>,
    pub validation_accuracies:      Vec<f64>,
    pub stacker_in_sample_accuracy: f64,
    pub evaluation_base_accuracies: &'a [f64],
    pub evaluation_accuracy:        f64,
    pub kappa:                      f64,
    pub class_stats:                Vec<ClassStats>,
    /// Counts as [predicted][actual], rows and columns in A..E order
    pub confusion:                  Vec<Vec<usize>>,
    pub quiz:                       &'a [QuizPrediction],
}

impl<'a> RunSummary<'a> {
    pub fn from_outcome(outcome: &'a RunOutcome) -> Self {
        let eval = &outcome.evaluation;
        Self {
            sizes:                      outcome.sizes,
            feature_count:              outcome.feature_names.len(),
            fold_ensemble_sizes:        outcome.folds.iter().map(|f| f.ensemble_size).collect(),
            validation_accuracies:      outcome.stack.base_accuracies.clone(),
            stacker_in_sample_accuracy: outcome.stack.in_sample_accuracy,
            evaluation_base_accuracies: &eval.base_accuracies,
            evaluation_accuracy:        eval.stacked_accuracy,
            kappa:                      eval.confusion.kappa(),
            class_stats:                eval.class_stats(),
            confusion: Label::ALL
                .iter()
                .map(|&p| Label::ALL.iter().map(|&a| eval.confusion.get(p, a)).collect())
                .collect(),
            quiz: &outcome.quiz,
        }
    }
}

pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates the directory (and parents) if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_config(&self, cfg: &ReportConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    pub fn write_report(&self, markdown: &str) -> Result<PathBuf> {
        let path = self.dir.join(REPORT_FILE);
        fs::write(&path, markdown)
            .with_context(|| format!("Cannot write report to '{}'", path.display()))?;
        Ok(path)
    }

    pub fn save_summary(&self, outcome: &RunOutcome) -> Result<PathBuf> {
        let path = self.dir.join(SUMMARY_FILE);
        let json = serde_json::to_string_pretty(&RunSummary::from_outcome(outcome))?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write summary to '{}'", path.display()))?;
        Ok(path)
    }
}

/// Read a ReportConfig from any JSON file. Missing fields take
/// their defaults.
pub fn load_config_file(path: &Path) -> Result<ReportConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

    serde_json::from_str(&json)
        .with_context(|| format!("'{}' is not a valid run config", path.display()))
}
