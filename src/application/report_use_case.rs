// ============================================================
// Layer 2 — ReportUseCase
// ============================================================
// Orchestrates the full analysis in order:
//
//   Step 1: Fetch or locate both CSV files   (Layer 6 - infra)
//   Step 2: Load raw tables                  (Layer 4 - data)
//   Step 3: Select complete numeric features (Layer 4 - data)
//   Step 4: Split Evaluation off the pool    (Layer 4 - data)
//   Step 5: Split Training / Validation      (Layer 4 - data)
//   Step 6: Train one forest per fold        (Layer 5 - ml)
//   Step 7: Stack the fold models            (Layer 5 - ml)
//   Step 8: Evaluate + predict the quiz pool (Layer 5 - ml)
//   Step 9: Write report and metrics         (Layer 6 - infra)
//
// Steps 3-8 are `run_pipeline`, a pure function of the two
// tables and the config; `execute` wraps it with the I/O.
//
// Each random stage gets its own seed derived from `seed`, so
// changing one stage never reshuffles another.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{
    dataset::Dataset,
    loader::{default_missing_markers, CsvLoader, RawTable},
    selector::{default_excluded_columns, FeatureSelector, DEFAULT_LABEL_COLUMN, DEFAULT_QUIZ_ID_COLUMN},
    splitter::stratified_partition,
};
use crate::domain::traits::TableSource;
use crate::infra::{
    artifacts::ArtifactStore,
    fetcher::{DatasetFetcher, DEFAULT_QUIZ_URL, DEFAULT_TRAINING_URL},
    metrics::{CandidateRow, MetricsLogger},
    report::render_markdown,
};
use crate::ml::{
    evaluator::{evaluate, predict_quiz, Evaluation, QuizPrediction},
    forest::derive_seed,
    stacker::{fit_stacker, StackOutcome, StackerConfig},
    trainer::{train_folds, FoldConfig, FoldModel, DEFAULT_CANDIDATE_SIZES},
};

// ─── Report Configuration ────────────────────────────────────────────────────
// Every knob of a run. Serialisable so it can be loaded from a
// JSON file and saved next to the report it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub training_url:        String,
    pub quiz_url:            String,
    /// Local file used instead of downloading `training_url`
    pub training_csv:        Option<String>,
    /// Local file used instead of downloading `quiz_url`
    pub quiz_csv:            Option<String>,
    pub data_dir:            String,
    pub output_dir:          String,
    pub offline:             bool,
    pub seed:                u64,
    /// Share of the pool held out for Evaluation
    pub evaluation_fraction: f64,
    /// Share of the remaining pool used for Validation
    pub validation_fraction: f64,
    pub folds:               usize,
    pub candidate_sizes:     Vec<usize>,
    pub stacker_trees:       usize,
    pub max_features:        Option<usize>,
    pub label_column:        String,
    pub quiz_id_column:      String,
    pub excluded_columns:    Vec<String>,
    pub missing_markers:     Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            training_url:        DEFAULT_TRAINING_URL.to_string(),
            quiz_url:            DEFAULT_QUIZ_URL.to_string(),
            training_csv:        None,
            quiz_csv:            None,
            data_dir:            "data".to_string(),
            output_dir:          "report".to_string(),
            offline:             false,
            seed:                1_234,
            evaluation_fraction: 0.2,
            validation_fraction: 0.25,
            folds:               5,
            candidate_sizes:     DEFAULT_CANDIDATE_SIZES.to_vec(),
            stacker_trees:       100,
            max_features:        None,
            label_column:        DEFAULT_LABEL_COLUMN.to_string(),
            quiz_id_column:      DEFAULT_QUIZ_ID_COLUMN.to_string(),
            excluded_columns:    default_excluded_columns(),
            missing_markers:     default_missing_markers(),
        }
    }
}

impl ReportConfig {
    fn stage_seed(&self, stage: u64) -> u64 {
        derive_seed(self.seed, &[stage])
    }

    pub fn fold_config(&self) -> FoldConfig {
        FoldConfig {
            folds:           self.folds,
            candidate_sizes: self.candidate_sizes.clone(),
            max_features:    self.max_features,
            seed:            self.stage_seed(3),
        }
    }

    pub fn stacker_config(&self) -> StackerConfig {
        StackerConfig {
            n_trees: self.stacker_trees,
            seed:    self.stage_seed(4),
        }
    }

    pub fn scatter_seed(&self) -> u64 {
        self.stage_seed(5)
    }
}

/// Record counts at each stage of the split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitSizes {
    pub pool:       usize,
    pub training:   usize,
    pub validation: usize,
    pub evaluation: usize,
}

/// Everything a run produces, held only in memory.
#[derive(Debug)]
pub struct RunOutcome {
    pub feature_names: Vec<String>,
    pub sizes:         SplitSizes,
    pub folds:         Vec<FoldModel>,
    pub stack:         StackOutcome,
    pub evaluation:    Evaluation,
    pub quiz:          Vec<QuizPrediction>,
}

/// The three disjoint subsets of the labelled pool.
#[derive(Debug, Clone)]
pub struct Subsets {
    pub training:   Dataset,
    pub validation: Dataset,
    pub evaluation: Dataset,
}

/// Steps 4-5: carve Evaluation off the pool, then split the rest
/// into Training and Validation.
pub fn split_pool(cfg: &ReportConfig, pool: &Dataset) -> Result<Subsets> {
    let first = stratified_partition(pool, 1.0 - cfg.evaluation_fraction, cfg.stage_seed(1))
        .context("Evaluation split failed")?;
    let second = stratified_partition(&first.selected, 1.0 - cfg.validation_fraction, cfg.stage_seed(2))
        .context("Validation split failed")?;

    Ok(Subsets {
        training:   second.selected,
        validation: second.remainder,
        evaluation: first.remainder,
    })
}

/// Steps 3-8: tables in, trained models and measurements out.
pub fn run_pipeline(
    cfg:            &ReportConfig,
    training_table: &RawTable,
    quiz_table:     Option<&RawTable>,
) -> Result<RunOutcome> {
    // ── Step 3: Feature selection ─────────────────────────────────────────────
    let selector = FeatureSelector::new(&cfg.label_column, &cfg.excluded_columns);
    let pool: Dataset = selector
        .select(training_table)
        .context("Feature selection failed")?;

    // ── Steps 4-5: Stratified splits ──────────────────────────────────────────
    let Subsets { training, validation, evaluation } = split_pool(cfg, &pool)?;

    let sizes = SplitSizes {
        pool:       pool.len(),
        training:   training.len(),
        validation: validation.len(),
        evaluation: evaluation.len(),
    };
    tracing::info!(
        "Split {} records: {} training, {} validation, {} evaluation",
        sizes.pool,
        sizes.training,
        sizes.validation,
        sizes.evaluation
    );

    // ── Step 6: Fold training ─────────────────────────────────────────────────
    let folds = train_folds(&training, &cfg.fold_config()).context("Fold training failed")?;

    // ── Step 7: Stacking ──────────────────────────────────────────────────────
    let stack = fit_stacker(&folds, &validation, &cfg.stacker_config()).context("Stacking failed")?;

    // ── Step 8: Evaluation and quiz predictions ───────────────────────────────
    let evaluation_result = evaluate(&folds, &stack.classifier, &evaluation).context("Evaluation failed")?;

    let quiz = match quiz_table {
        Some(table) => {
            let records = selector
                .project_quiz(table, &pool.feature_names, &cfg.quiz_id_column)
                .context("Quiz pool does not match the training features")?;
            predict_quiz(&folds, &stack.classifier, &records).context("Quiz prediction failed")?
        }
        None => Vec::new(),
    };

    Ok(RunOutcome {
        feature_names: pool.feature_names,
        sizes,
        folds,
        stack,
        evaluation: evaluation_result,
        quiz,
    })
}

// ─── ReportUseCase ────────────────────────────────────────────────────────────
pub struct ReportUseCase {
    config: ReportConfig,
}

impl ReportUseCase {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// Run the whole analysis and write the report artifacts.
    /// Returns the outcome plus the path of the written report.
    pub fn execute(&self) -> Result<(RunOutcome, PathBuf)> {
        let cfg = &self.config;

        // ── Step 1: Locate input files ────────────────────────────────────────
        let fetcher       = DatasetFetcher::new(&cfg.data_dir);
        let training_path = match &cfg.training_csv {
            Some(path) => PathBuf::from(path),
            None => fetcher.ensure(&cfg.training_url, cfg.offline)?,
        };
        let quiz_path = match &cfg.quiz_csv {
            Some(path) => Some(PathBuf::from(path)),
            None => match fetcher.ensure(&cfg.quiz_url, cfg.offline) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Quiz pool unavailable, skipping quiz predictions: {e:#}");
                    None
                }
            },
        };

        // ── Step 2: Load raw tables ───────────────────────────────────────────
        let training_table = CsvLoader::new(&training_path, &cfg.missing_markers).load()?;
        let quiz_table = match &quiz_path {
            Some(path) => Some(CsvLoader::new(path, &cfg.missing_markers).load()?),
            None => None,
        };

        // ── Steps 3-8 ─────────────────────────────────────────────────────────
        let outcome = run_pipeline(cfg, &training_table, quiz_table.as_ref())?;

        // ── Step 9: Artifacts ─────────────────────────────────────────────────
        let store = ArtifactStore::new(&cfg.output_dir)?;
        store.save_config(cfg)?;

        let metrics = MetricsLogger::new(&cfg.output_dir)?;
        metrics.log(&CandidateRow::from_models(&outcome.folds))?;
        tracing::info!("Fold metrics written to '{}'", metrics.csv_path().display());

        let markdown    = render_markdown(cfg, &outcome).context("Cannot render report")?;
        let report_path = store.write_report(&markdown)?;
        store.save_summary(&outcome)?;

        tracing::info!("Report written to '{}' (artifacts in '{}')", report_path.display(), store.dir().display());
        Ok((outcome, report_path))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{quiz_csv, sensor_csv};
    use crate::domain::label::Label;
    use std::fs;

    fn fast_config(dir: &std::path::Path) -> ReportConfig {
        ReportConfig {
            data_dir:        dir.join("data").display().to_string(),
            output_dir:      dir.join("out").display().to_string(),
            offline:         true,
            folds:           3,
            candidate_sizes: vec![5, 9, 15],
            stacker_trees:   15,
            ..ReportConfig::default()
        }
    }

    fn table(text: &str) -> RawTable {
        RawTable::from_reader(text.as_bytes(), &default_missing_markers()).unwrap()
    }

    #[test]
    fn test_pipeline_on_synthetic_sensor_data() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fast_config(dir.path());

        let training = table(&sensor_csv(60, 8, 1));
        let quiz     = table(&quiz_csv(20, 8, 2));
        let outcome  = run_pipeline(&cfg, &training, Some(&quiz)).unwrap();

        assert_eq!(outcome.feature_names.len(), 8);
        assert_eq!(outcome.sizes.pool, 300);
        // ceil(60 * 0.8) = 48 per class, ceil(48 * 0.75) = 36 per class
        assert_eq!(outcome.sizes.evaluation, 60);
        assert_eq!(outcome.sizes.training, 180);
        assert_eq!(outcome.sizes.validation, 60);

        assert_eq!(outcome.folds.len(), 3);
        assert_eq!(outcome.stack.base_accuracies.len(), 3);
        assert!(outcome.evaluation.stacked_accuracy > 0.9);
        assert_eq!(outcome.quiz.len(), 20);
        assert_eq!(outcome.quiz[0].problem_id, "1");
    }

    #[test]
    fn test_subsets_are_disjoint_and_cover_the_pool() {
        use std::collections::HashSet;

        let dir  = tempfile::tempdir().unwrap();
        let cfg  = fast_config(dir.path());
        let pool = FeatureSelector::new(&cfg.label_column, &cfg.excluded_columns)
            .select(&table(&sensor_csv(37, 4, 9)))
            .unwrap();

        let subsets = split_pool(&cfg, &pool).unwrap();
        let rows = |ds: &Dataset| ds.records.iter().map(|r| r.row).collect::<HashSet<usize>>();

        let training   = rows(&subsets.training);
        let validation = rows(&subsets.validation);
        let evaluation = rows(&subsets.evaluation);

        assert!(training.is_disjoint(&validation));
        assert!(training.is_disjoint(&evaluation));
        assert!(validation.is_disjoint(&evaluation));

        let union: HashSet<usize> = training
            .iter()
            .chain(&validation)
            .chain(&evaluation)
            .copied()
            .collect();
        assert_eq!(union, rows(&pool));
        assert_eq!(
            subsets.training.len() + subsets.validation.len() + subsets.evaluation.len(),
            pool.len()
        );
    }

    #[test]
    fn test_pipeline_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = fast_config(dir.path());

        let training = table(&sensor_csv(30, 6, 3));
        let a = run_pipeline(&cfg, &training, None).unwrap();
        let b = run_pipeline(&cfg, &training, None).unwrap();

        let sizes_a: Vec<usize> = a.folds.iter().map(|f| f.ensemble_size).collect();
        let sizes_b: Vec<usize> = b.folds.iter().map(|f| f.ensemble_size).collect();
        assert_eq!(sizes_a, sizes_b);
        assert_eq!(a.evaluation.pairs, b.evaluation.pairs);
        assert!(a.quiz.is_empty());
    }

    #[test]
    fn test_missing_label_column_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ReportConfig { label_column: "grade".into(), ..fast_config(dir.path()) };

        let err = run_pipeline(&cfg, &table(&sensor_csv(10, 4, 1)), None).unwrap_err();
        assert!(format!("{err:#}").contains("grade"));
    }

    #[test]
    fn test_execute_writes_report_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let training_path = dir.path().join("training.csv");
        let quiz_path     = dir.path().join("quiz.csv");
        fs::write(&training_path, sensor_csv(40, 6, 5)).unwrap();
        fs::write(&quiz_path, quiz_csv(5, 6, 6)).unwrap();

        let cfg = ReportConfig {
            training_csv: Some(training_path.display().to_string()),
            quiz_csv:     Some(quiz_path.display().to_string()),
            ..fast_config(dir.path())
        };

        let (outcome, report_path) = ReportUseCase::new(cfg.clone()).execute().unwrap();
        let report = fs::read_to_string(&report_path).unwrap();

        assert!(report.contains("Fold models"));
        assert!(report.contains("Confusion matrix"));
        assert!(report.contains("Quiz predictions"));
        assert_eq!(outcome.quiz.len(), 5);

        let out = PathBuf::from(&cfg.output_dir);
        assert!(out.join("fold_metrics.csv").exists());
        assert!(out.join("summary.json").exists());

        let saved: ReportConfig =
            serde_json::from_str(&fs::read_to_string(out.join("run_config.json")).unwrap()).unwrap();
        assert_eq!(saved, cfg);
    }

    #[test]
    fn test_offline_without_quiz_still_reports() {
        let dir = tempfile::tempdir().unwrap();
        let training_path = dir.path().join("training.csv");
        fs::write(&training_path, sensor_csv(30, 4, 8)).unwrap();

        let cfg = ReportConfig {
            training_csv: Some(training_path.display().to_string()),
            ..fast_config(dir.path())
        };
        let (outcome, _) = ReportUseCase::new(cfg).execute().unwrap();
        assert!(outcome.quiz.is_empty());
        assert!(outcome.evaluation.confusion.total() > 0);
        assert!(outcome.evaluation.pairs.iter().all(|(a, _)| Label::ALL.contains(a)));
    }

    #[test]
    fn test_config_json_defaults_fill_missing_fields() {
        let cfg: ReportConfig = serde_json::from_str(r#"{ "seed": 7, "folds": 4 }"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.folds, 4);
        assert_eq!(cfg.candidate_sizes, vec![50, 75, 100, 150, 200]);
        assert_eq!(cfg.stacker_trees, 100);
    }
}
