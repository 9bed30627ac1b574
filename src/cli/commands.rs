// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Flags given on the command line override the matching field
// of the run config; everything else keeps its config (or
// default) value.

use clap::{Args, Subcommand};

use crate::application::report_use_case::ReportConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the training and quiz CSV files
    Fetch(FetchArgs),

    /// Train the stacked model and write the report
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Directory the CSV files are cached in
    #[arg(long, default_value = "data")]
    pub data_dir: String,
}

#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    /// JSON run config (e.g. a previous run_config.json)
    #[arg(long)]
    pub config: Option<String>,

    /// Directory the CSV files are cached in
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Directory for report.md, fold_metrics.csv and run_config.json
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Local labelled CSV, used instead of downloading
    #[arg(long)]
    pub training_csv: Option<String>,

    /// Local quiz CSV, used instead of downloading
    #[arg(long)]
    pub quiz_csv: Option<String>,

    /// Base seed; every random stage derives its own seed from it
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of stratified folds (k)
    #[arg(long)]
    pub folds: Option<usize>,

    /// Candidate ensemble sizes, comma separated
    #[arg(long, value_delimiter = ',')]
    pub candidate_sizes: Option<Vec<usize>>,

    /// Trees in the stacking forest
    #[arg(long)]
    pub stacker_trees: Option<usize>,

    /// Never download; fail if a file is not cached
    #[arg(long)]
    pub offline: bool,
}

impl ReportArgs {
    /// Overlay the given flags on `base`.
    pub fn apply(self, base: ReportConfig) -> ReportConfig {
        ReportConfig {
            data_dir:        self.data_dir.unwrap_or(base.data_dir),
            output_dir:      self.output_dir.unwrap_or(base.output_dir),
            training_csv:    self.training_csv.or(base.training_csv),
            quiz_csv:        self.quiz_csv.or(base.quiz_csv),
            seed:            self.seed.unwrap_or(base.seed),
            folds:           self.folds.unwrap_or(base.folds),
            candidate_sizes: self.candidate_sizes.unwrap_or(base.candidate_sizes),
            stacker_trees:   self.stacker_trees.unwrap_or(base.stacker_trees),
            offline:         self.offline || base.offline,
            ..base
        }
    }
}

impl From<ReportArgs> for ReportConfig {
    fn from(args: ReportArgs) -> Self {
        args.apply(ReportConfig::default())
    }
}
