// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
//
// Two commands are supported:
//   1. `fetch`  — download the source CSV files into the data dir
//   2. `report` — run the full analysis and write the report
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use commands::{Commands, FetchArgs, ReportArgs};

use crate::application::report_use_case::{ReportConfig, ReportUseCase};
use crate::infra::{artifacts::load_config_file, fetcher::DatasetFetcher, report::console_summary};

#[derive(Parser, Debug)]
#[command(
    name = "wle-stack",
    version,
    about = "Predict how a barbell lift was performed from body-worn sensor data \
             with a stacked random forest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Fetch(args)  => Self::run_fetch(args),
            Commands::Report(args) => Self::run_report(args),
        }
    }

    fn run_fetch(args: FetchArgs) -> Result<()> {
        let cfg     = ReportConfig::default();
        let fetcher = DatasetFetcher::new(&args.data_dir);

        for url in [&cfg.training_url, &cfg.quiz_url] {
            let path = fetcher.ensure(url, false)?;
            println!("{}", path.display());
        }
        Ok(())
    }

    fn run_report(args: ReportArgs) -> Result<()> {
        let base = match &args.config {
            Some(path) => {
                tracing::info!("Loading run config from '{}'", path);
                load_config_file(Path::new(path))?
            }
            None => ReportConfig::default(),
        };
        let cfg = args.apply(base);

        let (outcome, report_path) = ReportUseCase::new(cfg).execute()?;

        println!("{}", console_summary(&outcome));
        for p in &outcome.quiz {
            println!("  problem {:>3}: {}", p.problem_id, p.label);
        }
        println!("\nReport written to {}", report_path.display());
        Ok(())
    }
}
