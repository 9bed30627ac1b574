// ============================================================
// Layer 6 — Infrastructure
// ============================================================
// Everything that touches the network or the file system on
// behalf of the pipeline.

/// Download + cache the source CSV files
pub mod fetcher;

/// Candidate-level CSV log
pub mod metrics;

/// Character scatter panel for the report
pub mod scatter;

/// Markdown report and console summary
pub mod report;

/// Output directory: config, report, summary
pub mod artifacts;
