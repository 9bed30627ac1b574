// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no classifier math, no printing,
// no direct file parsing. The one workflow here runs the whole
// analysis and writes the report.
//
// Reference: Clean Architecture pattern

/// Fetch → select → split → train → stack → evaluate → report
pub mod report_use_case;
