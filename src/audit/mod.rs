// src/audit/mod.rs
// =============================================================================
// The audit orchestrator and its report.
//
// Submodules:
// - auditor: runs the audit steps in order
// - report: report types and the builder that assembles them
// - summary: plain-language recommendations
// =============================================================================

mod auditor;
pub mod report;
mod summary;

use thiserror::Error;

pub use auditor::{normalize_target, Auditor};
pub use report::{AuditReport, SampleSource};

/// The only failures that surface from an audit. Everything else (timeouts,
/// missing documents, broken markup) is absorbed into the report.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("could not create HTTP client: {0}")]
    Client(String),
    #[error("audit task failed: {0}")]
    TaskFailed(String),
}
