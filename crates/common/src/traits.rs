//! Core traits for bugscan components
//!
//! The probe executor is composed from three capabilities:
//! - `Transport` performs one request for a task
//! - `Classifier` decides whether a result is worth reporting
//! - `ResultSink` receives reportable records

use crate::error::ProbeError;
use crate::types::{HttpResponse, ProbeResult, ProbeTask, ReportRecord, Verdict};
use anyhow::Result;
use async_trait::async_trait;

/// Issues exactly one request for a task. Redirects must not be followed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and return the raw response metadata.
    async fn send(&self, task: &ProbeTask) -> Result<HttpResponse, ProbeError>;

    /// Transport name/identifier
    fn name(&self) -> &str;
}

/// Emit-or-drop policy for probe results.
pub trait Classifier: Send + Sync {
    fn classify(&self, result: ProbeResult) -> Verdict;
}

/// Destination for reportable records.
///
/// Implementations must write each record atomically with respect to
/// concurrent `emit` calls.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Write a single record
    async fn emit(&self, record: &ReportRecord) -> Result<()>;

    /// Flush buffered output. Called once after the run.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
