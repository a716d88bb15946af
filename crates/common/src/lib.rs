//! Bugscan Common - Shared types and traits
//!
//! This crate provides the data model, failure taxonomy and capability
//! traits used across the bugscan workspace.
//!
//! Key pieces:
//! - Probe tasks, raw responses and classified results
//! - The probe failure taxonomy
//! - Pluggable `Transport`, `Classifier` and `ResultSink` seams
//! - URL construction for a host/port pair

pub mod error;
pub mod traits;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use error::{BugscanError, BugscanResult, FailureKind, ProbeError};
pub use traits::{Classifier, ResultSink, Transport};
pub use types::{
    DropReason, HttpResponse, ProbeResult, ProbeTask, ReportRecord, ScanConfig, ScanMode,
    ScanStats, Verdict, DEFAULT_ISP_REDIRECTS, DEFAULT_THREADS, DEFAULT_TIMEOUT,
};
pub use url::{convert_host_port, get_url};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
