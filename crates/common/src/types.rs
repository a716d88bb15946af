//! Core data types for the bugscan probing engine
//!
//! Values flow in one direction:
//! `ProbeTask` -> (`HttpResponse` | `ProbeError`) -> `ProbeResult` -> `Verdict`.
//! Only `Verdict::Report` reaches a result sink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{BugscanError, BugscanResult, FailureKind};

/// Default number of concurrent probes.
pub const DEFAULT_THREADS: usize = 25;

/// Default per-request budget (connect + read).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Known carrier-injected redirect targets.
pub const DEFAULT_ISP_REDIRECTS: &[&str] = &[
    "http://safaricom.zerod.live/?c=77",
    "http://91.220.208.30",
];

/// Scan strategy. Only direct probing exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScanMode {
    #[default]
    Direct,
}

impl ScanMode {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Direct => "direct",
        }
    }
}

impl FromStr for ScanMode {
    type Err = BugscanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(ScanMode::Direct),
            other => Err(BugscanError::Config(format!("unsupported scan mode '{}'", other))),
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One probe: a single HTTP request to `host:port` with `method`.
///
/// Equality is by value; duplicate tasks are legal and probed independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeTask {
    pub method: String,
    pub host: String,
    pub port: u16,
}

impl ProbeTask {
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            method: method.into(),
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ProbeTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.method, self.host, self.port)
    }
}

/// The parts of a raw HTTP response the classifier looks at.
/// Missing headers are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub server: String,
    pub location: String,
}

impl HttpResponse {
    #[inline]
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

/// Outcome of one probe attempt.
///
/// `status_code` is `None` exactly when the attempt failed at the transport
/// level, in which case `failure` names the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub method: String,
    pub host: String,
    pub port: u16,
    pub status_code: Option<u16>,
    pub server: String,
    pub location: String,
    pub failure: Option<FailureKind>,
}

impl ProbeResult {
    #[must_use]
    pub fn completed(task: ProbeTask, response: HttpResponse) -> Self {
        Self {
            method: task.method,
            host: task.host,
            port: task.port,
            status_code: Some(response.status),
            server: response.server,
            location: response.location,
            failure: None,
        }
    }

    #[must_use]
    pub fn failed(task: ProbeTask, kind: FailureKind) -> Self {
        Self {
            method: task.method,
            host: task.host,
            port: task.port,
            status_code: None,
            server: String::new(),
            location: String::new(),
            failure: Some(kind),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.status_code.is_none()
    }
}

/// A reportable result with every field in its final display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub method: String,
    pub status_code: u16,
    pub server: String,
    pub port: u16,
    /// Probed host, possibly annotated as `"host -> location"`.
    pub host: String,
}

impl ReportRecord {
    /// Column layout without terminal colors.
    #[must_use]
    pub fn to_plain_line(&self) -> String {
        format!(
            "{:<6}  {:<4}  {:<22}  {:<4}  {}",
            self.method, self.status_code, self.server, self.port, self.host
        )
    }
}

/// Why a result was not reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Failed(FailureKind),
    /// 302 to a known carrier redirect page.
    IspRedirect,
    /// Any other 302.
    Redirect,
}

/// Classifier decision for one `ProbeResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Report(ReportRecord),
    Drop(DropReason),
}

impl Verdict {
    #[inline]
    #[must_use]
    pub const fn is_report(&self) -> bool {
        matches!(self, Verdict::Report(_))
    }
}

/// Process-wide scan settings. Built once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub mode: ScanMode,
    pub threads: usize,
    pub methods: Vec<String>,
    pub ports: Vec<u16>,
    pub proxy: Option<String>,
    pub output: Option<PathBuf>,
    pub timeout: Duration,
    pub uri: Option<String>,
    pub isp_redirects: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Direct,
            threads: DEFAULT_THREADS,
            methods: vec!["HEAD".to_string()],
            ports: vec![80],
            proxy: None,
            output: None,
            timeout: DEFAULT_TIMEOUT,
            uri: None,
            isp_redirects: DEFAULT_ISP_REDIRECTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScanConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    #[must_use]
    pub fn with_methods(mut self, methods: Vec<String>) -> Self {
        self.methods = methods;
        self
    }

    #[must_use]
    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy.filter(|p| !p.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: Option<String>) -> Self {
        self.uri = uri
            .map(|u| u.trim_start_matches('/').to_string())
            .filter(|u| !u.is_empty());
        self
    }

    #[must_use]
    pub fn with_isp_redirects(mut self, isp_redirects: Vec<String>) -> Self {
        self.isp_redirects = isp_redirects;
        self
    }

    /// Reject settings the executor cannot run with.
    pub fn validate(&self) -> BugscanResult<()> {
        if self.threads == 0 {
            return Err(BugscanError::Config("thread count must be at least 1".into()));
        }
        if self.methods.is_empty() {
            return Err(BugscanError::Config("no HTTP methods specified".into()));
        }
        if let Some(bad) = self.methods.iter().find(|m| !is_http_token(m)) {
            return Err(BugscanError::Config(format!("invalid HTTP method '{}'", bad)));
        }
        if self.ports.is_empty() {
            return Err(BugscanError::Config("no ports specified".into()));
        }
        if self.timeout.is_zero() {
            return Err(BugscanError::Config("timeout must be greater than zero".into()));
        }
        Ok(())
    }
}

/// RFC 7230 `token`: what an HTTP method may consist of.
fn is_http_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^'
                        | b'_' | b'`' | b'|' | b'~'
                )
        })
}

/// Counters collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total_tasks: u64,
    pub probed: u64,
    pub reported: u64,
    pub connection_errors: u64,
    pub read_timeouts: u64,
    pub request_timeouts: u64,
    pub malformed_responses: u64,
    pub isp_redirects: u64,
    pub redirects_dropped: u64,
    pub elapsed: Duration,
}

impl ScanStats {
    #[inline]
    #[must_use]
    pub fn new(total_tasks: u64) -> Self {
        Self {
            total_tasks,
            ..Default::default()
        }
    }

    pub fn update(&mut self, verdict: &Verdict) {
        self.probed = self.probed.saturating_add(1);
        let counter = match verdict {
            Verdict::Report(_) => &mut self.reported,
            Verdict::Drop(DropReason::Failed(kind)) => match kind {
                FailureKind::ConnectionError => &mut self.connection_errors,
                FailureKind::ReadTimeout => &mut self.read_timeouts,
                FailureKind::RequestTimeout => &mut self.request_timeouts,
                FailureKind::MalformedResponse => &mut self.malformed_responses,
            },
            Verdict::Drop(DropReason::IspRedirect) => &mut self.isp_redirects,
            Verdict::Drop(DropReason::Redirect) => &mut self.redirects_dropped,
        };
        *counter = counter.saturating_add(1);
    }

    #[inline]
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.connection_errors + self.read_timeouts + self.request_timeouts + self.malformed_responses
    }

    /// Progress percentage in [0.0, 100.0].
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total_tasks == 0 {
            0.0
        } else {
            (self.probed as f32 / self.total_tasks as f32) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_result_from_response() {
        let task = ProbeTask::new("HEAD", "a.com", 80);
        let r = ProbeResult::completed(task, HttpResponse::new(200).with_server("nginx"));
        assert_eq!(r.status_code, Some(200));
        assert_eq!(r.server, "nginx");
        assert!(r.location.is_empty());
        assert!(!r.is_failed());
    }

    #[test]
    fn probe_result_from_failure() {
        let task = ProbeTask::new("GET", "b.com", 8080);
        let r = ProbeResult::failed(task, FailureKind::ReadTimeout);
        assert!(r.is_failed());
        assert_eq!(r.failure, Some(FailureKind::ReadTimeout));
        assert_eq!(r.port, 8080);
    }

    #[test]
    fn config_defaults() {
        let c = ScanConfig::default();
        assert_eq!(c.threads, 25);
        assert_eq!(c.methods, vec!["HEAD".to_string()]);
        assert_eq!(c.ports, vec![80]);
        assert_eq!(c.timeout, Duration::from_secs(3));
        assert_eq!(c.mode, ScanMode::Direct);
        assert!(c.isp_redirects.contains(&"http://91.220.208.30".to_string()));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn config_validation() {
        assert!(ScanConfig::new().with_threads(0).validate().is_err());
        assert!(ScanConfig::new().with_ports(vec![]).validate().is_err());
        assert!(ScanConfig::new().with_methods(vec![]).validate().is_err());
        assert!(ScanConfig::new()
            .with_methods(vec!["GE T".into()])
            .validate()
            .is_err());
        assert!(ScanConfig::new()
            .with_methods(vec!["options".into(), "PROPFIND".into()])
            .validate()
            .is_ok());
    }

    #[test]
    fn config_normalizes_optional_strings() {
        let c = ScanConfig::new()
            .with_proxy(Some("  ".into()))
            .with_uri(Some("/health".into()));
        assert_eq!(c.proxy, None);
        assert_eq!(c.uri.as_deref(), Some("health"));
    }

    #[test]
    fn scan_mode_parsing() {
        assert_eq!("Direct".parse::<ScanMode>().unwrap(), ScanMode::Direct);
        assert!("sni".parse::<ScanMode>().is_err());
    }

    #[test]
    fn plain_line_layout() {
        let rec = ReportRecord {
            method: "HEAD".into(),
            status_code: 200,
            server: "nginx".into(),
            port: 80,
            host: "a.com".into(),
        };
        assert_eq!(
            rec.to_plain_line(),
            "HEAD    200   nginx                   80    a.com"
        );
    }

    #[test]
    fn scan_stats_updates() {
        let mut stats = ScanStats::new(4);
        stats.update(&Verdict::Drop(DropReason::Failed(FailureKind::ConnectionError)));
        stats.update(&Verdict::Drop(DropReason::IspRedirect));
        stats.update(&Verdict::Drop(DropReason::Redirect));
        assert_eq!(stats.probed, 3);
        assert_eq!(stats.failed(), 1);
        assert_eq!(stats.isp_redirects, 1);
        assert_eq!(stats.redirects_dropped, 1);
        assert_eq!(stats.reported, 0);
        assert!((stats.progress() - 75.0).abs() < f32::EPSILON);
    }
}
