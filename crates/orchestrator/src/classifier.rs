//! Response classification for direct scans

use std::collections::HashSet;

use bugscan_common::{
    Classifier, DropReason, FailureKind, ProbeResult, ReportRecord, Verdict, DEFAULT_ISP_REDIRECTS,
};

/// Reports every response that is not a 302; drops failures and redirects.
///
/// A 302 whose `Location` exactly matches a known carrier redirect page is
/// counted separately from other 302s.
#[derive(Debug, Clone)]
pub struct DirectClassifier {
    isp_redirects: HashSet<String>,
}

impl DirectClassifier {
    pub fn new<I, S>(isp_redirects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            isp_redirects: isp_redirects.into_iter().map(Into::into).collect(),
        }
    }

    /// Add one more carrier redirect target.
    pub fn with_redirect(mut self, location: impl Into<String>) -> Self {
        self.isp_redirects.insert(location.into());
        self
    }

    pub fn is_isp_redirect(&self, location: &str) -> bool {
        self.isp_redirects.contains(location)
    }

    pub fn redirect_count(&self) -> usize {
        self.isp_redirects.len()
    }
}

impl Default for DirectClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_ISP_REDIRECTS.iter().copied())
    }
}

/// Host column for a report: `"host -> location"` when the location does
/// not start with `https://<host>`.
///
/// This is a plain string prefix test, so `https://a.comX/` counts as
/// belonging to `a.com`.
pub fn annotate_host(host: &str, location: &str) -> String {
    if location.is_empty() {
        return host.to_string();
    }
    let own = format!("https://{}", host);
    if location.starts_with(&own) {
        host.to_string()
    } else {
        format!("{} -> {}", host, location)
    }
}

impl Classifier for DirectClassifier {
    fn classify(&self, result: ProbeResult) -> Verdict {
        let status_code = match result.status_code {
            Some(code) => code,
            None => {
                let kind = result.failure.unwrap_or(FailureKind::ConnectionError);
                return Verdict::Drop(DropReason::Failed(kind));
            }
        };

        if status_code == 302 {
            if self.is_isp_redirect(&result.location) {
                return Verdict::Drop(DropReason::IspRedirect);
            }
            return Verdict::Drop(DropReason::Redirect);
        }

        Verdict::Report(ReportRecord {
            host: annotate_host(&result.host, &result.location),
            method: result.method,
            status_code,
            server: result.server,
            port: result.port,
        })
    }
}
