//! Progress tracking

use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use bugscan_common::{ScanStats, Verdict};

pub struct ProgressTracker {
    stats: Mutex<ScanStats>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            stats: Mutex::new(ScanStats::default()),
        }
    }

    /// Start a fresh run: all counters cleared.
    pub async fn reset(&self, total: u64) {
        *self.stats.lock().await = ScanStats::new(total);
    }

    pub async fn record(&self, verdict: &Verdict) {
        self.stats.lock().await.update(verdict);
    }

    pub async fn finish(&self, elapsed: Duration) {
        self.stats.lock().await.elapsed = elapsed;
    }

    pub async fn snapshot(&self) -> ScanStats {
        self.stats.lock().await.clone()
    }

    pub async fn print_summary(&self) {
        let stats = self.snapshot().await;

        info!("Scan Summary:");
        info!("  Total tasks: {}", stats.total_tasks);
        info!("  Probed: {} ({:.1}%)", stats.probed, stats.progress());
        info!("  Reported: {}", stats.reported);
        info!(
            "  Failed: {} (connect {}, read timeout {}, request timeout {}, malformed {})",
            stats.failed(),
            stats.connection_errors,
            stats.read_timeouts,
            stats.request_timeouts,
            stats.malformed_responses
        );
        info!("  ISP redirects dropped: {}", stats.isp_redirects);
        info!("  Other redirects dropped: {}", stats.redirects_dropped);
        info!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
