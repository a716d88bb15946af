// crates/orchestrator/src/orchestrator.rs
//! Orchestrator - bounded worker pool over the task stream

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, info, instrument, trace, warn, Instrument};

use bugscan_common::{
    Classifier, DropReason, FailureKind, ProbeResult, ProbeTask, ResultSink, ScanStats, Transport,
    Verdict, DEFAULT_TIMEOUT,
};
use crate::progress::ProgressTracker;
use crate::task_list::TaskList;

/// Slack on top of the transport's own budget before a probe is abandoned.
const DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// Orchestrator pulls tasks from one shared `TaskList`, probes them with at
/// most `concurrency` requests in flight, classifies each result and hands
/// reportable records to the sink.
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn ResultSink>,
    concurrency: usize,
    deadline: Duration,
    progress: Arc<ProgressTracker>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Create an orchestrator with a concurrency limit.
    pub fn new(
        concurrency: usize,
        transport: Arc<dyn Transport>,
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            transport,
            classifier,
            sink,
            concurrency: concurrency.max(1),
            deadline: DEFAULT_TIMEOUT + DEADLINE_GRACE,
            progress: Arc::new(ProgressTracker::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Derive the overall request deadline from the transport's budget.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.deadline = request_timeout + DEADLINE_GRACE;
        self
    }

    /// Share an externally owned cancellation token (e.g. wired to Ctrl-C).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Probe every task in `tasks` and return the run's counters.
    ///
    /// Counters start from zero on every call.
    ///
    /// Cancelling stops dispatch; probes already in flight finish or time
    /// out. A sink error stops dispatch the same way and is returned.
    #[instrument(skip(self, tasks), fields(total = tasks.total()))]
    pub async fn run(&self, tasks: TaskList) -> Result<ScanStats> {
        let total = tasks.total();
        self.progress.reset(total).await;
        let start = Instant::now();

        let worker_count = usize::try_from(total)
            .unwrap_or(usize::MAX)
            .min(self.concurrency);
        info!(
            "Starting {} probes with {} workers via {}",
            total,
            worker_count,
            self.transport.name()
        );

        // Shared cursor: workers pull the next task on demand, so the full
        // list never exists in memory.
        let queue = Arc::new(Mutex::new(tasks));
        let run_token = self.cancel.child_token();

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let queue = queue.clone();
            let transport = self.transport.clone();
            let classifier = self.classifier.clone();
            let sink = self.sink.clone();
            let progress = self.progress.clone();
            let token = run_token.clone();
            let deadline = self.deadline;

            let worker = tokio::spawn(async move {
                loop {
                    if token.is_cancelled() {
                        trace!(worker = id, "cancelled, not taking more tasks");
                        break;
                    }

                    let maybe_task = {
                        let mut q = queue.lock().await;
                        q.next()
                    };
                    let task = match maybe_task {
                        Some(t) => t,
                        None => break,
                    };

                    let span = debug_span!("probe", method = %task.method, host = %task.host, port = task.port);
                    let verdict = async {
                        let result = isolated_probe(transport.clone(), task, deadline).await;
                        let verdict = classifier.classify(result);
                        log_verdict(&verdict);
                        verdict
                    }
                    .instrument(span)
                    .await;

                    progress.record(&verdict).await;

                    if let Verdict::Report(record) = &verdict {
                        if let Err(e) = sink.emit(record).await {
                            token.cancel();
                            return Err(e.context(format!("Failed to emit result for {}", record.host)));
                        }
                    }
                }
                Ok(())
            });
            workers.push(worker);
        }

        // Join every worker, even after a failure, so buffered output is
        // flushed and no worker outlives the run.
        let mut first_error: Option<anyhow::Error> = None;
        for w in workers {
            match w.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    run_token.cancel();
                    first_error.get_or_insert(anyhow::Error::new(e).context("Worker task failed"));
                }
            }
        }

        if let Err(e) = self.sink.flush().await.context("Failed to flush results") {
            first_error.get_or_insert(e);
        }
        self.progress.finish(start.elapsed()).await;
        self.progress.print_summary().await;

        if self.cancel.is_cancelled() {
            warn!("Scan interrupted before all tasks were dispatched");
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(self.progress.snapshot().await),
        }
    }

    /// Current counters; usable while a run is in progress.
    pub async fn stats(&self) -> ScanStats {
        self.progress.snapshot().await
    }
}

/// Probe a single task, converting every failure into a failed result.
pub async fn probe_task(transport: &dyn Transport, task: ProbeTask, deadline: Duration) -> ProbeResult {
    match timeout(deadline, transport.send(&task)).await {
        Ok(Ok(response)) => ProbeResult::completed(task, response),
        Ok(Err(e)) => {
            debug!(kind = %e.kind, error = %e.message, "probe failed");
            ProbeResult::failed(task, e.kind)
        }
        Err(_) => {
            debug!(kind = %FailureKind::RequestTimeout, ?deadline, "probe exceeded deadline");
            ProbeResult::failed(task, FailureKind::RequestTimeout)
        }
    }
}

/// Run `probe_task` on its own task so a panicking transport only fails
/// this probe.
async fn isolated_probe(transport: Arc<dyn Transport>, task: ProbeTask, deadline: Duration) -> ProbeResult {
    let fallback = task.clone();
    let handle = tokio::spawn(
        async move { probe_task(transport.as_ref(), task, deadline).await }.in_current_span(),
    );
    match handle.await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "probe aborted unexpectedly");
            ProbeResult::failed(fallback, FailureKind::ConnectionError)
        }
    }
}

fn log_verdict(verdict: &Verdict) {
    match verdict {
        Verdict::Report(record) => debug!(status = record.status_code, "reported"),
        Verdict::Drop(DropReason::IspRedirect) => trace!("dropped ISP redirect"),
        Verdict::Drop(DropReason::Redirect) => trace!("dropped redirect"),
        Verdict::Drop(DropReason::Failed(_)) => {}
    }
}
