//! Batched, bounded-concurrency sweep over a candidate list.
//!
//! Candidates are cut into fixed-size batches by position. Every domain in
//! a batch gets its own tokio task; the coordinator joins the whole batch
//! before issuing the next one, so at most `batch_size` lookups are in
//! flight and batches never overlap.

use crate::error::DomainSweepError;
use crate::pattern::expand_pattern;
use crate::protocols::RegistrationLookup;
use crate::retry::{check_with_retry, RetryOutcome, RetryPolicy};
use crate::sink::OutputSink;
use crate::types::{Progress, SweepConfig, SweepSummary, Verdict};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;

/// What one worker reports back to the coordinator.
#[derive(Debug, Clone, Copy)]
struct WorkerReport {
    outcome: RetryOutcome,
    write_failed: bool,
}

/// Drives candidates through retry -> classify -> sink in joined batches.
///
/// # Example
///
/// ```rust,no_run
/// use domain_sweep_lib::{OutputSink, Sweeper, SweepConfig, WhoisClient};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sweeper = Sweeper::new(
///         Arc::new(WhoisClient::new()),
///         Arc::new(OutputSink::stdout()),
///         SweepConfig::default(),
///     );
///     let summary = sweeper
///         .run_pattern("(get,try)acme.(com,io)", |p| eprintln!("Progress: {} / {}", p.dispatched, p.total))
///         .await?;
///     println!("{} free", summary.free);
///     Ok(())
/// }
/// ```
pub struct Sweeper {
    lookup: Arc<dyn RegistrationLookup>,
    sink: Arc<OutputSink>,
    config: SweepConfig,
}

impl Sweeper {
    /// Create a sweeper over the given lookup source and sink.
    pub fn new(
        lookup: Arc<dyn RegistrationLookup>,
        sink: Arc<OutputSink>,
        config: SweepConfig,
    ) -> Self {
        Self {
            lookup,
            sink,
            config,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Number of batches a list of `total` candidates will be cut into.
    pub fn batch_count(&self, total: usize) -> usize {
        total.div_ceil(self.config.batch_size.max(1))
    }

    /// Expand `pattern` and sweep the resulting candidates.
    ///
    /// A malformed pattern fails before any lookup starts.
    pub async fn run_pattern<F>(
        &self,
        pattern: &str,
        on_progress: F,
    ) -> Result<SweepSummary, DomainSweepError>
    where
        F: FnMut(Progress),
    {
        let candidates = expand_pattern(pattern, self.config.literal_mode)?;
        Ok(self.run(&candidates, on_progress).await)
    }

    /// Sweep every candidate to completion.
    ///
    /// `on_progress` runs once per drained batch, the final partial batch
    /// included. Per-domain failures are absorbed into the summary.
    pub async fn run<F>(&self, candidates: &[String], mut on_progress: F) -> SweepSummary
    where
        F: FnMut(Progress),
    {
        let start = Instant::now();
        let total = candidates.len();
        let batch_size = self.config.batch_size.max(1);
        let policy = RetryPolicy::from(&self.config);

        let mut summary = SweepSummary {
            total,
            ..Default::default()
        };
        let mut dispatched = 0usize;

        tracing::info!(
            total,
            batch_size,
            batches = self.batch_count(total),
            output = %self.sink.target(),
            "sweep started"
        );

        for (index, batch) in candidates.chunks(batch_size).enumerate() {
            let handles: Vec<_> = batch
                .iter()
                .map(|domain| {
                    let lookup = Arc::clone(&self.lookup);
                    let sink = Arc::clone(&self.sink);
                    let domain = domain.clone();
                    tokio::spawn(async move {
                        process_domain(lookup.as_ref(), &sink, &domain, &policy).await
                    })
                })
                .collect();
            dispatched += batch.len();

            // Join barrier: the next batch waits for every worker of this one
            for joined in join_all(handles).await {
                match joined {
                    Ok(report) => summary.absorb(report),
                    Err(e) => {
                        tracing::warn!(error = %worker_failure(e), "domain abandoned");
                        summary.abandoned += 1;
                    }
                }
            }

            summary.batches += 1;
            tracing::debug!(batch = index + 1, dispatched, total, "batch drained");
            on_progress(Progress {
                dispatched,
                total,
                batch: index + 1,
            });
        }

        summary.elapsed = start.elapsed();
        tracing::info!(
            free = summary.free,
            taken = summary.taken,
            unknown = summary.unknown,
            abandoned = summary.abandoned,
            elapsed = ?summary.elapsed,
            "sweep finished"
        );
        summary
    }
}

/// One worker: retry loop, then a sink write for free domains.
async fn process_domain(
    lookup: &dyn RegistrationLookup,
    sink: &OutputSink,
    domain: &str,
    policy: &RetryPolicy,
) -> WorkerReport {
    let outcome = check_with_retry(lookup, domain, policy).await;

    let write_failed = match outcome.verdict() {
        Some(Verdict::Free) => match sink.record(domain).await {
            Ok(()) => false,
            Err(e) => {
                tracing::warn!(domain, error = %e, "failed to record free domain");
                true
            }
        },
        _ => false,
    };

    WorkerReport {
        outcome,
        write_failed,
    }
}

fn worker_failure(err: tokio::task::JoinError) -> DomainSweepError {
    DomainSweepError::internal(format!("worker task failed: {}", err))
}

impl SweepSummary {
    fn absorb(&mut self, report: WorkerReport) {
        match report.outcome.verdict() {
            Some(Verdict::Free) => self.free += 1,
            Some(Verdict::Taken) => self.taken += 1,
            Some(Verdict::Unknown) => self.unknown += 1,
            None => self.abandoned += 1,
        }
        if report.write_failed {
            self.write_failures += 1;
        }
    }
}
