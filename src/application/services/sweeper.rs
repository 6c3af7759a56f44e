//! Periodic lifecycle sweep over every stored record.
//!
//! The sweeper alternates between two states:
//!
//! - **Idle**: waiting for the configured interval or for cancellation
//! - **Sweeping**: walking a snapshot of all records
//!
//! Options are read from a `watch` channel at the start of every wait and
//! at the start of every sweep, so interval, dry-run mode and garbage policy
//! can change without a restart. Cancellation is honored while idle and
//! before each record during a sweep.
//!
//! Per record, in order:
//!
//! 1. repair the URL with [`try_fix`] and persist the repair
//! 2. classify the (repaired) record with [`classify`]
//! 3. delete it if it is garbage
//!
//! In dry-run mode (`log_only`) steps 1 and 3 are only logged.

use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::domain::entities::ShortUrlRecord;
use crate::domain::garbage::{GarbagePolicy, Verdict, classify};
use crate::domain::repositories::{CodeStore, StoreError};
use crate::utils::url_normalizer::try_fix;

/// Log target of the per-record sweep decisions.
pub const LOG_TARGET: &str = module_path!();

/// Default time between sweeps.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Runtime options of the sweeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    pub interval: Duration,
    /// When true, fixes and deletions are logged but not applied.
    pub log_only: bool,
    pub policy: GarbagePolicy,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CLEANUP_INTERVAL,
            log_only: false,
            policy: GarbagePolicy::default(),
        }
    }
}

/// Observable state of a running sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    Idle,
    Sweeping,
    Stopped,
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    /// Records whose URL needed a repair.
    pub fixed: usize,
    /// Repairs written to storage.
    pub updated: usize,
    /// Records classified as garbage.
    pub garbage: usize,
    /// Rows actually removed.
    pub deleted: usize,
    /// Records skipped because of a storage error.
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("sweep cancelled after {} records", report.scanned)]
    Cancelled { report: SweepReport },

    #[error("failed to scan records: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Default)]
struct RecordOutcome {
    fixed: bool,
    updated: bool,
    garbage: bool,
    deleted: bool,
}

/// Background sweeper over a [`CodeStore`].
pub struct Sweeper {
    store: Arc<dyn CodeStore>,
    options: watch::Receiver<CleanupOptions>,
    cancel: CancellationToken,
    state: watch::Sender<SweeperState>,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn CodeStore>,
        options: watch::Receiver<CleanupOptions>,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(SweeperState::Idle);
        Self {
            store,
            options,
            cancel,
            state,
        }
    }

    /// Subscribes to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SweeperState> {
        self.state.subscribe()
    }

    /// Spawns [`Self::run`] on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    fn current_options(&self) -> CleanupOptions {
        self.options.borrow().clone()
    }

    /// Runs the sweep loop until cancelled.
    ///
    /// A failing sweep only ends the current iteration; the next tick starts
    /// a fresh one.
    pub async fn run(self) {
        info!("Started lifecycle sweeper");

        loop {
            self.state.send_replace(SweeperState::Idle);
            let interval = self.current_options().interval;

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let options = self.current_options();
            self.state.send_replace(SweeperState::Sweeping);
            trace!(log_only = options.log_only, "Lifecycle sweep running");

            match self.sweep(&options).await {
                Ok(report) => info!(
                    scanned = report.scanned,
                    fixed = report.fixed,
                    garbage = report.garbage,
                    deleted = report.deleted,
                    failed = report.failed,
                    log_only = options.log_only,
                    "Lifecycle sweep finished"
                ),
                Err(SweepError::Cancelled { report }) => {
                    info!(scanned = report.scanned, "Lifecycle sweep cancelled");
                    break;
                }
                Err(e) => error!(error = %e, "Lifecycle sweep failed"),
            }
        }

        self.state.send_replace(SweeperState::Stopped);
        info!("Stopped lifecycle sweeper");
    }

    /// Performs one full sweep with the given options.
    ///
    /// A storage error on a single record is logged and counted in
    /// [`SweepReport::failed`]; the sweep moves on to the next record.
    ///
    /// # Errors
    ///
    /// - [`SweepError::Storage`] if the records cannot be listed
    /// - [`SweepError::Cancelled`] if cancellation is observed before a record
    pub async fn sweep(&self, options: &CleanupOptions) -> Result<SweepReport, SweepError> {
        let started = Instant::now();
        let records = self.store.scan_all().await?;
        let mut report = SweepReport::default();

        for record in records {
            if self.cancel.is_cancelled() {
                return Err(SweepError::Cancelled { report });
            }

            let code = record.code.clone();
            report.scanned += 1;

            match self.process_record(record, options).await {
                Ok(outcome) => {
                    report.fixed += usize::from(outcome.fixed);
                    report.updated += usize::from(outcome.updated);
                    report.garbage += usize::from(outcome.garbage);
                    report.deleted += usize::from(outcome.deleted);
                }
                Err(e) => {
                    warn!(code = %code, error = %e, "Failed to process record, skipping");
                    report.failed += 1;
                }
            }
        }

        counter!("shortener_sweep_fixed_total").increment(report.updated as u64);
        counter!("shortener_sweep_deleted_total").increment(report.deleted as u64);
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Sweep pass complete");

        Ok(report)
    }

    async fn process_record(
        &self,
        mut record: ShortUrlRecord,
        options: &CleanupOptions,
    ) -> Result<RecordOutcome, StoreError> {
        let mut outcome = RecordOutcome::default();

        let (fixed_url, changed) = try_fix(&record.long_url);
        if changed {
            trace!(code = %record.code, from = %record.long_url, to = %fixed_url, "Fixed url");
            outcome.fixed = true;

            if options.log_only {
                trace!(code = %record.code, "Fix not saved (log only)");
            } else {
                outcome.updated = self.store.update(&record.code, &fixed_url).await?;
                trace!(code = %record.code, saved = outcome.updated, "Fix saved");
            }

            record.long_url = fixed_url;
        }

        if let Verdict::Garbage(reason) = classify(&record, &options.policy, Utc::now()) {
            outcome.garbage = true;
            trace!(code = %record.code, reason = %reason, url = %record.long_url, "Deleting record");

            if options.log_only {
                trace!(code = %record.code, "Record not deleted (log only)");
            } else {
                outcome.deleted = self.store.delete(&record.code).await?;
                trace!(code = %record.code, deleted = outcome.deleted, "Deleted record");
            }
        }

        Ok(outcome)
    }
}
