//! Short code allocation backed by a pre-generated candidate pool.
//!
//! [`CodeAllocator::assign`] pops a candidate from the in-memory
//! [`CandidatePool`] (or generates one on the spot when the pool is empty)
//! and tries to insert it. A primary key collision discards the candidate and
//! moves on to the next one; any other storage error is returned as-is.
//!
//! The pool is refilled by a single background worker. An empty pool raises
//! a refill request through an atomic flag, so any number of callers racing
//! past an empty pool produce exactly one refill.

use metrics::counter;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::entities::short_url::MAX_URL_LENGTH;
use crate::domain::repositories::{CodeStore, StoreError};
use crate::utils::code_generator::generate_code;
use crate::utils::url_normalizer::validate_target;

/// Number of candidates the pool is refilled up to once drained.
pub const DEFAULT_POOL_SIZE: usize = 10_000;

/// Collision retries before giving up on a single assignment.
pub const DEFAULT_MAX_ATTEMPTS: usize = 64;

/// Errors returned by [`CodeAllocator::assign`].
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    #[error("no free short code found after {attempts} attempts")]
    SpaceExhausted { attempts: usize },

    #[error(transparent)]
    Storage(StoreError),
}

/// Tunables for [`CodeAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorSettings {
    pub pool_size: usize,
    pub max_attempts: usize,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Process-local queue of not-yet-assigned candidate codes.
///
/// Candidates are unique within the queue but not checked against storage.
pub struct CandidatePool {
    queue: Mutex<VecDeque<String>>,
    target_size: usize,
    refilling: AtomicBool,
    refills_started: AtomicU64,
    refill_tx: mpsc::Sender<()>,
    completed_tx: watch::Sender<u64>,
}

impl CandidatePool {
    fn new(target_size: usize) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (refill_tx, refill_rx) = mpsc::channel(1);
        let (completed_tx, _) = watch::channel(0);

        let pool = Arc::new(Self {
            queue: Mutex::new(VecDeque::with_capacity(target_size)),
            target_size,
            refilling: AtomicBool::new(false),
            refills_started: AtomicU64::new(0),
            refill_tx,
            completed_tx,
        });

        (pool, refill_rx)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pops the next candidate, requesting a refill if the pool is empty.
    fn take(&self) -> Option<String> {
        let mut queue = self.lock();
        let code = queue.pop_front();

        if code.is_none() {
            self.request_refill();
        }

        code
    }

    /// Asks the worker for a refill unless one is already in flight.
    fn request_refill(&self) -> bool {
        if self
            .refilling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        if self.refill_tx.try_send(()).is_err() {
            self.refilling.store(false, Ordering::Release);
            warn!("Candidate pool refill worker is not running");
            return false;
        }

        self.refills_started.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Tops the queue up to the target size. Returns the number of codes added.
    fn refill(&self) -> usize {
        let mut seen: HashSet<String> = self.lock().iter().cloned().collect();
        let missing = self.target_size.saturating_sub(seen.len());

        let mut fresh = Vec::with_capacity(missing);
        while fresh.len() < missing {
            let code = generate_code();
            if seen.insert(code.clone()) {
                fresh.push(code);
            }
        }

        let added = fresh.len();
        self.lock().extend(fresh);
        added
    }

    fn finish_refill(&self) {
        self.refilling.store(false, Ordering::Release);
        self.completed_tx.send_modify(|n| *n += 1);
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns true while a refill is in flight.
    pub fn is_refilling(&self) -> bool {
        self.refilling.load(Ordering::Acquire)
    }

    /// Number of refills requested since startup.
    pub fn refills_started(&self) -> u64 {
        self.refills_started.load(Ordering::Relaxed)
    }

    /// Number of refills finished since startup.
    pub fn refills_completed(&self) -> u64 {
        *self.completed_tx.borrow()
    }

    /// Waits until no refill is in flight.
    pub async fn wait_idle(&self) {
        let mut completed = self.completed_tx.subscribe();
        while self.is_refilling() {
            if completed.changed().await.is_err() {
                break;
            }
        }
    }

    #[cfg(test)]
    fn queued(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }
}

async fn run_refill_worker(
    pool: Arc<CandidatePool>,
    mut requests: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    debug!("Candidate pool refill worker started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            request = requests.recv() => {
                if request.is_none() {
                    break;
                }
            }
        }

        let added = pool.refill();
        pool.finish_refill();
        counter!("shortener_pool_refills_total").increment(1);
        debug!(added, queued = pool.len(), "Candidate pool refilled");
    }

    debug!("Candidate pool refill worker stopped");
}

/// Hands out unique short codes for long URLs.
pub struct CodeAllocator {
    store: Arc<dyn CodeStore>,
    pool: Arc<CandidatePool>,
    max_attempts: usize,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CodeAllocator {
    /// Creates the allocator and spawns its refill worker.
    ///
    /// The pool starts empty and is filled lazily on first use.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(store: Arc<dyn CodeStore>, settings: AllocatorSettings) -> Self {
        let (pool, requests) = CandidatePool::new(settings.pool_size.max(1));
        let cancel = CancellationToken::new();

        let worker = tokio::spawn(run_refill_worker(pool.clone(), requests, cancel.clone()));

        Self {
            store,
            pool,
            max_attempts: settings.max_attempts.max(1),
            cancel,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Assigns a fresh short code to `long_url` and stores the mapping.
    ///
    /// The URL must already be normalized; it is only checked here, not repaired.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::InvalidUrl`] if the URL is blank, relative, too long
    ///   or not an http, https or ftp URL
    /// - [`AllocationError::SpaceExhausted`] after `max_attempts` consecutive collisions
    /// - [`AllocationError::Storage`] on any storage failure other than a collision
    pub async fn assign(&self, long_url: &str) -> Result<String, AllocationError> {
        check_assignable(long_url)?;

        for attempt in 1..=self.max_attempts {
            let code = self.pool.take().unwrap_or_else(generate_code);

            match self.store.insert(&code, long_url).await {
                Ok(()) => {
                    counter!("shortener_codes_assigned_total").increment(1);
                    debug!(code = %code, attempt, "Assigned short code");
                    return Ok(code);
                }
                Err(StoreError::DuplicateKey { .. }) => {
                    counter!("shortener_code_collisions_total").increment(1);
                    debug!(code = %code, attempt, "Short code collision, retrying");
                }
                Err(e) => return Err(AllocationError::Storage(e)),
            }
        }

        warn!(attempts = self.max_attempts, "Short code space exhausted");
        Err(AllocationError::SpaceExhausted {
            attempts: self.max_attempts,
        })
    }

    /// The candidate pool, for health reporting.
    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    /// Stops the refill worker and waits for it to exit.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Refill worker terminated abnormally");
            }
            info!("Code allocator stopped");
        }
    }
}

impl Drop for CodeAllocator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn check_assignable(long_url: &str) -> Result<(), AllocationError> {
    validate_target(long_url).map_err(|reason| AllocationError::InvalidUrl {
        reason: reason.to_string(),
    })?;

    if long_url.chars().count() > MAX_URL_LENGTH {
        return Err(AllocationError::InvalidUrl {
            reason: format!("longer than {MAX_URL_LENGTH} characters"),
        });
    }

    Ok(())
}
