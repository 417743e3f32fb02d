//! Per-connector rate limiting.
//!
//! Each named budget caps how many crawl operations may hold a slot at any
//! instant, shared across all organisations using that connector (the
//! third-party API quota is shared). Budgets are fully independent: one
//! saturated connector never throttles another.
//!
//! Admission is FIFO: acquirers queue in arrival order behind a fair
//! async mutex, so no caller is permanently outrun by newer requests. A
//! reservation is freed by an explicit [`RateLimiter::release`] or expires
//! on its own one interval after acquisition, whichever comes first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Errors produced by the rate limiter.
#[derive(Debug, Clone, Error)]
pub enum RateLimitError {
    /// The budget parameters are unusable.
    #[error("Invalid rate limiter config for {name}: {reason}")]
    InvalidConfig { name: String, reason: String },

    /// No budget was ever registered under this name.
    #[error("Unknown rate limiter: {0}")]
    UnknownLimiter(String),

    /// More releases than acquires for this name.
    #[error("Unbalanced release for rate limiter: {0}")]
    Unbalanced(String),

    /// No slot became available within the caller's timeout.
    #[error("Rate limit timeout for {0}")]
    RateLimitTimeout(String),
}

struct BucketState {
    /// Configured budget: max reservations per interval.
    requests: usize,
    /// Sliding window length.
    interval: Duration,
    /// Explicitly held reservations, for unbalanced-release detection.
    held: usize,
    /// Acquisition times of live reservations, oldest first.
    window: VecDeque<Instant>,
}

impl BucketState {
    /// Drop reservations whose interval has elapsed.
    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.window.front() {
            if now.duration_since(*front) >= self.interval {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }
}

struct Bucket {
    /// FIFO admission queue: acquirers line up here in arrival order.
    admission: tokio::sync::Mutex<()>,
    state: Mutex<BucketState>,
    notify: Notify,
}

/// Process-wide registry of named rate budgets.
///
/// Cheap to share behind an `Arc`; all access is synchronized.
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, Arc<Bucket>>>,
}

impl RateLimiter {
    /// Create a limiter with no registered budgets.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
        }
    }

    /// Install or replace the budget for `name`. Idempotent; last writer
    /// wins. Re-registration keeps outstanding reservations and waiters.
    pub fn register(
        &self,
        name: &str,
        requests: usize,
        interval: Duration,
    ) -> Result<(), RateLimitError> {
        if requests == 0 {
            return Err(RateLimitError::InvalidConfig {
                name: name.to_string(),
                reason: "request count must be positive".to_string(),
            });
        }
        if interval.is_zero() {
            return Err(RateLimitError::InvalidConfig {
                name: name.to_string(),
                reason: "interval must be positive".to_string(),
            });
        }

        let mut buckets = self.buckets.write().expect("rate limiter lock poisoned");
        match buckets.get(name) {
            Some(bucket) => {
                let mut state = bucket.state.lock().expect("rate limiter lock poisoned");
                state.requests = requests;
                state.interval = interval;
                drop(state);
                // The budget may have grown; wake queued acquirers.
                bucket.notify.notify_waiters();
            }
            None => {
                buckets.insert(
                    name.to_string(),
                    Arc::new(Bucket {
                        admission: tokio::sync::Mutex::new(()),
                        state: Mutex::new(BucketState {
                            requests,
                            interval,
                            held: 0,
                            window: VecDeque::new(),
                        }),
                        notify: Notify::new(),
                    }),
                );
            }
        }

        info!(
            name = %name,
            requests = requests,
            interval_ms = interval.as_millis() as u64,
            "Registered rate limiter budget"
        );
        Ok(())
    }

    fn bucket(&self, name: &str) -> Result<Arc<Bucket>, RateLimitError> {
        self.buckets
            .read()
            .expect("rate limiter lock poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| RateLimitError::UnknownLimiter(name.to_string()))
    }

    /// Reserve a slot under `name`'s budget, suspending until one frees.
    ///
    /// Acquirers are served in arrival order.
    pub async fn acquire(&self, name: &str) -> Result<(), RateLimitError> {
        let bucket = self.bucket(name)?;

        // Queue position: the fair mutex serves waiters FIFO, so the
        // oldest acquirer is always the next one admitted.
        let _position = bucket.admission.lock().await;

        loop {
            let wait_until = {
                let now = Instant::now();
                let mut state = bucket.state.lock().expect("rate limiter lock poisoned");
                state.prune(now);

                if state.window.len() < state.requests {
                    state.window.push_back(now);
                    state.held += 1;
                    debug!(name = %name, outstanding = state.window.len(), "Acquired rate limit slot");
                    return Ok(());
                }

                state.window.front().map(|front| *front + state.interval)
            };

            // Wake on a release or when the oldest reservation expires.
            match wait_until {
                Some(deadline) => {
                    tokio::select! {
                        _ = bucket.notify.notified() => {}
                        _ = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)) => {}
                    }
                }
                None => bucket.notify.notified().await,
            }
        }
    }

    /// Like [`acquire`](Self::acquire), but fails with `RateLimitTimeout`
    /// when no slot frees within `timeout`.
    pub async fn acquire_timeout(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<(), RateLimitError> {
        match tokio::time::timeout(timeout, self.acquire(name)).await {
            Ok(result) => result,
            Err(_) => Err(RateLimitError::RateLimitTimeout(name.to_string())),
        }
    }

    /// Return a previously acquired slot.
    ///
    /// Calling more releases than acquires is a programmer error and fails
    /// with `Unbalanced` rather than silently underflowing.
    pub fn release(&self, name: &str) -> Result<(), RateLimitError> {
        let bucket = self.bucket(name)?;

        {
            let mut state = bucket.state.lock().expect("rate limiter lock poisoned");
            if state.held == 0 {
                return Err(RateLimitError::Unbalanced(name.to_string()));
            }
            state.held -= 1;
            state.prune(Instant::now());
            state.window.pop_front();
        }

        bucket.notify.notify_one();
        debug!(name = %name, "Released rate limit slot");
        Ok(())
    }

    /// Slots currently reserved under `name`'s budget.
    pub fn outstanding(&self, name: &str) -> Result<usize, RateLimitError> {
        let bucket = self.bucket(name)?;
        let mut state = bucket.state.lock().expect("rate limiter lock poisoned");
        state.prune(Instant::now());
        Ok(state.window.len())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
