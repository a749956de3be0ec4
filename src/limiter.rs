use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Fixed-window request limiter: at most `capacity` acquisitions per
/// interval, restored in bulk by a background refill task once per tick.
///
/// Permits are not tied to the lifetime of the work they gate. A caller that
/// acquires one keeps it "spent" until the next refill, so failed requests
/// still count against the window. Bursts of up to 2x capacity are possible
/// across a window boundary; that is inherent to the fixed-window scheme.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<LimiterInner>,
}

#[derive(Debug)]
struct LimiterInner {
    permits: Semaphore,
    capacity: usize,
    acquired_in_interval: AtomicU32,
    closed: AtomicBool,
    refill_task: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `capacity` acquisitions per `interval` and
    /// starts its refill task. Must be called from within a tokio runtime.
    pub fn new(interval: Duration, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ClientError::Config(
                "request limit must be greater than zero".into(),
            ));
        }
        if interval.is_zero() {
            return Err(ClientError::Config(
                "interval must be a positive duration".into(),
            ));
        }

        let inner = Arc::new(LimiterInner {
            permits: Semaphore::new(capacity),
            capacity,
            acquired_in_interval: AtomicU32::new(0),
            closed: AtomicBool::new(false),
            refill_task: Mutex::new(None),
        });

        // The task only holds a Weak reference, so dropping the last limiter
        // handle without an explicit shutdown still ends the loop.
        let weak = Arc::downgrade(&inner);
        let handle = tokio::spawn(refill_loop(weak, interval));
        inner.refill_task.lock().replace(handle);

        Ok(Self { inner })
    }

    /// Waits for a permit, FIFO across concurrent callers.
    ///
    /// The permit is consumed for the rest of the current window; only the
    /// refill task gives it back. Dropping the returned future while queued
    /// abandons the wait without consuming anything.
    pub async fn acquire(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ClientError::Closed);
        }

        // The semaphore is closed on shutdown, waking every queued waiter.
        let permit = self
            .inner
            .permits
            .acquire()
            .await
            .map_err(|_| ClientError::Closed)?;
        permit.forget();

        self.inner.acquired_in_interval.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Stops the refill task and fails all current and future `acquire`
    /// calls. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.permits.close();
        if let Some(handle) = self.inner.refill_task.lock().take() {
            handle.abort();
        }
        debug!("rate limiter shut down");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn available_permits(&self) -> usize {
        self.inner.permits.available_permits()
    }

    /// Number of permits handed out since the last refill tick.
    pub fn acquired_in_interval(&self) -> u32 {
        self.inner.acquired_in_interval.load(Ordering::Relaxed)
    }
}

async fn refill_loop(inner: Weak<LimiterInner>, interval: Duration) {
    // First tick fires one full interval after construction, not immediately.
    let start = tokio::time::Instant::now() + interval;
    let mut ticker = tokio::time::interval_at(start, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else { break };
        inner.refill();
    }
}

impl LimiterInner {
    /// Restores the window to full capacity. Infallible: the deficit is
    /// computed with saturating arithmetic, so even a corrupted counter
    /// degrades toward capacity instead of overshooting.
    fn refill(&self) {
        let available = self.permits.available_permits();
        let deficit = self.capacity.saturating_sub(available);
        if deficit > 0 {
            self.permits.add_permits(deficit);
        }
        let served = self.acquired_in_interval.swap(0, Ordering::Relaxed);
        if served > 0 {
            debug!(served, restored = deficit, "rate limit window reset");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn acquires_within_capacity_do_not_block() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 3).unwrap();

        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await.unwrap();
        }

        assert_eq!(limiter.available_permits(), 0);
        assert_eq!(limiter.acquired_in_interval(), 3);
        // No waiter, so virtual time never advanced to the refill tick.
        assert!(start.elapsed() < Duration::from_secs(1));

        limiter.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn extra_acquire_waits_for_refill() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 2).unwrap();

        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();

        let start = Instant::now();
        limiter.acquire().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(1));

        limiter.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn refill_never_exceeds_capacity() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 2).unwrap();

        limiter.acquire().await.unwrap();
        // Let several refill ticks fire with a deficit of one.
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(limiter.available_permits(), 2);
        assert_eq!(limiter.acquired_in_interval(), 0);

        limiter.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_acquires_respect_the_window() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 4).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await.unwrap();
                Instant::now()
            }));
        }

        let start = Instant::now();
        let mut finished = Vec::new();
        for handle in handles {
            finished.push(handle.await.unwrap());
        }

        // First four go through immediately, the rest wait a full window.
        let waited = finished
            .iter()
            .filter(|t| t.duration_since(start) >= Duration::from_secs(1))
            .count();
        assert_eq!(waited, 4);
        assert!(limiter.available_permits() <= 4);

        limiter.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_fails_fast_and_wakes_waiters() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 1).unwrap();
        limiter.acquire().await.unwrap();

        let blocked = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::task::yield_now().await;

        limiter.shutdown();

        let woken = blocked.await.unwrap();
        assert!(matches!(woken, Err(ClientError::Closed)));
        assert!(matches!(limiter.acquire().await, Err(ClientError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_is_idempotent() {
        let limiter = RateLimiter::new(Duration::from_secs(1), 1).unwrap();
        limiter.shutdown();
        limiter.shutdown();
        assert!(limiter.is_closed());
    }

    #[tokio::test]
    async fn rejects_invalid_construction() {
        assert!(matches!(
            RateLimiter::new(Duration::from_secs(1), 0),
            Err(ClientError::Config(_))
        ));
        assert!(matches!(
            RateLimiter::new(Duration::ZERO, 5),
            Err(ClientError::Config(_))
        ));
    }
}
