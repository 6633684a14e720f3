//! Per-source rate limiting.
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// A fixed-delay gate: at most one request leaves every `delay` per source.
///
/// Each source owns its own limiter; there is no cross-source coordination.
pub struct RateLimiter {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }

    /// Await a token: blocks until at least `delay` has passed since the
    /// previous call returned.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        let now = Instant::now();
        if let Some(previous) = *last {
            let elapsed = now.duration_since(previous);
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// arXiv's policy: a mutually exclusive critical section around each
/// request, with the configured delay paid inside the section, so that
/// arXiv calls are strictly serialized regardless of concurrent worker
/// count.
pub struct SerializingRateLimiter {
    delay: Duration,
    gate: Mutex<()>,
}

impl SerializingRateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: Mutex::new(()),
        }
    }

    /// Run `f` inside the critical section, paying the configured delay
    /// before returning the guard to the caller.
    pub async fn run<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.gate.lock().await;
        let result = f().await;
        sleep(self.delay).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant as TokioInstant;

    #[tokio::test(start_paused = true)]
    async fn rate_limiter_spaces_out_acquires() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let start = TokioInstant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn serializing_limiter_pays_delay_inside_critical_section() {
        let limiter = SerializingRateLimiter::new(Duration::from_millis(50));
        let start = TokioInstant::now();
        limiter.run(|| async { 1 }).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
