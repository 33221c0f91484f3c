//! Token budget for outbound workspace API calls.
//!
//! Notion allows an average of three requests per second per integration.
//! [`RateLimiter`] hands out at most `capacity` tokens per `interval`; a spent
//! token comes back exactly one interval after it was taken, so a full burst is
//! available up front but no rolling window ever sees more than `capacity`
//! grants.
//!
//! Time comes from `tokio::time`, which lets tests run the limiter against a
//! paused clock.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_REQUESTS_PER_SECOND: usize = 3;

#[derive(Debug)]
pub struct RateLimiter {
    capacity: usize,
    interval: Duration,
    /// Instants at which the outstanding tokens were spent, oldest first.
    spent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(capacity: usize, interval: Duration) -> Self {
        let capacity = capacity.max(1);
        RateLimiter {
            capacity,
            interval,
            spent: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn per_second(requests: usize) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// Waits until a token is available and takes it.
    ///
    /// Callers queue on the inner mutex, which serves them in arrival order.
    pub async fn acquire(&self) {
        let mut spent = self.spent.lock().await;
        loop {
            let now = Instant::now();
            while spent
                .front()
                .is_some_and(|taken| now.duration_since(*taken) >= self.interval)
            {
                spent.pop_front();
            }

            if spent.len() < self.capacity {
                spent.push_back(now);
                return;
            }

            if let Some(oldest) = spent.front().copied() {
                let ready_at = oldest + self.interval;
                debug!(
                    wait_ms = ready_at.duration_since(now).as_millis() as u64,
                    "Rate limit reached, waiting for a token"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_second(DEFAULT_REQUESTS_PER_SECOND)
    }
}
