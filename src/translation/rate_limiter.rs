use log::warn;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

/// Minimum spacing between backend calls, shared by all workers
///
/// The lock is held across the sleep, so concurrent callers queue up and
/// each one is released at least `1 / rate` seconds after the previous one.
/// There is no fairness guarantee between waiting callers.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_second` calls per second
    ///
    /// A non-positive or non-finite rate disables spacing.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            warn!("Invalid rate {} requests/s, rate limiting disabled", requests_per_second);
            Duration::ZERO
        };

        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Minimum time between two permitted calls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until a call is permitted, then record it
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(previous) = *last_call {
            let next_allowed = previous + self.interval;
            if next_allowed > Instant::now() {
                sleep_until(next_allowed).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}
