//! Per-domain sliding-window rate limiter.
//!
//! One window per canonical domain, never global. Consulted after the
//! cache lookup and before any fetch, so cache hits do not consume
//! budget.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    inner: Mutex<HashMap<String, VecDeque<Instant>>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            limit: limit.max(1),
            window,
        }
    }

    /// Admit or reject a request for `domain`. On rejection returns the
    /// seconds until the oldest timestamp leaves the window.
    pub fn check(&self, domain: &str) -> Result<(), u64> {
        self.check_at(domain, Instant::now())
    }

    fn check_at(&self, domain: &str, now: Instant) -> Result<(), u64> {
        let mut map = self.inner.lock().expect("rate limiter mutex poisoned");
        let ring = map.entry(domain.to_string()).or_default();

        while let Some(&front) = ring.front() {
            if now.duration_since(front) >= self.window {
                ring.pop_front();
            } else {
                break;
            }
        }

        if ring.len() >= self.limit {
            let retry_after = ring
                .front()
                .map(|&oldest| {
                    self.window
                        .saturating_sub(now.duration_since(oldest))
                        .as_secs()
                })
                .unwrap_or(0);
            return Err(retry_after);
        }

        ring.push_back(now);
        Ok(())
    }
}
