//! Sliding-window rate limiter keyed by phone number

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::infrastructure::config::RateLimitConfig;

/// Keys tracked before idle ones are swept
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub retry_after: Duration,
}

pub struct RateLimiter {
    requests: Mutex<HashMap<String, VecDeque<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window_seconds)
    }

    /// Record a request for `key`, or refuse it when the window is full
    pub fn check(&self, key: &str) -> Result<(), RateLimited> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimited> {
        let mut requests = self.requests.lock().unwrap_or_else(PoisonError::into_inner);

        if requests.len() > SWEEP_THRESHOLD {
            let window = self.window;
            requests.retain(|_, times| times.back().is_some_and(|t| now.duration_since(*t) < window));
        }

        let times = requests.entry(key.to_string()).or_default();
        while times.front().is_some_and(|t| now.duration_since(*t) >= self.window) {
            times.pop_front();
        }

        if times.len() >= self.max_requests as usize {
            let retry_after = times
                .front()
                .map(|t| self.window.saturating_sub(now.duration_since(*t)))
                .unwrap_or(self.window);
            return Err(RateLimited { retry_after });
        }

        times.push_back(now);
        Ok(())
    }
}
