//! Resilience: bounded retries and wall-clock deadlines
//!
//! Every wait in a session is either a fixed number of paced attempts or a
//! deadline checked from inside a polling loop. There are no timers or
//! alarms: a bound only fires when the loop that owns it looks at it.
//!
//! Both helpers run on tokio's clock, so tests can pause time and let the
//! runtime skip over the pacing sleeps.
//!
//! ```text
//! RetryPolicy::retry
//!   ├─ attempt 1 ok → Ok(value)
//!   ├─ attempt n fails → sleep(delay) → attempt n+1
//!   └─ last attempt fails → Err(RetryExhausted { attempts, last })
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

/// A fixed number of attempts with a fixed pause between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

/// Returned when every attempt of a [`RetryPolicy`] failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    /// The error of the final attempt (absent only for a zero-attempt policy).
    pub last: Option<E>,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last {
            Some(err) => write!(f, "{} attempts failed, last error: {}", self.attempts, err),
            None => write!(f, "no attempts were made"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryExhausted<E> {}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Run `op` until it succeeds or the attempts run out. `op` receives the
    /// 1-based attempt number. The pause is only taken between attempts.
    pub async fn retry<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut last = None;
        for attempt in 1..=self.attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(attempt, max = self.attempts, error = %err, "Attempt failed");
                    last = Some(err);
                    if attempt < self.attempts {
                        sleep(self.delay).await;
                    }
                }
            }
        }
        Err(RetryExhausted {
            attempts: self.attempts,
            last,
        })
    }
}

/// A relative wall-clock bound checked from inside a polling loop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// Start counting again from now.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Strictly past the limit, matching a "longer than N minutes" check.
    pub fn expired(&self) -> bool {
        self.elapsed() > self.limit
    }
}
