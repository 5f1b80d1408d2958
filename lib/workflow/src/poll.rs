//! Poll policy and the clock the tracker waits on.
//!
//! The tracker never queries task status back to back: every non-terminal
//! observation is followed by a delay from the policy. Time is read and slept
//! through [`Clock`] so tests can run the loop with a [`ManualClock`].

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Smallest delay ever used between two status queries.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the delay between polls evolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay every time.
    Fixed,
    /// Delay grows by `factor` per poll, capped at `max_interval`.
    Exponential { factor: f64, max_interval: Duration },
}

/// Limits and pacing for waiting on one task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay after the first non-terminal observation.
    pub interval: Duration,
    /// Growth of the delay.
    pub backoff: Backoff,
    /// Give up once this much time has passed.
    pub deadline: Option<Duration>,
    /// Give up after this many status queries.
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    /// A fixed-interval policy without limits.
    #[must_use]
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            backoff: Backoff::Fixed,
            deadline: None,
            max_attempts: None,
        }
    }

    /// A capped exponential policy without limits.
    #[must_use]
    pub fn exponential(interval: Duration, factor: f64, max_interval: Duration) -> Self {
        Self {
            interval,
            backoff: Backoff::Exponential {
                factor,
                max_interval,
            },
            deadline: None,
            max_attempts: None,
        }
    }

    /// Sets the deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the maximum number of status queries.
    ///
    /// The first query is always made, so a limit of 0 is raised to 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Delay to wait after the `completed_polls`-th non-terminal observation
    /// (1-based).
    #[must_use]
    pub fn delay_after(&self, completed_polls: u32) -> Duration {
        let base = match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential {
                factor,
                max_interval,
            } => {
                let exponent = i32::try_from(completed_polls.saturating_sub(1)).unwrap_or(i32::MAX);
                let grown = self.interval.as_secs_f64() * factor.max(1.0).powi(exponent);
                let capped = grown.min(max_interval.max(self.interval).as_secs_f64());
                Duration::try_from_secs_f64(capped).unwrap_or(max_interval)
            }
        };
        base.max(MIN_POLL_INTERVAL)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::exponential(Duration::from_secs(1), 1.5, Duration::from_secs(10))
            .with_deadline(Duration::from_secs(30 * 60))
    }
}

/// Source of time for the poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Waits for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock whose sleeps return immediately and advance virtual time.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    offset: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    /// Creates a clock at virtual time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Moves virtual time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.offset += duration;
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .offset
    }

    /// Every sleep requested so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sleeps
            .clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.offset += duration;
            state.sleeps.push(duration);
        }
        tokio::task::yield_now().await;
    }
}
