use thiserror::Error;
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("no debounce window is running")]
    NotDebouncing,
    #[error("debounce window still has {remaining:?} to run")]
    NotDue { remaining: Duration },
    #[error("no send is in flight")]
    NotSending,
}

/// Where the flush window currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    /// Nothing pending, no timer.
    Idle,
    /// Cooldown running; a send starts at `deadline`.
    Debouncing {
        /// Fixed at window entry, never pushed back by later appends.
        deadline: Instant,
    },
    /// One batch of `batch_len` events is being uploaded.
    Sending {
        /// Number of events in the in-flight batch.
        batch_len: usize,
    },
}

/// Debounce + single-flight state machine.
///
/// Holds no timers itself: callers pass `now` in and arm their own sleep from
/// [`FlushScheduler::deadline`].
#[derive(Debug, Clone)]
pub struct FlushScheduler {
    state: FlushState,
    cooldown: Duration,
}

impl FlushScheduler {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: FlushState::Idle,
            cooldown,
        }
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            FlushState::Debouncing { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, FlushState::Sending { .. })
    }

    /// Opens a debounce window when idle with events pending.
    ///
    /// Returns true only when a new window was opened.
    pub fn check_for_unsent(&mut self, pending: usize, now: Instant) -> bool {
        if pending == 0 || self.state != FlushState::Idle {
            return false;
        }
        self.state = FlushState::Debouncing {
            deadline: now + self.cooldown,
        };
        true
    }

    /// Closes the debounce window at its deadline.
    ///
    /// Returns true when a batch of `batch_len` events should now be sent,
    /// false when there was nothing to send and the scheduler went idle.
    pub fn begin_send(&mut self, batch_len: usize, now: Instant) -> Result<bool, SchedulerError> {
        let FlushState::Debouncing { deadline } = self.state else {
            return Err(SchedulerError::NotDebouncing);
        };
        if now < deadline {
            return Err(SchedulerError::NotDue {
                remaining: deadline - now,
            });
        }

        if batch_len == 0 {
            self.state = FlushState::Idle;
            return Ok(false);
        }
        self.state = FlushState::Sending { batch_len };
        Ok(true)
    }

    /// Ends the in-flight send and returns its batch length.
    pub fn finish_send(&mut self) -> Result<usize, SchedulerError> {
        let FlushState::Sending { batch_len } = self.state else {
            return Err(SchedulerError::NotSending);
        };
        self.state = FlushState::Idle;
        Ok(batch_len)
    }
}
