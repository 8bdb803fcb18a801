use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Side-channel values sent along with a call (e.g. the advisory timeout).
pub type Metadata = HashMap<String, String>;

/// Cancellation scope of a single call.
///
/// A `Context` only carries a deadline. Request metadata travels as a separate
/// `Metadata` argument so neither has to be smuggled through the other.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never expires.
    pub fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Derives a context expiring after `timeout`, or at this context's
    /// deadline if that comes first.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing <= candidate => existing,
            _ => candidate,
        };
        Self::with_deadline(deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` for a context without one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| deadline <= Instant::now())
    }
}
