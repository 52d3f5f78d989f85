//! Reconciliation context and progress callbacks
//!
//! Every provider call made during a tick receives a [`Context`]. It carries
//! an optional deadline and a cancellation flag shared by all of its
//! children, so a scheduler can bound or abort a tick from the outside.

use crate::types::ReconcileOutcome;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Why a context is no longer usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// [`Context::cancel`] was called on this context or one sharing its flag
    Cancelled,
    /// The deadline has passed
    DeadlineExceeded,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "context cancelled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for ContextError {}

/// Cancellation and deadline carrier passed through every network call
///
/// Cloning a context shares its cancellation flag.
///
/// # Example
///
/// ```
/// use managed::Context;
/// use std::time::Duration;
///
/// let root = Context::background();
/// let tick = root.with_timeout(Duration::from_secs(30));
///
/// assert!(tick.err().is_none());
/// root.cancel();
/// assert!(tick.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A context with no deadline that is never cancelled unless asked to
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child that expires after `timeout`
    ///
    /// The child keeps the parent's deadline if that one is earlier.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child that expires at `deadline`
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Cancel this context and every context sharing its flag
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline
    ///
    /// Returns `None` when there is no deadline and `Some(Duration::ZERO)`
    /// once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Check whether the context can still be used
    pub fn err(&self) -> Option<ContextError> {
        if self.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Like [`Context::err`], as a `Result`
    pub fn check(&self) -> Result<(), ContextError> {
        self.err().map_or(Ok(()), Err)
    }
}

/// Progress callback for tick execution
///
/// Implement this trait to receive progress updates while the executor
/// reconciles a batch of resources.
pub trait ProgressCallback: Send {
    /// Called when starting a tick over `count` resources
    fn on_tick_start(&mut self, count: usize);

    /// Called when a resource finished reconciling
    fn on_resource_complete(&mut self, name: &str, outcome: &ReconcileOutcome);

    /// Called when the tick completes
    fn on_tick_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_tick_start(&mut self, _count: usize) {}
    fn on_resource_complete(&mut self, _name: &str, _outcome: &ReconcileOutcome) {}
    fn on_tick_complete(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_usable() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.remaining().is_none());
        assert!(ctx.check().is_ok());
    }

    #[test]
    fn test_cancel_propagates_to_children() {
        let root = Context::background();
        let child = root.with_timeout(Duration::from_secs(60));
        let grandchild = child.with_timeout(Duration::from_secs(10));

        grandchild.cancel();

        assert!(root.is_cancelled());
        assert_eq!(child.err(), Some(ContextError::Cancelled));
    }

    #[test]
    fn test_child_keeps_earlier_deadline() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(3600));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_child_takes_earlier_deadline() {
        let parent = Context::background().with_timeout(Duration::from_secs(3600));
        let child = parent.with_timeout(Duration::from_secs(1));
        assert!(child.deadline() < parent.deadline());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn test_context_error_display() {
        assert!(ContextError::Cancelled.to_string().contains("cancelled"));
        assert!(
            ContextError::DeadlineExceeded
                .to_string()
                .contains("deadline")
        );
    }
}
