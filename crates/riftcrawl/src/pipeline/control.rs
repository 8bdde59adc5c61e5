use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cancellation flag plus an optional deadline for one pipeline run.
///
/// Cloning shares the flag, so a handle given to a signal handler can cancel
/// a run that is executing on another thread.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// A control whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// A handle sharing this control's cancel flag whose deadline is the
    /// earlier of the current one and `timeout` from now.
    pub fn bounded_by(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, candidate) {
            (Some(current), Some(candidate)) => Some(current.min(candidate)),
            (current, candidate) => current.or(candidate),
        };
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once `cancel` was called or the deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. `None` when the run has no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// `configured` capped at the time remaining.
    pub fn timeout_for(&self, configured: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => configured.min(remaining),
            None => configured,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_cancelled() {
        let control = RunControl::new();
        assert!(!control.is_cancelled());
        assert!(control.remaining().is_none());
        assert_eq!(
            control.timeout_for(Duration::from_secs(10)),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let control = RunControl::new();
        let handle = control.clone();
        handle.cancel();
        assert!(control.is_cancelled());
    }

    #[test]
    fn test_expired_deadline_counts_as_cancelled() {
        let control = RunControl::with_deadline(Instant::now());
        assert!(control.is_cancelled());
        assert_eq!(control.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_bounded_by_shares_flag_and_keeps_earlier_deadline() {
        let control = RunControl::with_timeout(Duration::from_secs(1));
        let bounded = control.bounded_by(Duration::from_secs(3600));
        assert_eq!(bounded.deadline(), control.deadline());

        let open = RunControl::new();
        let bounded = open.bounded_by(Duration::from_secs(60));
        assert!(bounded.deadline().is_some());
        open.cancel();
        assert!(bounded.is_cancelled());
    }

    #[test]
    fn test_timeout_capped_by_remaining() {
        let control = RunControl::with_timeout(Duration::from_secs(2));
        let capped = control.timeout_for(Duration::from_secs(30));
        assert!(capped <= Duration::from_secs(2));
        assert!(!control.is_cancelled());
    }
}
