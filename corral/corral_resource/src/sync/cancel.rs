//! Cancellation tokens for blocking acquisition.
//!
//! A token stands in for the caller's cancellation context: a cloneable
//! signal with an optional deadline that a blocked acquire observes while
//! waiting for capacity.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::atomic::OnceFlag;

/// The reason a cancellation token fired.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelError {
    /// The token was explicitly cancelled
    #[error("operation cancelled")]
    Cancelled,

    /// The token's deadline passed
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// A cloneable cancellation signal with an optional deadline.
///
/// All clones share the same state: cancelling any clone cancels them
/// all. A token constructed with [`CancelToken::new`] never fires on its
/// own.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: OnceFlag,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token with no deadline that only fires if [`cancel`] is called.
    ///
    /// [`cancel`]: CancelToken::cancel
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that fires [`CancelError::DeadlineExceeded`] once `timeout`
    /// has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A token that fires [`CancelError::DeadlineExceeded`] at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: OnceFlag::new(),
                deadline: Some(deadline),
            }),
        }
    }

    /// Cancel the token. Every clone observes the cancellation.
    pub fn cancel(&self) {
        self.inner.cancelled.set();
    }

    /// Whether [`cancel`] has been called on this token or any clone.
    ///
    /// [`cancel`]: CancelToken::cancel
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.is_set()
    }

    /// Check the token, returning why it has fired if it has.
    ///
    /// Explicit cancellation takes precedence over an expired deadline.
    pub fn check(&self) -> std::result::Result<(), CancelError> {
        if self.inner.cancelled.is_set() {
            return Err(CancelError::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(CancelError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Time left until the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_token_without_deadline_never_fires() {
        let token = CancelToken::new();

        assert!(token.check().is_ok());
        assert!(!token.is_cancelled());
        assert_eq!(token.remaining(), None);
    }

    #[test]
    fn test_token_deadline_expires() {
        let token = CancelToken::with_timeout(Duration::from_millis(10));

        assert!(token.check().is_ok());
        assert!(token.remaining().is_some());

        thread::sleep(Duration::from_millis(20));

        assert_eq!(token.check(), Err(CancelError::DeadlineExceeded));
        // Deadline expiry is not an explicit cancellation
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_shared_by_clones() {
        let token = CancelToken::new();
        let clone = token.clone();

        clone.cancel();

        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(CancelError::Cancelled));
    }

    #[test]
    fn test_cancel_takes_precedence_over_deadline() {
        let token = CancelToken::with_timeout(Duration::from_millis(1));
        token.cancel();

        thread::sleep(Duration::from_millis(5));

        assert_eq!(token.check(), Err(CancelError::Cancelled));
    }
}
