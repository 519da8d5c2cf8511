//! Error types for resource lifecycle management.

use thiserror::Error;

use crate::sync::cancel::CancelError;

/// Boxed error produced by caller-supplied constructors and destructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias for results of manager and handle operations.
pub type Result<T> = std::result::Result<T, ResourceError>;

/// Error returned by manager and handle operations.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// The manager has been closed; no further resources can be acquired
    #[error("resource manager is closed")]
    ManagerClosed,

    /// The handle is not held by this manager. It could have been issued
    /// by another manager, or could already have been destroyed
    #[error("handle not held by this manager")]
    InvalidHandle,

    /// The caller's cancellation token fired while waiting to acquire
    #[error(transparent)]
    Cancelled(#[from] CancelError),

    /// The caller-supplied constructor failed; no instance was registered
    #[error("failed to construct resource: {0}")]
    Construct(#[source] BoxError),

    /// The caller-supplied destructor failed; the instance is still
    /// removed from the manager's bookkeeping
    #[error("failed to destroy resource: {0}")]
    Destroy(#[source] BoxError),
}
