//! Resource lifecycle managers.
//!
//! Two strategies implement the common [`Manager`] contract:
//!
//! - [`Pool`]: a bounded multi-instance pool with exclusive checkout
//! - [`Shareable`]: a single instance shared by all concurrent acquirers
//!
//! Callers pick a strategy at construction time and stay
//! strategy-agnostic afterwards by going through `Arc<dyn Manager<T>>`.

pub mod pool;
pub mod shareable;

use crate::error::{BoxError, Result};
use crate::handle::Handle;
use crate::sync::cancel::CancelToken;

// Re-export the strategies
pub use pool::Pool;
pub use shareable::Shareable;

/// Caller-supplied function for creating new instances of the managed
/// resource. Invoked synchronously, only when an instance is actually
/// needed; it must not call back into the manager that invoked it.
pub type Constructor<T> =
    Box<dyn Fn(&CancelToken) -> std::result::Result<T, BoxError> + Send + Sync>;

/// Caller-supplied function for destroying instances of the managed
/// resource. Invoked synchronously on destroy and on close; it must not
/// call back into the manager that invoked it.
pub type Destructor<T> = Box<dyn Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync>;

/// The contract both manager strategies implement.
pub trait Manager<T>: Send + Sync {
    /// Obtain a handle to a usable resource instance.
    ///
    /// May block until an instance becomes available; the wait is bounded
    /// by `token`, whose own error is returned on cancellation.
    fn acquire(&self, token: &CancelToken) -> Result<Handle<T>>;

    /// Take a healthy resource back for reuse by a later acquire.
    fn release(&self, handle: &Handle<T>) -> Result<()>;

    /// Permanently remove a defective resource and invoke the destructor.
    fn destroy(&self, handle: &Handle<T>) -> Result<()>;

    /// Destroy every instance the manager is tracking and permanently
    /// disable it. All subsequent acquires fail with
    /// [`ManagerClosed`](crate::error::ResourceError::ManagerClosed).
    fn close(&self) -> Result<()>;
}
