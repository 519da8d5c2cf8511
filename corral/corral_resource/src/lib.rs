#![deny(warnings)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Corral Resource
//!
//! Lifecycle management for expensive, reusable resources such as
//! connections, file descriptors, or workers.
//!
//! A [`Manager`] creates instances on demand through a caller-supplied
//! constructor, hands them out wrapped in a [`Handle`], takes healthy
//! instances back for reuse, and destroys defective ones through a
//! caller-supplied destructor. Two strategies implement the contract:
//!
//! - [`Pool`]: up to a fixed number of concurrently live instances with
//!   exclusive checkout; acquisition blocks once the pool is at capacity
//! - [`Shareable`]: exactly one instance, handed to every concurrent
//!   acquirer as the same handle
//!
//! Client code must finish every checkout with exactly one of
//! [`Handle::release`] (the resource is healthy and may be reused) or
//! [`Handle::destroy`] (the resource is defective and must be torn down).
//!
//! ```
//! use corral_resource::{CancelToken, Manager, Pool};
//!
//! let pool = Pool::new(
//!     |_token| Ok(String::from("connection")),
//!     |_conn| Ok(()),
//!     2,
//! );
//!
//! let handle = pool.acquire(&CancelToken::new())?;
//! assert_eq!(handle.resource(), "connection");
//! handle.release()?;
//! # Ok::<(), corral_resource::ResourceError>(())
//! ```

/// Error types for manager and handle operations
pub mod error;

/// Caller-held tokens for managed resource instances
pub mod handle;

/// Manager strategies and their common contract
pub mod manager;

/// Synchronization primitives backing the managers
pub mod sync;

// Re-export the key types for easier access
pub use error::{BoxError, ResourceError, Result};
pub use handle::Handle;
pub use manager::{Constructor, Destructor, Manager, Pool, Shareable};
pub use sync::cancel::{CancelError, CancelToken};
