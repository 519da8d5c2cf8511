//! Synchronization primitives backing the resource managers.
//!
//! This module provides the small lock-free pieces the managers are built
//! on:
//!
//! - One-shot flags and id sequences for lifecycle bookkeeping
//! - Cancellation tokens for blocking acquisition

pub mod atomic;
pub mod cancel;

// Re-export key types from atomic
pub use atomic::{OnceFlag, Sequence};

// Re-export key types from cancel
pub use cancel::{CancelError, CancelToken};
