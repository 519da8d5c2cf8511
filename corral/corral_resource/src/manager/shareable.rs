//! Shared single-instance manager strategy.
//!
//! Manages exactly one instance, handed out to any number of concurrent
//! acquirers as the same handle. Destroying the instance starts a new
//! epoch: the next acquire constructs a fresh one.

use std::sync::{Arc, Weak};

use log::{debug, info};
use parking_lot::Mutex;

use crate::error::{BoxError, ResourceError, Result};
use crate::handle::Handle;
use crate::manager::{Constructor, Destructor, Manager};
use crate::sync::atomic::OnceFlag;
use crate::sync::cancel::CancelToken;

/// A manager whose single instance is shared by every acquirer.
///
/// Acquisition never blocks: every caller receives a clone of the same
/// handle while the current instance lives. Release is a no-op, since a
/// shared resource has no concept of checkout and return.
pub struct Shareable<T> {
    construct: Constructor<T>,
    destruct: Destructor<T>,

    /// The current epoch's instance, if one has been constructed.
    current: Mutex<Option<Handle<T>>>,

    closed: OnceFlag,

    /// Back-reference handed to issued handles.
    self_ref: Weak<Shareable<T>>,
}

impl<T: Send + Sync + 'static> Shareable<T> {
    /// Create a manager for a resource of which there is one instance,
    /// concurrently shared by all acquirers.
    pub fn new<C, D>(construct: C, destruct: D) -> Arc<Self>
    where
        C: Fn(&CancelToken) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
        D: Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        info!("Creating shareable resource manager");

        Arc::new_cyclic(|self_ref| Self {
            construct: Box::new(construct),
            destruct: Box::new(destruct),
            current: Mutex::new(None),
            closed: OnceFlag::new(),
            self_ref: self_ref.clone(),
        })
    }
}

impl<T: Send + Sync + 'static> Manager<T> for Shareable<T> {
    fn acquire(&self, token: &CancelToken) -> Result<Handle<T>> {
        // The lock serializes racing first acquirers: at most one
        // instance is ever constructed per epoch
        let mut current = self.current.lock();
        if self.closed.is_set() {
            return Err(ResourceError::ManagerClosed);
        }

        if let Some(handle) = current.as_ref() {
            return Ok(handle.clone());
        }

        token.check()?;
        let resource = (self.construct)(token).map_err(ResourceError::Construct)?;
        let manager: Weak<dyn Manager<T>> = self.self_ref.clone();
        let handle = Handle::new(resource, manager);

        debug!("Constructed shared instance (handle {})", handle.id());
        *current = Some(handle.clone());
        Ok(handle)
    }

    fn release(&self, _handle: &Handle<T>) -> Result<()> {
        // Shared resources have no checkout to return
        Ok(())
    }

    fn destroy(&self, handle: &Handle<T>) -> Result<()> {
        let removed = {
            let mut current = self.current.lock();
            if self.closed.is_set() {
                // The instance was already torn down by close
                return Ok(());
            }

            match current.take() {
                Some(held) if held.id() == handle.id() => held,
                other => {
                    // Not the current instance: stale epoch or foreign
                    // manager. Put back whatever was there.
                    *current = other;
                    return Err(ResourceError::InvalidHandle);
                }
            }
        };

        debug!("Destroying shared instance (handle {})", removed.id());
        (self.destruct)(removed.resource()).map_err(ResourceError::Destroy)
    }

    fn close(&self) -> Result<()> {
        let removed = {
            let mut current = self.current.lock();
            if self.closed.is_set() {
                // Already closed
                return Err(ResourceError::ManagerClosed);
            }
            self.closed.set();
            current.take()
        };

        info!("Closing shareable resource manager");
        match removed {
            Some(handle) => {
                debug!("Destroying shared instance (handle {})", handle.id());
                (self.destruct)(handle.resource()).map_err(ResourceError::Destroy)
            }
            None => Ok(()),
        }
    }
}
