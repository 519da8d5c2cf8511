//! Caller-held tokens for managed resource instances.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::Result;
use crate::manager::Manager;
use crate::sync::atomic::Sequence;

/// Source of process-unique handle ids, so a handle from one manager can
/// never be mistaken for another manager's.
static HANDLE_IDS: Sequence = Sequence::new();

/// A caller-held token wrapping one resource instance plus a reference
/// back to the manager that issued it.
///
/// Client code MUST finish every checkout with exactly one of
/// [`release`](Handle::release) or [`destroy`](Handle::destroy). Clones
/// share the same underlying instance; the shareable strategy hands
/// clones of a single handle to all concurrent acquirers.
///
/// A handle does not keep its manager alive. If the manager has already
/// been dropped, terminal operations are no-ops.
pub struct Handle<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    id: u64,
    resource: T,
    manager: Weak<dyn Manager<T>>,
}

impl<T> Handle<T> {
    pub(crate) fn new(resource: T, manager: Weak<dyn Manager<T>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: HANDLE_IDS.next(),
                resource,
                manager,
            }),
        }
    }

    /// The handle's identity, unique across all managers in the process.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Access the managed resource.
    pub fn resource(&self) -> &T {
        &self.inner.resource
    }

    /// Relinquish control of a healthy resource back to the manager for
    /// reuse.
    pub fn release(self) -> Result<()> {
        match self.inner.manager.upgrade() {
            Some(manager) => manager.release(&self),
            // Manager already gone; there is nothing to return to
            None => Ok(()),
        }
    }

    /// Inform the manager the resource is defective. The manager removes
    /// it and invokes the destructor; a later acquire may construct a
    /// replacement.
    pub fn destroy(self) -> Result<()> {
        match self.inner.manager.upgrade() {
            Some(manager) => manager.destroy(&self),
            None => Ok(()),
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}
