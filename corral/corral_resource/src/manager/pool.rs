//! Bounded multi-instance manager strategy.
//!
//! Manages up to a fixed number of concurrently live instances,
//! constructing lazily and blocking acquisition at capacity until an
//! instance is released, destroyed, or the caller's token fires.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, info, trace, warn};
use parking_lot::{Condvar, Mutex};

use crate::error::{BoxError, ResourceError, Result};
use crate::handle::Handle;
use crate::manager::{Constructor, Destructor, Manager};
use crate::sync::atomic::OnceFlag;
use crate::sync::cancel::CancelToken;

/// Longest stretch a blocked acquire sleeps between re-checks of its
/// cancellation token.
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// A manager capping the number of simultaneously live instances.
///
/// Instances are constructed on demand up to the capacity and checked
/// out exclusively: each handle belongs to exactly one caller until it
/// is released or destroyed. At capacity, acquisition blocks until
/// another caller releases an instance for reuse, destroys one (freeing
/// headroom to construct a replacement), or the pool closes.
pub struct Pool<T> {
    construct: Constructor<T>,
    destruct: Destructor<T>,
    capacity: usize,

    state: Mutex<State<T>>,

    /// Signaled on release, on destroy (capacity headroom), and on close.
    signal: Condvar,

    closed: OnceFlag,

    /// Back-reference handed to issued handles.
    self_ref: Weak<Pool<T>>,
}

struct State<T> {
    /// Instances ready for reuse; always a subset of `live`.
    available: VecDeque<Handle<T>>,

    /// Every constructed instance, available or checked out, by handle id.
    live: HashMap<u64, Handle<T>>,
}

impl<T: Send + Sync + 'static> Pool<T> {
    /// Create a manager for a multi-instance resource. The pool constructs
    /// new instances as necessary up to `capacity`.
    pub fn new<C, D>(construct: C, destruct: D, capacity: usize) -> Arc<Self>
    where
        C: Fn(&CancelToken) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
        D: Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        info!("Creating resource pool with capacity {}", capacity);

        Arc::new_cyclic(|self_ref| Self {
            construct: Box::new(construct),
            destruct: Box::new(destruct),
            capacity,
            state: Mutex::new(State {
                available: VecDeque::with_capacity(capacity),
                live: HashMap::with_capacity(capacity),
            }),
            signal: Condvar::new(),
            closed: OnceFlag::new(),
            self_ref: self_ref.clone(),
        })
    }

    /// Create a manager for a resource of which there should only ever be
    /// one instance at a time.
    ///
    /// Checkout is still exclusive: concurrent acquirers take turns. For
    /// an instance shared by all acquirers at once, see
    /// [`Shareable`](crate::manager::Shareable).
    pub fn singleton<C, D>(construct: C, destruct: D) -> Arc<Self>
    where
        C: Fn(&CancelToken) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
        D: Fn(&T) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::new(construct, destruct, 1)
    }

    /// The maximum number of simultaneously live instances.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn new_handle(&self, token: &CancelToken, state: &mut State<T>) -> Result<Handle<T>> {
        let resource = (self.construct)(token).map_err(ResourceError::Construct)?;
        let manager: Weak<dyn Manager<T>> = self.self_ref.clone();
        let handle = Handle::new(resource, manager);

        debug!("Constructed pool instance (handle {})", handle.id());
        state.live.insert(handle.id(), handle.clone());
        Ok(handle)
    }
}

impl<T: Send + Sync + 'static> Manager<T> for Pool<T> {
    fn acquire(&self, token: &CancelToken) -> Result<Handle<T>> {
        if self.closed.is_set() {
            return Err(ResourceError::ManagerClosed);
        }

        let mut state = self.state.lock();
        loop {
            // Re-checked every wakeup: close flips the flag and notifies
            // all waiters under this same lock
            if self.closed.is_set() {
                return Err(ResourceError::ManagerClosed);
            }
            token.check()?;

            if let Some(handle) = state.available.pop_front() {
                trace!("Reusing pooled instance (handle {})", handle.id());
                return Ok(handle);
            }

            if state.live.len() < self.capacity {
                return self.new_handle(token, &mut state);
            }

            // At capacity with nothing available: wait in bounded slices
            // so the token stays observable even without a wakeup
            let slice = match token.remaining() {
                Some(left) => left.min(WAIT_SLICE),
                None => WAIT_SLICE,
            };
            let _ = self.signal.wait_for(&mut state, slice);
        }
    }

    fn release(&self, handle: &Handle<T>) -> Result<()> {
        let mut state = self.state.lock();
        if self.closed.is_set() {
            // All instances were already torn down by close
            return Ok(());
        }

        if !state.live.contains_key(&handle.id()) {
            return Err(ResourceError::InvalidHandle);
        }
        if state.available.iter().any(|queued| queued.id() == handle.id()) {
            // Double release; the instance is already queued
            return Ok(());
        }

        trace!("Returned instance to pool (handle {})", handle.id());
        state.available.push_back(handle.clone());
        self.signal.notify_one();
        Ok(())
    }

    fn destroy(&self, handle: &Handle<T>) -> Result<()> {
        let removed = {
            let mut state = self.state.lock();
            if self.closed.is_set() {
                // All instances were already torn down by close
                return Ok(());
            }

            let removed = match state.live.remove(&handle.id()) {
                Some(removed) => removed,
                None => return Err(ResourceError::InvalidHandle),
            };
            state.available.retain(|queued| queued.id() != handle.id());

            // Capacity headroom: a blocked acquire may now construct a
            // replacement instead of waiting for a release that will
            // never come
            self.signal.notify_one();
            removed
        };

        debug!("Destroying pool instance (handle {})", removed.id());
        (self.destruct)(removed.resource()).map_err(ResourceError::Destroy)
    }

    fn close(&self) -> Result<()> {
        let doomed: Vec<Handle<T>> = {
            let mut state = self.state.lock();
            if self.closed.is_set() {
                // Already closed
                return Err(ResourceError::ManagerClosed);
            }

            // Prevent new acquires, then wake every blocked one so it
            // observes the flag
            self.closed.set();
            state.available.clear();
            let doomed = state.live.drain().map(|(_, handle)| handle).collect();
            self.signal.notify_all();
            doomed
        };

        info!(
            "Closing resource pool, destroying {} live instance(s)",
            doomed.len()
        );
        for handle in doomed {
            // Best effort: one failing destructor must not abort teardown
            // of the rest
            if let Err(err) = (self.destruct)(handle.resource()) {
                warn!(
                    "Destructor failed while closing pool (handle {}): {}",
                    handle.id(),
                    err
                );
            }
        }
        Ok(())
    }
}
