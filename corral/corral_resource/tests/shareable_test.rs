//! Integration tests for the shareable single-instance strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use corral_resource::{BoxError, CancelToken, Manager, ResourceError, Shareable};

/// Constructor yielding 1, 2, 3, ... so tests can tell epochs apart.
fn sequence_ctor(
    constructed: &Arc<AtomicUsize>,
) -> impl Fn(&CancelToken) -> Result<usize, BoxError> + Send + Sync + 'static {
    let constructed = Arc::clone(constructed);
    move |_| Ok(constructed.fetch_add(1, Ordering::SeqCst) + 1)
}

fn counting_dtor(
    destroyed: &Arc<AtomicUsize>,
) -> impl Fn(&usize) -> Result<(), BoxError> + Send + Sync + 'static {
    let destroyed = Arc::clone(destroyed);
    move |_| {
        destroyed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_acquirers_share_one_instance() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let manager = Shareable::new(sequence_ctor(&constructed), |_: &usize| Ok(()));
    let none = CancelToken::new();

    let h1 = manager.acquire(&none).unwrap();
    assert_eq!(*h1.resource(), 1);

    // Release is a no-op: the instance stays current
    h1.clone().release().unwrap();

    let h2 = manager.acquire(&none).unwrap();
    assert_eq!(h1.id(), h2.id());
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_first_acquire_constructs_once() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let ctor = {
        let constructed = Arc::clone(&constructed);
        move |_: &CancelToken| {
            // Widen the construction race window
            thread::sleep(Duration::from_millis(20));
            Ok(constructed.fetch_add(1, Ordering::SeqCst) + 1)
        }
    };
    let manager = Shareable::new(ctor, |_: &usize| Ok(()));

    let (tx, rx) = mpsc::channel();
    let mut acquirers = vec![];
    for _ in 0..4 {
        let manager = Arc::clone(&manager);
        let tx = tx.clone();
        acquirers.push(thread::spawn(move || {
            let handle = manager.acquire(&CancelToken::new()).unwrap();
            tx.send(handle.id()).unwrap();
        }));
    }
    drop(tx);

    let ids: Vec<u64> = rx.iter().collect();
    for acquirer in acquirers {
        acquirer.join().unwrap();
    }

    // Every acquirer got the same handle and only one was constructed
    assert_eq!(ids.len(), 4);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_destroy_starts_new_epoch() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let manager = Shareable::new(sequence_ctor(&constructed), |_: &usize| Ok(()));
    let none = CancelToken::new();

    let h1 = manager.acquire(&none).unwrap();
    let stale = h1.clone();
    h1.destroy().unwrap();

    // A fresh instance backs the next epoch
    let h2 = manager.acquire(&none).unwrap();
    assert_eq!(*h2.resource(), 2);
    assert_ne!(stale.id(), h2.id());

    // The old epoch's handle is no longer tracked
    assert!(matches!(stale.destroy(), Err(ResourceError::InvalidHandle)));
}

#[test]
fn test_foreign_handle_rejected() {
    let manager_a = Shareable::new(|_| Ok::<_, BoxError>(1usize), |_| Ok(()));
    let manager_b = Shareable::new(|_| Ok::<_, BoxError>(2usize), |_| Ok(()));
    let none = CancelToken::new();

    let handle_a = manager_a.acquire(&none).unwrap();
    let _handle_b = manager_b.acquire(&none).unwrap();

    assert!(matches!(
        manager_b.destroy(&handle_a),
        Err(ResourceError::InvalidHandle)
    ));
}

#[test]
fn test_close_destroys_current_instance() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let destroyed = Arc::new(AtomicUsize::new(0));
    let manager = Shareable::new(sequence_ctor(&constructed), counting_dtor(&destroyed));
    let none = CancelToken::new();

    let handle = manager.acquire(&none).unwrap();
    manager.close().unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);

    // Terminal operations are silent no-ops after close
    let survivor = handle.clone();
    handle.release().unwrap();
    survivor.destroy().unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);

    assert!(matches!(
        manager.acquire(&none),
        Err(ResourceError::ManagerClosed)
    ));
    assert!(matches!(manager.close(), Err(ResourceError::ManagerClosed)));
}

#[test]
fn test_close_without_instance() {
    let destroyed = Arc::new(AtomicUsize::new(0));
    let manager = Shareable::new(|_| Ok::<_, BoxError>(1usize), counting_dtor(&destroyed));

    manager.close().unwrap();
    assert_eq!(destroyed.load(Ordering::SeqCst), 0);
    assert!(matches!(manager.close(), Err(ResourceError::ManagerClosed)));
}

#[test]
fn test_close_propagates_destructor_error() {
    let manager = Shareable::new(
        |_| Ok::<_, BoxError>(1usize),
        |_: &usize| Err(BoxError::from("destructor exploded")),
    );
    let none = CancelToken::new();

    let _handle = manager.acquire(&none).unwrap();

    assert!(matches!(manager.close(), Err(ResourceError::Destroy(_))));

    // The manager still closed despite the error
    assert!(matches!(
        manager.acquire(&none),
        Err(ResourceError::ManagerClosed)
    ));
}
