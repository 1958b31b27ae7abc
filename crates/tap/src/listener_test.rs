//! Tests for live listener management

use super::*;

fn loc(text: &str) -> Location {
    Location::new(text)
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_unique_ids() {
    let set = ListenerSet::default();

    let (id1, _rx1) = set.register().unwrap();
    let (id2, _rx2) = set.register().unwrap();

    assert!(id1 > 0);
    assert_ne!(id1, id2);
    assert_eq!(set.count(), 2);
}

#[tokio::test]
async fn test_deregister_removes_listener() {
    let set = ListenerSet::default();
    let (id, _rx) = set.register().unwrap();

    set.deregister(id).unwrap();
    assert!(set.is_empty());
}

#[tokio::test]
async fn test_deregister_not_found() {
    let set = ListenerSet::default();
    assert!(matches!(
        set.deregister(999_999),
        Err(TapError::ListenerNotFound { id: 999_999 })
    ));
}

#[tokio::test]
async fn test_register_respects_cap() {
    let set = ListenerSet::new(2, 8);
    let _a = set.register().unwrap();
    let _b = set.register().unwrap();

    assert!(matches!(
        set.register(),
        Err(TapError::MaxListeners { max: 2 })
    ));
}

// ============================================================================
// Broadcast
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_every_listener() {
    let set = ListenerSet::default();
    let (_, mut rx1) = set.register().unwrap();
    let (_, mut rx2) = set.register().unwrap();

    let report = set.broadcast(&loc("12.97,77.64"));

    assert_eq!(report.sent, 2);
    assert_eq!(rx1.recv().await.unwrap().as_str(), "12.97,77.64");
    assert_eq!(rx2.recv().await.unwrap().as_str(), "12.97,77.64");
}

#[tokio::test]
async fn test_slow_listener_does_not_block_others() {
    let set = ListenerSet::new(10, 1);
    let (_, _slow) = set.register().unwrap();
    let (_, mut fast) = set.register().unwrap();

    set.broadcast(&loc("1,1"));
    assert_eq!(fast.recv().await.unwrap().as_str(), "1,1");

    // Slow listener still holds "1,1", so this one is dropped for it only
    let report = set.broadcast(&loc("2,2"));
    assert_eq!(report.sent, 1);
    assert_eq!(report.full, 1);
    assert_eq!(fast.recv().await.unwrap().as_str(), "2,2");
}

#[tokio::test]
async fn test_broadcast_counts_closed_listeners() {
    let set = ListenerSet::default();
    let (_, rx) = set.register().unwrap();
    drop(rx);

    let report = set.broadcast(&loc("1,1"));
    assert_eq!(report.closed, 1);
    assert_eq!(report.sent, 0);
    assert_eq!(report.offered(), 1);
}

#[tokio::test]
async fn test_cleanup_disconnected() {
    let set = ListenerSet::default();
    let (_, rx1) = set.register().unwrap();
    let (_, _rx2) = set.register().unwrap();
    drop(rx1);

    assert_eq!(set.cleanup_disconnected(), 1);
    assert_eq!(set.count(), 1);
}

#[tokio::test]
async fn test_listener_dropped_counter() {
    let (tx, _rx) = mpsc::channel(1);
    let listener = Listener::new(tx);

    assert_eq!(listener.try_send(loc("1,1")), Delivery::Sent);
    assert_eq!(listener.try_send(loc("2,2")), Delivery::Full);
    assert_eq!(listener.dropped(), 1);
    assert!(listener.is_connected());
}
