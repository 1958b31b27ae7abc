//! Tests for topic consumers

use std::sync::Arc;
use std::time::Duration;

use fleet_config::{BrokerConfig, StartOffset};
use fleet_protocol::Location;

use crate::{BrokerError, MemoryBroker, TopicName, TopicPublisher};

fn topic() -> TopicName {
    TopicName::new("fleet-location")
}

fn earliest_broker(retention: usize) -> Arc<MemoryBroker> {
    Arc::new(MemoryBroker::new(&BrokerConfig {
        retention,
        start: StartOffset::Earliest,
        ..BrokerConfig::default()
    }))
}

#[tokio::test]
async fn test_next_waits_for_publish() {
    let broker = earliest_broker(100);
    let mut consumer = broker.subscribe(&topic(), "g");

    let publisher = {
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            broker.publish(&topic(), Location::new("1,2")).await.unwrap();
        })
    };

    let update = tokio::time::timeout(Duration::from_secs(2), consumer.next())
        .await
        .expect("consumer should be woken by publish")
        .unwrap();

    assert_eq!(update.offset, 0);
    assert_eq!(update.location.as_str(), "1,2");
    publisher.await.unwrap();
}

#[tokio::test]
async fn test_every_group_sees_every_record_in_order() {
    let broker = earliest_broker(100);
    let mut a = broker.subscribe(&topic(), "dashboards");
    let mut b = broker.subscribe(&topic(), "audit");

    for i in 0..10 {
        broker
            .publish(&topic(), Location::new(format!("{},0", i)))
            .await
            .unwrap();
    }

    for expected in 0..10u64 {
        assert_eq!(a.next().await.unwrap().offset, expected);
        assert_eq!(b.next().await.unwrap().offset, expected);
    }
}

#[tokio::test]
async fn test_lag_tracks_unread_records() {
    let broker = earliest_broker(100);
    let mut consumer = broker.subscribe(&topic(), "g");
    assert_eq!(consumer.lag(), 0);

    broker.publish(&topic(), Location::new("1,1")).await.unwrap();
    broker.publish(&topic(), Location::new("2,2")).await.unwrap();
    assert_eq!(consumer.lag(), 2);

    consumer.next().await.unwrap();
    assert_eq!(consumer.lag(), 1);
}

#[tokio::test]
async fn test_consumer_behind_retention_skips_forward() {
    let broker = earliest_broker(2);
    let mut consumer = broker.subscribe(&topic(), "slow");

    for i in 0..5 {
        broker
            .publish(&topic(), Location::new(format!("{},0", i)))
            .await
            .unwrap();
    }

    // Offsets 0..=2 were evicted
    assert_eq!(consumer.next().await.unwrap().offset, 3);
    assert_eq!(consumer.next().await.unwrap().offset, 4);
}

#[tokio::test]
async fn test_commit_is_monotonic() {
    let broker = earliest_broker(100);
    for i in 0..3 {
        broker
            .publish(&topic(), Location::new(format!("{},0", i)))
            .await
            .unwrap();
    }

    let mut consumer = broker.subscribe(&topic(), "g");
    let first = consumer.next().await.unwrap();
    let second = consumer.next().await.unwrap();

    consumer.commit(&second);
    consumer.commit(&first);

    assert_eq!(broker.committed_offset(&topic(), "g"), Some(2));
}

#[tokio::test]
async fn test_next_is_cancel_safe() {
    let broker = earliest_broker(100);
    let mut consumer = broker.subscribe(&topic(), "g");

    // Time out a pending read, then publish and read again
    let timed_out = tokio::time::timeout(Duration::from_millis(10), consumer.next()).await;
    assert!(timed_out.is_err());

    broker.publish(&topic(), Location::new("1,1")).await.unwrap();
    assert_eq!(consumer.next().await.unwrap().offset, 0);
}

#[test]
fn test_accessors() {
    let broker = earliest_broker(100);
    let consumer = broker.subscribe(&topic(), "user-group");
    assert_eq!(consumer.topic().as_str(), "fleet-location");
    assert_eq!(consumer.group(), "user-group");
    assert_eq!(consumer.position(), 0);
}

#[tokio::test]
async fn test_closed_topic_drains_then_reports_closed() {
    let broker = earliest_broker(100);
    let mut consumer = broker.subscribe(&topic(), "g");
    broker.publish(&topic(), Location::new("1,1")).await.unwrap();
    broker.publish(&topic(), Location::new("2,2")).await.unwrap();

    broker.close_topic(&topic());

    assert_eq!(consumer.next().await.unwrap().offset, 0);
    assert_eq!(consumer.next().await.unwrap().offset, 1);
    assert!(matches!(consumer.next().await, Err(BrokerError::Closed(_))));
}

#[tokio::test]
async fn test_close_wakes_waiting_consumer() {
    let broker = earliest_broker(100);
    let mut consumer = broker.subscribe(&topic(), "g");

    let closer = {
        let broker = Arc::clone(&broker);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            broker.close_topic(&topic());
        })
    };

    let result = tokio::time::timeout(Duration::from_secs(2), consumer.next())
        .await
        .expect("close should wake the consumer");
    assert!(matches!(result, Err(BrokerError::Closed(_))));
    closer.await.unwrap();
}
