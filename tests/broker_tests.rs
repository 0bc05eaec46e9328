use bytes::Bytes;
use tokio::sync::mpsc;
use topicroute::Qos;

mod helpers;
use helpers::setup_broker;

#[tokio::test]
async fn basic_pub_sub() {
    let broker = setup_broker();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;

    broker.subscribe(client, "sensors/temp", Qos::AtMostOnce).await;
    let sent = broker.publish("sensors/temp", Bytes::from("24.5"), Qos::AtMostOnce, false).await;
    assert_eq!(sent, 1);

    let msg = rx.recv().await.expect("should receive message");
    assert_eq!(msg.topic, "sensors/temp");
    assert_eq!(msg.payload, Bytes::from("24.5"));
}

#[tokio::test]
async fn wildcard_plus_single_level() {
    let broker = setup_broker();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;
    broker.subscribe(client, "home/+/status", Qos::AtMostOnce).await;

    broker.publish("home/kitchen/status", Bytes::from("on"), Qos::AtMostOnce, false).await;
    let msg = rx.recv().await.expect("should match + wildcard");
    assert_eq!(msg.topic, "home/kitchen/status");

    let sent = broker.publish("home/kitchen/fridge/status", Bytes::from("off"), Qos::AtMostOnce, false).await;
    assert_eq!(sent, 0, "too deep for a single-level wildcard");

    let sent = broker.publish("home/status", Bytes::from("err"), Qos::AtMostOnce, false).await;
    assert_eq!(sent, 0, "too shallow");
}

#[tokio::test]
async fn wildcard_hash_multi_level() {
    let broker = setup_broker();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;
    broker.subscribe(client, "logs/#", Qos::AtMostOnce).await;

    broker.publish("logs/error", Bytes::from("e1"), Qos::AtMostOnce, false).await;
    assert_eq!(rx.recv().await.unwrap().topic, "logs/error");

    broker.publish("logs/app/backend/error", Bytes::from("e2"), Qos::AtMostOnce, false).await;
    assert_eq!(rx.recv().await.unwrap().topic, "logs/app/backend/error");
}

#[tokio::test]
async fn retained_replay_on_subscribe() {
    let broker = setup_broker();

    broker.publish("config/settings", Bytes::from("dark_mode"), Qos::AtMostOnce, true).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;
    broker.subscribe(client, "config/settings", Qos::AtMostOnce).await;

    let msg = rx.recv().await.expect("should receive retained message");
    assert_eq!(msg.payload, Bytes::from("dark_mode"));
}

#[tokio::test]
async fn empty_payload_clears_retained() {
    let broker = setup_broker();
    broker.publish("config/theme", Bytes::from("dark"), Qos::AtMostOnce, true).await;
    broker.publish("config/theme", Bytes::new(), Qos::AtMostOnce, true).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;
    broker.subscribe(client, "config/theme", Qos::AtMostOnce).await;

    let result = tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "retained value should have been cleared");
}

#[tokio::test]
async fn disconnect_unsubscribes_every_filter() {
    let broker = setup_broker();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;
    broker.subscribe(client.clone(), "chat/room1", Qos::AtMostOnce).await;

    let sent = broker.publish("chat/room1", Bytes::from("hi"), Qos::AtMostOnce, false).await;
    assert_eq!(sent, 1);

    broker.disconnect(client).await;
    let sent = broker.publish("chat/room1", Bytes::from("anyone?"), Qos::AtMostOnce, false).await;
    assert_eq!(sent, 0);

    drop(rx);
}

#[tokio::test]
async fn overlapping_filters_deliver_once_at_max_qos() {
    let broker = setup_broker();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;

    broker.subscribe(client.clone(), "sensors/+/temp", Qos::AtMostOnce).await;
    broker.subscribe(client, "sensors/kitchen/+", Qos::ExactlyOnce).await;

    let sent = broker.publish("sensors/kitchen/temp", Bytes::from("data"), Qos::ExactlyOnce, false).await;
    assert_eq!(sent, 1, "same client reached via two filters still counts once");

    let msg = rx.recv().await.expect("should receive message");
    assert_eq!(msg.qos, Qos::ExactlyOnce, "coalesced to the higher of the two subscriptions");

    let result = tokio::time::timeout(std::time::Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "should not receive a second delivery for the overlapping match");
}

#[tokio::test]
async fn fanout_to_every_subscriber() {
    let broker = setup_broker();
    let mut receivers = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = broker.connect(tx).await;
        broker.subscribe(client, "broadcast/news", Qos::AtMostOnce).await;
        receivers.push(rx);
    }

    let sent = broker.publish("broadcast/news", Bytes::from("breaking"), Qos::AtMostOnce, false).await;
    assert_eq!(sent, 3);

    for mut rx in receivers {
        let msg = rx.recv().await.expect("should receive message");
        assert_eq!(msg.payload, Bytes::from("breaking"));
    }
}
