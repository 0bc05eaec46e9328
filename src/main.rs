use bytes::Bytes;
use tokio::sync::mpsc;
use topicroute::{BrokerCore, Qos};
use tracing_subscriber::EnvFilter;

/// Demonstration entry point: wires a `BrokerCore` and drives it through a
/// subscribe/publish/retained-replay cycle. Not a network-facing broker.
#[tokio::main]
async fn main() {
    let config = topicroute::config::Config::global();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.broker.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let broker = BrokerCore::spawn(&config.broker);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let client = broker.connect(tx).await;
    broker.subscribe(client.clone(), "sensors/+/temperature", Qos::AtLeastOnce).await;

    broker
        .publish("sensors/kitchen/temperature", Bytes::from_static(b"21.5"), Qos::AtMostOnce, true)
        .await;

    if let Some(msg) = rx.recv().await {
        tracing::info!(topic = %msg.topic, payload = ?msg.payload, "received");
    }

    broker.disconnect(client).await;
}
