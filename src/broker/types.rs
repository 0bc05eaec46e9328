//! Shared broker-glue types: client identity, QoS, and the message shape
//! delivered from a publish to its matching subscribers.

use bytes::Bytes;

/// QoS level. Ordered so that coalescing (max across subscribers, min of
/// subscriber/publisher at delivery) is a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Qos {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// Identifies a connected session. Minted with `Uuid::new_v4()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(pub uuid::Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

/// A message as delivered to a subscriber: already coalesced to its final
/// delivery QoS.
#[derive(Debug, Clone)]
pub struct Message {
    pub topic: String,
    pub payload: Bytes,
    pub qos: Qos,
}
