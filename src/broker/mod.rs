//! Broker glue: a thin in-process actor exercising the routing core the way
//! a real connection layer would — terminates at `tokio::mpsc` channels,
//! never at a socket. Not a production MQTT broker.

mod manager;
mod session;
pub mod types;

pub use manager::BrokerCore;
pub use types::{ClientId, Message, Qos};
