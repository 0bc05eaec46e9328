pub mod broker;
pub mod config;
pub mod error;
pub mod routing;

pub use broker::{BrokerCore, ClientId, Message, Qos};
pub use error::RoutingError;
pub use routing::{MultiSubscriptionMap, RetainedMap, SingleSubscriptionMap};
