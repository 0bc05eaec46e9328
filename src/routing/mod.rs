//! Topic routing core: path tokenization, the Subscription Map, and the
//! Retained Map. Pure, synchronous, and independent of the broker glue in
//! `crate::broker`.

pub mod path;
pub mod retained;
pub mod subscription;

pub use path::tokenize;
pub use retained::RetainedMap;
pub use subscription::{MultiSubscriptionMap, SingleSubscriptionMap};
