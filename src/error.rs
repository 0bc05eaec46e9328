//! Routing errors: the only failure modes the core exposes.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Single-value subscription insert on a filter that already holds a value.
    DuplicateSubscription(String),
    /// `+`/`#` present in a concrete (retained) topic.
    WildcardInRetainedTopic(String),
    /// `#` not in terminal position, or `+`/`#` embedded in a longer segment.
    MalformedFilter(String),
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::DuplicateSubscription(filter) => {
                write!(f, "subscription already exists for filter: {filter}")
            }
            RoutingError::WildcardInRetainedTopic(topic) => {
                write!(f, "wildcard not allowed in retained topic: {topic}")
            }
            RoutingError::MalformedFilter(filter) => {
                write!(f, "malformed filter: {filter}")
            }
        }
    }
}

impl std::error::Error for RoutingError {}
