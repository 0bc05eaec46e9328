use topicroute::config::BrokerConfig;
use topicroute::BrokerCore;

/// Spins up a `BrokerCore` with a small test-sized channel capacity.
pub fn setup_broker() -> BrokerCore {
    let config = BrokerConfig { actor_channel_capacity: 1024, log_level: "info".to_string() };
    BrokerCore::spawn(&config)
}
