//! Environment-driven configuration, loaded once and memoized in a
//! `OnceLock`. Scoped down to the knobs the broker glue actually needs —
//! no store/queue/stream sections.

use std::env;
use std::sync::OnceLock;

static CONFIG: OnceLock<Config> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Config {
    pub broker: BrokerConfig,
}

impl Config {
    pub fn global() -> &'static Config {
        CONFIG.get_or_init(Self::load)
    }

    fn load() -> Self {
        dotenv::dotenv().ok();
        Self { broker: BrokerConfig::load() }
    }
}

/// Knobs for the broker actor (`src/broker/manager.rs`).
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Bound on the actor's command channel.
    pub actor_channel_capacity: usize,
    pub log_level: String,
}

impl BrokerConfig {
    fn load() -> Self {
        Self {
            actor_channel_capacity: get_env("BROKER_ACTOR_CHAN_CAP", "10000"),
            log_level: get_env("LOG_LEVEL", "info"),
        }
    }
}

fn get_env<T: std::str::FromStr>(key: &str, default: &str) -> T {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Config error: {} must be valid", key))
        .unwrap()
}
