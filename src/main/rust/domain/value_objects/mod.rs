mod backoff_policy;
mod broker_config;
mod connection_state;
mod serial_config;

pub use backoff_policy::BackoffPolicy;
pub use broker_config::BrokerConfig;
pub use connection_state::ConnectionState;
pub use serial_config::SerialConfig;
