pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::BridgeService;
pub use config::Config;
pub use domain::entities::{SessionLifecycle, StateTransition};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{
    BrokerEvent, BrokerEventSource, BrokerPublisher, MetricsReporter, SerialReader, SerialWriter,
};
pub use domain::value_objects::{BackoffPolicy, BrokerConfig, ConnectionState, SerialConfig};
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
pub use infrastructure::mqtt::{RumqttBrokerClient, RumqttEventSource};
pub use infrastructure::serial::TokioSerialChannel;
