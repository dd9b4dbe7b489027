mod broker_client;
mod metrics_reporter;
mod serial_channel;

pub use broker_client::{BrokerEvent, BrokerEventSource, BrokerPublisher};
pub use metrics_reporter::MetricsReporter;
pub use serial_channel::{SerialReader, SerialWriter};
