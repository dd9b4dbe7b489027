use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::ConnectionState;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Broker session state (0=Disconnected .. 5=Failed)
    pub static ref CONNECTION_STATE: Gauge = Gauge::new(
        "broker_connection_state",
        "Current broker session state"
    ).expect("metric can be created");

    // Serial lines published to the broker
    pub static ref MESSAGES_PUBLISHED: IntCounter = IntCounter::new(
        "messages_published_total",
        "Serial lines published to the broker"
    ).expect("metric can be created");

    // Broker payloads written to the serial device
    pub static ref MESSAGES_WRITTEN: IntCounter = IntCounter::new(
        "messages_written_total",
        "Broker payloads written to the serial device"
    ).expect("metric can be created");

    // Total reconnection attempts
    pub static ref RECONNECT_ATTEMPTS: IntCounter = IntCounter::new(
        "reconnect_attempts_total",
        "Total number of broker reconnection attempts"
    ).expect("metric can be created");

    // Current backoff delay in seconds
    pub static ref BACKOFF_SECONDS: Gauge = Gauge::new(
        "reconnect_backoff_seconds",
        "Current reconnection backoff delay"
    ).expect("metric can be created");

    // Bridge uptime
    pub static ref UPTIME_SECONDS: Gauge = Gauge::new(
        "bridge_uptime_seconds",
        "Time since the broker session first became operational"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(CONNECTION_STATE.clone()))?;
        REGISTRY.register(Box::new(MESSAGES_PUBLISHED.clone()))?;
        REGISTRY.register(Box::new(MESSAGES_WRITTEN.clone()))?;
        REGISTRY.register(Box::new(RECONNECT_ATTEMPTS.clone()))?;
        REGISTRY.register(Box::new(BACKOFF_SECONDS.clone()))?;
        REGISTRY.register(Box::new(UPTIME_SECONDS.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_state_change(&self, state: &ConnectionState) {
        CONNECTION_STATE.set(state.as_metric());
    }

    fn report_reconnect_attempt(&self) {
        RECONNECT_ATTEMPTS.inc();
    }

    fn report_backoff(&self, delay_secs: f64) {
        BACKOFF_SECONDS.set(delay_secs);
    }

    fn report_published(&self) {
        MESSAGES_PUBLISHED.inc();
    }

    fn report_written(&self) {
        MESSAGES_WRITTEN.inc();
    }

    fn report_uptime(&self, uptime_secs: f64) {
        UPTIME_SECONDS.set(uptime_secs);
    }
}
