use std::time::Duration;

use crate::domain::errors::{DomainError, Result};

/// Minimum keep-alive the MQTT client accepts
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// MQTT broker session parameters, fixed for the process lifetime.
///
/// The same topic drives both the subscription and every publish: the
/// bridge is a single-topic echo between the serial device and the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    host: String,
    port: u16,
    client_id: String,
    topic: String,
    keep_alive: Duration,
}

impl BrokerConfig {
    pub fn new(
        host: String,
        port: u16,
        client_id: String,
        topic: String,
        keep_alive: Duration,
    ) -> Result<Self> {
        if host.trim().is_empty() {
            return Err(DomainError::InvalidHost);
        }
        if port == 0 {
            return Err(DomainError::InvalidPort);
        }
        if client_id.trim().is_empty() {
            return Err(DomainError::InvalidClientId);
        }
        Self::validate_topic(&topic)?;
        if keep_alive < Duration::from_secs(MIN_KEEP_ALIVE_SECS) {
            return Err(DomainError::InvalidKeepAlive);
        }

        Ok(Self {
            host,
            port,
            client_id,
            topic,
            keep_alive,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// The topic is also the publish topic, so wildcards are not allowed
    fn validate_topic(topic: &str) -> Result<()> {
        if topic.trim().is_empty() {
            return Err(DomainError::InvalidTopic("topic cannot be empty".into()));
        }
        if topic.contains('+') || topic.contains('#') {
            return Err(DomainError::InvalidTopic(format!(
                "wildcards are not allowed in a publish topic: {}",
                topic
            )));
        }
        Ok(())
    }
}
