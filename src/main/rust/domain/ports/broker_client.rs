use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::Result;

/// Event surfaced by the broker session.
///
/// The underlying client library drives its callbacks from a network event
/// loop; this port turns that callback dispatch into an explicit stream of
/// events consumed by a dedicated task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// CONNACK received; emitted once per successful (re)connection
    Connected { session_present: bool },
    /// An inbound message on a subscribed topic
    Message { topic: String, payload: Bytes },
}

/// Port for outbound broker operations (publish/subscribe)
#[async_trait]
pub trait BrokerPublisher: Send + Sync {
    /// Publish a payload to the configured topic, QoS 0, fire-and-forget
    async fn publish(&self, payload: &str) -> Result<()>;

    /// Subscribe to the configured topic. Called after every `Connected`
    /// event so the subscription survives reconnects.
    async fn subscribe(&self) -> Result<()>;

    /// Cleanly end the session. Safe to call more than once.
    async fn disconnect(&self) -> Result<()>;
}

/// Port for the inbound broker event stream
#[async_trait]
pub trait BrokerEventSource: Send {
    /// Wait for the next session event. Connection loss surfaces as
    /// `DomainError::ConnectionLost`; polling again retries the connection.
    async fn next_event(&mut self) -> Result<BrokerEvent>;
}
