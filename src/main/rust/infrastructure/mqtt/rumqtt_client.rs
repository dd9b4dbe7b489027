use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{BrokerEvent, BrokerEventSource, BrokerPublisher};
use crate::domain::value_objects::BrokerConfig;

/// Request queue capacity for the rumqttc client handle
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// MQTT broker adapter backed by rumqttc.
///
/// `connect` only prepares the session; the network connection is driven by
/// polling the returned event source, which also performs the transport-level
/// reconnects after a failure.
pub struct RumqttBrokerClient {
    client: AsyncClient,
    topic: String,
}

impl RumqttBrokerClient {
    pub fn connect(config: &BrokerConfig) -> (RumqttBrokerClient, RumqttEventSource) {
        let mut options = MqttOptions::new(config.client_id(), config.host(), config.port());
        options.set_keep_alive(config.keep_alive());

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        let publisher = Self {
            client,
            topic: config.topic().to_string(),
        };
        let events = RumqttEventSource { event_loop };

        (publisher, events)
    }
}

#[async_trait]
impl BrokerPublisher for RumqttBrokerClient {
    async fn publish(&self, payload: &str) -> Result<()> {
        self.client
            .publish(&self.topic, QoS::AtMostOnce, false, payload.as_bytes())
            .await
            .map_err(|e| DomainError::PublishFailed(e.to_string()))
    }

    async fn subscribe(&self) -> Result<()> {
        self.client
            .subscribe(&self.topic, QoS::AtMostOnce)
            .await
            .map_err(|e| DomainError::SubscribeFailed(e.to_string()))
    }

    async fn disconnect(&self) -> Result<()> {
        // An error here means the event loop is already gone; the session
        // is over in either case. Repeated calls are a no-op.
        let _ = self.client.disconnect().await;
        Ok(())
    }
}

pub struct RumqttEventSource {
    event_loop: EventLoop,
}

#[async_trait]
impl BrokerEventSource for RumqttEventSource {
    async fn next_event(&mut self) -> Result<BrokerEvent> {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(DomainError::ConnectionLost(format!(
                            "broker rejected connection: {:?}",
                            ack.code
                        )));
                    }
                    return Ok(BrokerEvent::Connected {
                        session_present: ack.session_present,
                    });
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Ok(BrokerEvent::Message {
                        topic: publish.topic,
                        payload: publish.payload,
                    });
                }
                // Pings, acks and outgoing packets are protocol plumbing
                Ok(_) => continue,
                Err(e) => return Err(DomainError::ConnectionLost(e.to_string())),
            }
        }
    }
}
