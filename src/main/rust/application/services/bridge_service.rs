use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::domain::entities::SessionLifecycle;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{
    BrokerEvent, BrokerEventSource, BrokerPublisher, MetricsReporter, SerialReader, SerialWriter,
};
use crate::domain::value_objects::BackoffPolicy;

/// Application service orchestrating the serial/MQTT bridge.
///
/// Two loops run concurrently: the outbound pump (serial lines published to
/// the broker) on the caller's task, and the inbound dispatch (broker
/// messages written to the serial device) on a spawned task. Each loop owns
/// its half of the serial channel, so no lock guards the device handle.
pub struct BridgeService {
    reader: Box<dyn SerialReader>,
    writer: Box<dyn SerialWriter>,
    publisher: Arc<dyn BrokerPublisher>,
    events: Box<dyn BrokerEventSource>,
    backoff_policy: BackoffPolicy,
    max_reconnect_attempts: Option<u32>,
    metrics: Arc<dyn MetricsReporter>,
}

impl BridgeService {
    pub fn new(
        reader: Box<dyn SerialReader>,
        writer: Box<dyn SerialWriter>,
        publisher: Arc<dyn BrokerPublisher>,
        events: Box<dyn BrokerEventSource>,
        backoff_policy: BackoffPolicy,
        max_reconnect_attempts: Option<u32>,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Self {
        Self {
            reader,
            writer,
            publisher,
            events,
            backoff_policy,
            max_reconnect_attempts,
            metrics,
        }
    }

    /// Run both directions of the bridge until the shutdown signal flips,
    /// the serial device closes, or reconnection attempts are exhausted.
    /// Returns the first fatal error, if any.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let Self {
            reader,
            writer,
            publisher,
            events,
            backoff_policy,
            max_reconnect_attempts,
            metrics,
        } = self;

        // Internal stop signal observed by both loops. The external
        // interrupt is forwarded into it; a fatal broker error also flips
        // it so the outbound pump stops as well.
        let (stop_tx, stop_rx) = watch::channel(false);

        let mut external = shutdown;
        let forward_stop = stop_tx.clone();
        let forwarder = tokio::spawn(async move {
            let _ = external.changed().await;
            let _ = forward_stop.send(true);
        });

        let dispatch = InboundDispatch {
            events,
            writer,
            publisher: publisher.clone(),
            lifecycle: SessionLifecycle::new(),
            backoff_policy,
            max_reconnect_attempts,
            metrics: metrics.clone(),
        };

        let dispatch_stop = stop_tx.clone();
        let dispatch_rx = stop_rx.clone();
        let inbound = tokio::spawn(async move {
            let result = dispatch.run(dispatch_rx).await;
            if result.is_err() {
                let _ = dispatch_stop.send(true);
            }
            result
        });

        let outbound_result = Self::pump_outbound(reader, publisher.clone(), metrics, stop_rx).await;

        // No attempt is made to drain in-flight messages; end the session
        // and stop the dispatch task.
        let _ = publisher.disconnect().await;
        forwarder.abort();
        inbound.abort();
        let inbound_result = match inbound.await {
            Ok(result) => result,
            Err(_) => Ok(()), // Task aborted at shutdown
        };

        info!("Bridge stopped");
        outbound_result.and(inbound_result)
    }

    /// Serial-to-broker direction: one publish per complete line
    async fn pump_outbound(
        mut reader: Box<dyn SerialReader>,
        publisher: Arc<dyn BrokerPublisher>,
        metrics: Arc<dyn MetricsReporter>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<()> {
        loop {
            let line = tokio::select! {
                _ = stop.changed() => {
                    info!("Stop signal received, closing serial channel");
                    break;
                }
                line = reader.next_line() => line,
            };

            match line {
                Ok(Some(line)) => {
                    info!(line = %line, "Message from device");
                    match publisher.publish(&line).await {
                        Ok(()) => metrics.report_published(),
                        // Fire-and-forget: log and keep reading
                        Err(e) => warn!("Publish failed: {}", e),
                    }
                }
                Ok(None) => {
                    info!("Serial device closed");
                    break;
                }
                // Malformed bytes must not kill the loop; skip the line
                Err(DomainError::DecodeFailed(reason)) => {
                    warn!("Skipping malformed serial line: {}", reason);
                }
                Err(e) => {
                    error!("Serial read error: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

/// Broker-to-serial direction, run on its own task.
///
/// Owns the serial writer half and every broker event, including the
/// reconnect handling with exponential backoff.
struct InboundDispatch {
    events: Box<dyn BrokerEventSource>,
    writer: Box<dyn SerialWriter>,
    publisher: Arc<dyn BrokerPublisher>,
    lifecycle: SessionLifecycle,
    backoff_policy: BackoffPolicy,
    max_reconnect_attempts: Option<u32>,
    metrics: Arc<dyn MetricsReporter>,
}

impl InboundDispatch {
    async fn run(mut self, mut stop: watch::Receiver<bool>) -> Result<()> {
        self.lifecycle.transition_to_connecting();
        self.metrics.report_state_change(self.lifecycle.current_state());

        let mut reconnect_attempt = 0u32;

        loop {
            let event = tokio::select! {
                _ = stop.changed() => break,
                event = self.events.next_event() => event,
            };

            match event {
                Ok(BrokerEvent::Connected { session_present }) => {
                    info!(session_present, "Connected to broker");
                    self.lifecycle.transition_to_connected();
                    self.metrics.report_state_change(self.lifecycle.current_state());

                    // Subscribe before handling any message so the
                    // subscription survives reconnects
                    match self.publisher.subscribe().await {
                        Ok(()) => {
                            self.lifecycle.transition_to_subscribed();
                            self.metrics.report_state_change(self.lifecycle.current_state());
                            reconnect_attempt = 0;
                        }
                        Err(e) => error!("Subscribe failed: {}", e),
                    }
                }
                Ok(BrokerEvent::Message { topic, payload }) => {
                    info!(topic = %topic, bytes = payload.len(), "Message from broker");
                    match self.writer.write(&payload).await {
                        Ok(()) => self.metrics.report_written(),
                        Err(e) => warn!("Serial write failed: {}", e),
                    }
                }
                Err(DomainError::ConnectionLost(reason)) => {
                    reconnect_attempt += 1;
                    self.metrics.report_reconnect_attempt();
                    self.lifecycle
                        .transition_to_reconnecting(reconnect_attempt, Some(reason.clone()));
                    self.metrics.report_state_change(self.lifecycle.current_state());

                    if !self
                        .lifecycle
                        .should_continue_retrying(self.max_reconnect_attempts)
                    {
                        error!("Giving up on broker after {} attempts", reconnect_attempt);
                        self.lifecycle.transition_to_failed(Some(reason));
                        self.metrics.report_state_change(self.lifecycle.current_state());
                        return Err(DomainError::ReconnectExhausted(reconnect_attempt));
                    }

                    let delay = self.backoff_policy.delay_for(reconnect_attempt);
                    self.metrics.report_backoff(delay.as_secs_f64());
                    warn!(
                        "Broker connection lost ({}), reconnecting in {:?} (attempt {})",
                        reason, delay, reconnect_attempt
                    );

                    tokio::select! {
                        _ = stop.changed() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => warn!("Broker event error: {}", e),
            }

            if let Some(uptime) = self.lifecycle.uptime() {
                self.metrics.report_uptime(uptime.as_secs_f64());
            }
        }

        info!("Inbound dispatch stopped");
        Ok(())
    }
}
