use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;

use serial_mqtt_bridge::{
    BackoffPolicy, BridgeService, BrokerConfig, BrokerEvent, BrokerEventSource, BrokerPublisher,
    ConnectionState, DomainError, MetricsReporter, Result, SerialConfig, SerialReader,
    SerialWriter, SessionLifecycle, TokioSerialChannel,
};

// In-memory fakes for the bridge ports

/// Serial reader that yields scripted results, then either closes or blocks
struct ScriptedReader {
    items: VecDeque<Result<Option<String>>>,
    block_when_drained: bool,
}

impl ScriptedReader {
    fn closing(items: Vec<Result<Option<String>>>) -> Self {
        Self {
            items: items.into(),
            block_when_drained: false,
        }
    }

    fn blocking(items: Vec<Result<Option<String>>>) -> Self {
        Self {
            items: items.into(),
            block_when_drained: true,
        }
    }
}

#[async_trait]
impl SerialReader for ScriptedReader {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.items.pop_front() {
            Some(item) => item,
            None if self.block_when_drained => std::future::pending().await,
            None => Ok(None),
        }
    }
}

/// Serial writer that records every write into a shared operations log
struct RecordingWriter {
    ops: Arc<Mutex<Vec<String>>>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl SerialWriter for RecordingWriter {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(format!("write:{}", String::from_utf8_lossy(bytes)));
        self.written.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}

/// Publisher that records publishes, subscribes and disconnects
#[derive(Default)]
struct RecordingPublisher {
    ops: Arc<Mutex<Vec<String>>>,
    published: Arc<Mutex<Vec<String>>>,
    disconnects: Arc<Mutex<u32>>,
}

#[async_trait]
impl BrokerPublisher for RecordingPublisher {
    async fn publish(&self, payload: &str) -> Result<()> {
        self.ops
            .lock()
            .unwrap()
            .push(format!("publish:{}", payload));
        self.published.lock().unwrap().push(payload.to_string());
        Ok(())
    }

    async fn subscribe(&self) -> Result<()> {
        self.ops.lock().unwrap().push("subscribe".to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        *self.disconnects.lock().unwrap() += 1;
        Ok(())
    }
}

/// Event source that yields scripted events, then blocks forever
struct ScriptedEvents {
    events: VecDeque<Result<BrokerEvent>>,
}

impl ScriptedEvents {
    fn new(events: Vec<Result<BrokerEvent>>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

#[async_trait]
impl BrokerEventSource for ScriptedEvents {
    async fn next_event(&mut self) -> Result<BrokerEvent> {
        match self.events.pop_front() {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }
}

struct NoopMetrics;

impl MetricsReporter for NoopMetrics {
    fn report_state_change(&self, _state: &ConnectionState) {}
    fn report_reconnect_attempt(&self) {}
    fn report_backoff(&self, _delay_secs: f64) {}
    fn report_published(&self) {}
    fn report_written(&self) {}
    fn report_uptime(&self, _uptime_secs: f64) {}
}

fn fast_backoff() -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(5), 2.0).unwrap()
}

fn service(
    reader: ScriptedReader,
    writer: RecordingWriter,
    publisher: Arc<RecordingPublisher>,
    events: ScriptedEvents,
    max_attempts: Option<u32>,
) -> BridgeService {
    BridgeService::new(
        Box::new(reader),
        Box::new(writer),
        publisher,
        Box::new(events),
        fast_backoff(),
        max_attempts,
        Arc::new(NoopMetrics),
    )
}

fn recording_writer(ops: &Arc<Mutex<Vec<String>>>) -> (RecordingWriter, Arc<Mutex<Vec<Vec<u8>>>>) {
    let written = Arc::new(Mutex::new(Vec::new()));
    (
        RecordingWriter {
            ops: ops.clone(),
            written: written.clone(),
        },
        written,
    )
}

async fn wait_until<F: Fn() -> bool>(cond: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while !cond() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 1s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// Bridge behavior

#[tokio::test]
async fn test_each_serial_line_published_exactly_once() {
    let ops = Arc::new(Mutex::new(Vec::new()));
    let (writer, _) = recording_writer(&ops);
    let publisher = Arc::new(RecordingPublisher::default());
    let published = publisher.published.clone();

    let reader = ScriptedReader::closing(vec![Ok(Some("hello".to_string()))]);
    let events = ScriptedEvents::new(vec![]);

    let (_tx, rx) = watch::channel(false);
    let svc = service(reader, writer, publisher, events, None);
    svc.run(rx).await.unwrap();

    assert_eq!(*published.lock().unwrap(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn test_inbound_payloads_written_verbatim_and_in_order() {
    let ops = Arc::new(Mutex::new(Vec::new()));
    let (writer, written) = recording_writer(&ops);
    let publisher = Arc::new(RecordingPublisher::default());

    let reader = ScriptedReader::blocking(vec![]);
    let events = ScriptedEvents::new(vec![
        Ok(BrokerEvent::Connected {
            session_present: false,
        }),
        Ok(BrokerEvent::Message {
            topic: "meu/topico".to_string(),
            payload: Bytes::from_static(b"LED_ON"),
        }),
        Ok(BrokerEvent::Message {
            topic: "meu/topico".to_string(),
            payload: Bytes::from_static(b"LED_OFF"),
        }),
    ]);

    let (tx, rx) = watch::channel(false);
    let svc = service(reader, writer, publisher, events, None);
    let handle = tokio::spawn(svc.run(rx));

    let written_probe = written.clone();
    wait_until(move || written_probe.lock().unwrap().len() == 2).await;
    tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    let written = written.lock().unwrap();
    // Payloads pass through untouched: no terminator appended, order kept
    assert_eq!(written[0], b"LED_ON".to_vec());
    assert_eq!(written[1], b"LED_OFF".to_vec());
}

#[tokio::test]
async fn test_resubscribe_happens_before_message_processing() {
    let ops = Arc::new(Mutex::new(Vec::new()));
    let (writer, written) = recording_writer(&ops);
    let publisher = Arc::new(RecordingPublisher {
        ops: ops.clone(),
        ..Default::default()
    });

    let reader = ScriptedReader::blocking(vec![]);
    let events = ScriptedEvents::new(vec![
        Ok(BrokerEvent::Connected {
            session_present: false,
        }),
        Ok(BrokerEvent::Message {
            topic: "meu/topico".to_string(),
            payload: Bytes::from_static(b"LED_ON"),
        }),
    ]);

    let (tx, rx) = watch::channel(false);
    let svc = service(reader, writer, publisher, events, None);
    let handle = tokio::spawn(svc.run(rx));

    let written_probe = written.clone();
    wait_until(move || written_probe.lock().unwrap().len() == 1).await;
    tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    let ops = ops.lock().unwrap();
    assert_eq!(*ops, vec!["subscribe".to_string(), "write:LED_ON".to_string()]);
}

#[tokio::test]
async fn test_malformed_serial_line_is_skipped() {
    let ops = Arc::new(Mutex::new(Vec::new()));
    let (writer, _) = recording_writer(&ops);
    let publisher = Arc::new(RecordingPublisher::default());
    let published = publisher.published.clone();

    let reader = ScriptedReader::closing(vec![
        Err(DomainError::DecodeFailed("invalid utf-8".to_string())),
        Ok(Some("ok".to_string())),
    ]);
    let events = ScriptedEvents::new(vec![]);

    let (_tx, rx) = watch::channel(false);
    let svc = service(reader, writer, publisher, events, None);
    svc.run(rx).await.unwrap();

    // The malformed line is dropped, the loop keeps going
    assert_eq!(*published.lock().unwrap(), vec!["ok".to_string()]);
}

#[tokio::test]
async fn test_shutdown_unblocks_pending_read() {
    let ops = Arc::new(Mutex::new(Vec::new()));
    let (writer, _) = recording_writer(&ops);
    let publisher = Arc::new(RecordingPublisher::default());
    let disconnects = publisher.disconnects.clone();

    let reader = ScriptedReader::blocking(vec![]);
    let events = ScriptedEvents::new(vec![]);

    let (tx, rx) = watch::channel(false);
    let svc = service(reader, writer, publisher, events, None);
    let handle = tokio::spawn(svc.run(rx));

    tx.send(true).unwrap();
    // A second interrupt must be harmless; the receiver may already be gone
    let _ = tx.send(true);

    let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
    result.expect("bridge must stop within 1s").unwrap().unwrap();
    assert_eq!(*disconnects.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_reconnect_exhaustion_is_fatal() {
    let ops = Arc::new(Mutex::new(Vec::new()));
    let (writer, _) = recording_writer(&ops);
    let publisher = Arc::new(RecordingPublisher::default());

    let reader = ScriptedReader::blocking(vec![]);
    let events = ScriptedEvents::new(vec![Err(DomainError::ConnectionLost(
        "connection refused".to_string(),
    ))]);

    let (_tx, rx) = watch::channel(false);
    let svc = service(reader, writer, publisher, events, Some(1));
    let result = tokio::time::timeout(Duration::from_secs(1), svc.run(rx))
        .await
        .expect("bridge must stop after exhausting retries");

    assert!(matches!(result, Err(DomainError::ReconnectExhausted(1))));
}

#[tokio::test]
async fn test_connection_loss_is_retried_then_resubscribed() {
    let ops = Arc::new(Mutex::new(Vec::new()));
    let (writer, written) = recording_writer(&ops);
    let publisher = Arc::new(RecordingPublisher {
        ops: ops.clone(),
        ..Default::default()
    });

    let reader = ScriptedReader::blocking(vec![]);
    let events = ScriptedEvents::new(vec![
        Ok(BrokerEvent::Connected {
            session_present: false,
        }),
        Err(DomainError::ConnectionLost("broken pipe".to_string())),
        Ok(BrokerEvent::Connected {
            session_present: false,
        }),
        Ok(BrokerEvent::Message {
            topic: "meu/topico".to_string(),
            payload: Bytes::from_static(b"ping"),
        }),
    ]);

    let (tx, rx) = watch::channel(false);
    let svc = service(reader, writer, publisher, events, None);
    let handle = tokio::spawn(svc.run(rx));

    let written_probe = written.clone();
    wait_until(move || written_probe.lock().unwrap().len() == 1).await;
    tx.send(true).unwrap();
    handle.await.unwrap().unwrap();

    let ops = ops.lock().unwrap();
    // One subscribe per connection, and the re-subscribe precedes the write
    assert_eq!(
        *ops,
        vec![
            "subscribe".to_string(),
            "subscribe".to_string(),
            "write:ping".to_string()
        ]
    );
}

#[tokio::test]
async fn test_invalid_device_path_is_fatal_at_open() {
    // The device is opened before any broker activity, so a bad path must
    // fail right here with a connection error
    let config = SerialConfig::new("/dev/nonexistent-serial-device".to_string(), 9600).unwrap();

    let result = TokioSerialChannel::open(&config);
    assert!(matches!(result, Err(DomainError::SerialOpenFailed(_))));
}

// Domain config and policies

#[test]
fn test_serial_config_validation() {
    assert!(SerialConfig::new("/dev/ttyACM0".to_string(), 9600).is_ok());
    assert!(SerialConfig::new("".to_string(), 9600).is_err());
    assert!(SerialConfig::new("/dev/ttyACM0".to_string(), 0).is_err());
}

#[test]
fn test_broker_config_validation() {
    let valid = BrokerConfig::new(
        "test.mosquitto.org".to_string(),
        1883,
        "meuCliente".to_string(),
        "meu/topico".to_string(),
        Duration::from_secs(60),
    );
    assert!(valid.is_ok());

    let wildcard_topic = BrokerConfig::new(
        "test.mosquitto.org".to_string(),
        1883,
        "meuCliente".to_string(),
        "meu/#".to_string(),
        Duration::from_secs(60),
    );
    assert!(wildcard_topic.is_err());
}

#[test]
fn test_backoff_growth_and_cap() {
    let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(10), 2.0).unwrap();

    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    assert_eq!(policy.delay_for(4), Duration::from_secs(8));
    assert_eq!(policy.delay_for(5), Duration::from_secs(10)); // Capped at max
    assert_eq!(policy.delay_for(10), Duration::from_secs(10));
}

#[test]
fn test_session_lifecycle_transitions() {
    let mut lifecycle = SessionLifecycle::new();
    assert_eq!(*lifecycle.current_state(), ConnectionState::Disconnected);

    lifecycle.transition_to_connecting();
    lifecycle.transition_to_connected();
    lifecycle.transition_to_subscribed();
    assert_eq!(*lifecycle.current_state(), ConnectionState::Subscribed);
    assert_eq!(lifecycle.transition_count(), 3);

    lifecycle.transition_to_reconnecting(1, Some("lost".to_string()));
    assert!(lifecycle.current_state().is_problematic());
    assert!(lifecycle.should_continue_retrying(Some(3)));
    assert!(!lifecycle.should_continue_retrying(Some(1)));
}
