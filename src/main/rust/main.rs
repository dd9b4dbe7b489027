use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::{oneshot, watch};
use tracing::{error, info};

use serial_mqtt_bridge::{
    serve_metrics, BridgeService, Config, PrometheusReporter, RumqttBrokerClient,
    TokioSerialChannel,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration
    let config = Config::parse();
    config.validate()?;

    // Initialize logging
    let filter = if config.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    // Initialize metrics
    PrometheusReporter::init_metrics()?;

    info!("Starting serial MQTT bridge");
    info!("  Serial device: {} @ {} baud", config.device, config.baud_rate);
    info!("  Broker: {}:{}", config.broker_host, config.broker_port);
    info!("  Topic: {}", config.topic);
    info!("  Metrics port: {}", config.metrics_port);

    // Convert CLI config to domain configs
    let serial_config = config
        .to_serial_config()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let broker_config = config
        .to_broker_config()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let backoff_policy = config
        .to_backoff_policy()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // The serial device is opened before any broker activity, so an invalid
    // device path is fatal before a connection attempt is made.
    let (serial_reader, serial_writer) =
        TokioSerialChannel::open(&serial_config).map_err(|e| anyhow::anyhow!("{}", e))?;
    let (publisher, broker_events) = RumqttBrokerClient::connect(&broker_config);

    let metrics_reporter = Arc::new(PrometheusReporter::new());

    // Create application service
    let bridge_service = BridgeService::new(
        Box::new(serial_reader),
        Box::new(serial_writer),
        Arc::new(publisher),
        Box::new(broker_events),
        backoff_policy,
        config.max_reconnect_attempts(),
        metrics_reporter,
    );

    // Set up graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (metrics_shutdown_tx, metrics_shutdown_rx) = oneshot::channel::<()>();

    // Handle Ctrl+C
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl+c");
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    // Start metrics server
    let metrics_server = tokio::spawn(serve_metrics(config.metrics_port, metrics_shutdown_rx));

    // Run the bridge until interrupted
    let bridge_result = bridge_service.run(shutdown_rx).await;

    // Signal shutdown to metrics server and wait for it
    let _ = metrics_shutdown_tx.send(());
    metrics_server.await?;

    if let Err(e) = bridge_result {
        error!("Bridge error: {}", e);
        std::process::exit(1);
    }

    info!("Bridge shutdown complete");
    Ok(())
}
