use std::time::Duration;

use clap::Parser;

use crate::domain::value_objects::{BackoffPolicy, BrokerConfig, SerialConfig};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "serial-mqtt-bridge",
    version = "0.1.0",
    about = "Bridge between a serial-attached device and an MQTT broker"
)]
pub struct Config {
    /// Serial device path
    #[arg(long, env = "SERIAL_DEVICE", default_value = "/dev/ttyACM0")]
    pub device: String,

    /// Serial baud rate
    #[arg(long, env = "SERIAL_BAUD", default_value = "9600")]
    pub baud_rate: u32,

    /// MQTT broker host
    #[arg(long, env = "MQTT_HOST", default_value = "test.mosquitto.org")]
    pub broker_host: String,

    /// MQTT broker port
    #[arg(long, env = "MQTT_PORT", default_value = "1883")]
    pub broker_port: u16,

    /// MQTT client identifier
    #[arg(long, env = "MQTT_CLIENT_ID", default_value = "meuCliente")]
    pub client_id: String,

    /// Topic used for both subscribe and publish
    #[arg(long, env = "MQTT_TOPIC", default_value = "meu/topico")]
    pub topic: String,

    /// MQTT keep-alive interval in seconds
    #[arg(long, env = "MQTT_KEEP_ALIVE_SECS", default_value = "60")]
    pub keep_alive_secs: u64,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9004")]
    pub metrics_port: u16,

    /// Initial reconnection delay in seconds
    #[arg(long, default_value = "1")]
    pub reconnect_initial_delay: u64,

    /// Maximum reconnection delay in seconds
    #[arg(long, default_value = "30")]
    pub reconnect_max_delay: u64,

    /// Reconnection backoff multiplier
    #[arg(long, default_value = "2.0")]
    pub reconnect_multiplier: f64,

    /// Maximum reconnection attempts before giving up (0 = unlimited)
    #[arg(long, default_value = "0")]
    pub max_reconnect_attempts: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.device.trim().is_empty() {
            anyhow::bail!("Serial device path cannot be empty");
        }

        if self.baud_rate == 0 {
            anyhow::bail!("Baud rate cannot be 0");
        }

        Self::validate_port(self.metrics_port, "metrics")?;

        if self.broker_port == 0 {
            anyhow::bail!("Invalid broker port: port cannot be 0");
        }

        if self.reconnect_multiplier <= 1.0 {
            anyhow::bail!("Reconnect multiplier must be > 1.0");
        }

        if self.reconnect_initial_delay == 0 {
            anyhow::bail!("Initial reconnection delay cannot be 0");
        }

        if self.reconnect_max_delay < self.reconnect_initial_delay {
            anyhow::bail!(
                "Maximum reconnection delay ({}) cannot be less than initial delay ({})",
                self.reconnect_max_delay,
                self.reconnect_initial_delay
            );
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    pub fn to_serial_config(&self) -> crate::domain::errors::Result<SerialConfig> {
        SerialConfig::new(self.device.clone(), self.baud_rate)
    }

    pub fn to_broker_config(&self) -> crate::domain::errors::Result<BrokerConfig> {
        BrokerConfig::new(
            self.broker_host.clone(),
            self.broker_port,
            self.client_id.clone(),
            self.topic.clone(),
            Duration::from_secs(self.keep_alive_secs),
        )
    }

    pub fn to_backoff_policy(&self) -> crate::domain::errors::Result<BackoffPolicy> {
        BackoffPolicy::new(
            Duration::from_secs(self.reconnect_initial_delay),
            Duration::from_secs(self.reconnect_max_delay),
            self.reconnect_multiplier,
        )
    }

    pub fn max_reconnect_attempts(&self) -> Option<u32> {
        if self.max_reconnect_attempts == 0 {
            None
        } else {
            Some(self.max_reconnect_attempts)
        }
    }
}
