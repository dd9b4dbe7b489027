use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid serial device path: path cannot be empty")]
    InvalidDevicePath,

    #[error("Invalid baud rate: rate cannot be zero")]
    InvalidBaudRate,

    #[error("Invalid broker host: host cannot be empty")]
    InvalidHost,

    #[error("Invalid broker port: port cannot be zero")]
    InvalidPort,

    #[error("Invalid client id: id cannot be empty")]
    InvalidClientId,

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Invalid keep-alive: must be at least 5 seconds")]
    InvalidKeepAlive,

    #[error("Invalid backoff multiplier: must be > 1.0")]
    InvalidBackoffMultiplier,

    #[error("Failed to open serial device: {0}")]
    SerialOpenFailed(String),

    #[error("Serial read failed: {0}")]
    SerialReadFailed(String),

    #[error("Serial write failed: {0}")]
    SerialWriteFailed(String),

    #[error("Malformed serial line: {0}")]
    DecodeFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    #[error("Broker connection lost: {0}")]
    ConnectionLost(String),

    #[error("Reconnect attempts exhausted after {0} tries")]
    ReconnectExhausted(u32),
}

pub type Result<T> = std::result::Result<T, DomainError>;
