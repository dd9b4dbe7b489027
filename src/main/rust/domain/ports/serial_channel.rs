use async_trait::async_trait;

use crate::domain::errors::Result;

/// Port for the device-to-broker half of the serial channel.
///
/// The reader and writer halves are separate ports: each half is owned by
/// exactly one task, so the device handle is never shared between tasks.
#[async_trait]
pub trait SerialReader: Send {
    /// Read the next newline-terminated line, decoded as UTF-8 with the
    /// terminator and trailing whitespace trimmed.
    ///
    /// Returns `Ok(None)` once the device is closed. Invalid byte sequences
    /// yield `DomainError::DecodeFailed`; the caller decides whether to skip
    /// or abort.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

/// Port for the broker-to-device half of the serial channel
#[async_trait]
pub trait SerialWriter: Send {
    /// Write raw bytes to the device. No terminator is added, no retry.
    async fn write(&mut self, bytes: &[u8]) -> Result<()>;
}
