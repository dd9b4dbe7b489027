use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{SerialReader, SerialWriter};
use crate::domain::value_objects::SerialConfig;

/// Serial device adapter backed by tokio-serial.
///
/// Opening splits the stream into independently-owned halves: the reader
/// half feeds the outbound pump, the writer half belongs to the inbound
/// dispatch task. Dropping both halves releases the device.
pub struct TokioSerialChannel;

impl TokioSerialChannel {
    pub fn open(config: &SerialConfig) -> Result<(TokioSerialReader, TokioSerialWriter)> {
        let stream = tokio_serial::new(config.device_path(), config.baud_rate())
            .open_native_async()
            .map_err(|e| {
                DomainError::SerialOpenFailed(format!("{}: {}", config.device_path(), e))
            })?;

        let (read_half, write_half) = tokio::io::split(stream);

        let reader = TokioSerialReader {
            inner: BufReader::new(read_half),
            buf: Vec::new(),
        };
        let writer = TokioSerialWriter { inner: write_half };

        Ok((reader, writer))
    }
}

pub struct TokioSerialReader {
    inner: BufReader<ReadHalf<SerialStream>>,
    buf: Vec<u8>,
}

#[async_trait]
impl SerialReader for TokioSerialReader {
    async fn next_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        let read = self
            .inner
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(|e| DomainError::SerialReadFailed(e.to_string()))?;

        if read == 0 {
            return Ok(None);
        }

        decode_line(&self.buf).map(Some)
    }
}

pub struct TokioSerialWriter {
    inner: WriteHalf<SerialStream>,
}

#[async_trait]
impl SerialWriter for TokioSerialWriter {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner
            .write_all(bytes)
            .await
            .map_err(|e| DomainError::SerialWriteFailed(e.to_string()))?;
        self.inner
            .flush()
            .await
            .map_err(|e| DomainError::SerialWriteFailed(e.to_string()))
    }
}

/// Decode a raw line as UTF-8 and trim the terminator and trailing whitespace
fn decode_line(raw: &[u8]) -> Result<String> {
    let text =
        std::str::from_utf8(raw).map_err(|e| DomainError::DecodeFailed(e.to_string()))?;
    Ok(text.trim_end().to_string())
}
