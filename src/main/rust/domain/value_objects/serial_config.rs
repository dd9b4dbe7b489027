use crate::domain::errors::{DomainError, Result};

/// Serial device connection parameters, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    device_path: String,
    baud_rate: u32,
}

impl SerialConfig {
    pub fn new(device_path: String, baud_rate: u32) -> Result<Self> {
        if device_path.trim().is_empty() {
            return Err(DomainError::InvalidDevicePath);
        }
        if baud_rate == 0 {
            return Err(DomainError::InvalidBaudRate);
        }

        Ok(Self {
            device_path,
            baud_rate,
        })
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}
