use std::fmt;

/// Broker session states (pure domain)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session established yet
    Disconnected,
    /// Attempting to reach the broker
    Connecting,
    /// CONNACK received, not yet subscribed
    Connected,
    /// Subscription active, bridge fully operational
    Subscribed,
    /// Connection lost, will retry
    Reconnecting { attempt: u32 },
    /// Permanent failure or stopped
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Connected => write!(f, "CONNECTED"),
            Self::Subscribed => write!(f, "SUBSCRIBED"),
            Self::Reconnecting { attempt } => write!(f, "RECONNECTING (attempt {})", attempt),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl ConnectionState {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Disconnected => 0.0,
            Self::Connecting => 1.0,
            Self::Connected => 2.0,
            Self::Subscribed => 3.0,
            Self::Reconnecting { .. } => 4.0,
            Self::Failed => 5.0,
        }
    }

    /// Check if the session can relay messages in both directions
    pub fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed)
    }

    /// Check if state indicates a problem
    pub fn is_problematic(&self) -> bool {
        matches!(self, Self::Reconnecting { .. } | Self::Failed)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Disconnected
    }
}
