use std::net::SocketAddr;
use std::time::Duration;

use meshlink_transport::{Credentials, TcpRadioStream, DEFAULT_RADIO_ENDPOINT};

/// Timing and buffering knobs for a [`MeshClient`](crate::MeshClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Delay between network connect attempts while the link is down.
    pub connect_timeout: Duration,
    /// How long a connected link may stay silent before it is re-established.
    pub idle_timeout: Duration,
    /// Interval between keepalive envelopes.
    pub heartbeat_interval: Duration,
    /// How long a host loop should sleep after a poll step that moved no data.
    pub poll_backoff: Duration,
    /// Upper bound on bytes consumed from the transport in one poll step.
    pub max_read_per_poll: usize,
    /// Give up on a node report after this long without a record.
    ///
    /// `None` waits for the completion marker indefinitely.
    pub node_report_stall_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(65),
            heartbeat_interval: Duration::from_secs(60),
            poll_backoff: Duration::from_millis(25),
            max_read_per_poll: 4096,
            node_report_stall_timeout: None,
        }
    }
}

/// TCP link to the radio's network bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    /// Radio endpoint.
    pub endpoint: SocketAddr,
    /// TCP connect and write timeout.
    pub connect_timeout: Duration,
    /// Network credentials passed to the link when associating.
    pub credentials: Option<Credentials>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RADIO_ENDPOINT,
            connect_timeout: TcpRadioStream::DEFAULT_TIMEOUT,
            credentials: None,
        }
    }
}

impl SocketConfig {
    pub fn new(endpoint: SocketAddr) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }
}

/// Serial link to a radio attached over USB or UART.
#[cfg(feature = "serial")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0`.
    pub path: String,
    pub baud_rate: u32,
    /// Serial write timeout.
    pub timeout: Duration,
}

#[cfg(feature = "serial")]
impl SerialConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: meshlink_transport::SerialRadioStream::DEFAULT_BAUD_RATE,
            timeout: meshlink_transport::SerialRadioStream::DEFAULT_TIMEOUT,
        }
    }
}
