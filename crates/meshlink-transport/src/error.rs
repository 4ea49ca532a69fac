/// Errors that can occur in radio transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the radio's network endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: std::net::SocketAddr,
        source: std::io::Error,
    },

    /// Failed to open the serial device.
    #[cfg(feature = "serial")]
    #[error("failed to open serial port {path}: {source}")]
    SerialOpen {
        path: String,
        source: serialport::Error,
    },

    /// Serial port control or status query failed.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream is not connected.
    #[error("transport not connected")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, TransportError>;
