use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::RadioStream;

/// Serial transport to a radio attached over USB or UART.
///
/// The port is opened with 8N1 framing. Reads are gated on
/// `bytes_to_read()` so they never wait on the port timeout.
pub struct SerialRadioStream {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialRadioStream {
    /// Baud rate used by the radio's serial API.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;
    /// Default write timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    /// Create an unopened serial stream for `path` at the default baud rate.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_settings(path, Self::DEFAULT_BAUD_RATE, Self::DEFAULT_TIMEOUT)
    }

    /// Create an unopened serial stream with explicit settings.
    pub fn with_settings(path: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout,
            port: None,
        }
    }

    /// Wrap an already-open port.
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        let path = port.name().unwrap_or_else(|| "<unnamed>".to_string());
        let baud_rate = port.baud_rate().unwrap_or(Self::DEFAULT_BAUD_RATE);
        let timeout = port.timeout();
        Self {
            path,
            baud_rate,
            timeout,
            port: Some(port),
        }
    }

    /// Device path of this port.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn drop_port(&mut self, reason: &str) {
        if self.port.take().is_some() {
            info!(path = %self.path, reason, "serial port closed");
        }
    }
}

impl RadioStream for SerialRadioStream {
    fn connect(&mut self) -> Result<()> {
        self.stop();

        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(self.timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .open()
            .map_err(|e| TransportError::SerialOpen {
                path: self.path.clone(),
                source: e,
            })?;

        debug!(path = %self.path, baud = self.baud_rate, "opened serial port");
        self.port = Some(port);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn available(&mut self) -> Result<usize> {
        let Some(port) = self.port.as_mut() else {
            return Ok(0);
        };
        match port.bytes_to_read() {
            Ok(n) => Ok(n as usize),
            Err(err) => {
                self.drop_port("status query failed");
                Err(TransportError::Serial(err))
            }
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.available()? == 0 {
            return Ok(None);
        }
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(None)
            }
            Err(err) => {
                self.drop_port("read failed");
                Err(TransportError::Io(err))
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let mut offset = 0usize;
        while offset < buf.len() {
            match port.write(&buf[offset..]) {
                Ok(0) => break,
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => break,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        port.flush()?;
        Ok(offset)
    }

    fn stop(&mut self) {
        if self.port.take().is_some() {
            debug!(path = %self.path, "serial port released");
        }
    }

    fn transport_name(&self) -> &'static str {
        "serial"
    }
}

impl std::fmt::Debug for SerialRadioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialRadioStream")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_device() {
        let mut stream = SerialRadioStream::new("/dev/meshlink-does-not-exist");
        let result = stream.connect();
        assert!(matches!(result, Err(TransportError::SerialOpen { .. })));
        assert!(!stream.is_connected());
    }

    #[test]
    fn test_unopened_port_is_quiet() {
        let mut stream = SerialRadioStream::new("/dev/null-radio");
        assert_eq!(stream.available().unwrap(), 0);
        assert_eq!(stream.read_byte().unwrap(), None);
        assert!(matches!(stream.write(b"x"), Err(TransportError::NotConnected)));
        stream.stop();
        assert_eq!(stream.path(), "/dev/null-radio");
    }
}
