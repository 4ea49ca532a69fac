use std::io::{ErrorKind, Read, Write};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::RadioStream;

/// Address of the radio's network bridge when it hosts its own access point.
pub const DEFAULT_RADIO_ENDPOINT: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(192, 168, 42, 1), 4403));

/// TCP transport to the radio's network bridge.
///
/// The socket is put in non-blocking mode once connected so that polling
/// for input never stalls the caller. Writes retry on `WouldBlock` until
/// the configured timeout elapses.
pub struct TcpRadioStream {
    endpoint: SocketAddr,
    timeout: Duration,
    stream: Option<TcpStream>,
}

impl TcpRadioStream {
    /// Default connect and write timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create an unconnected stream for `endpoint`.
    pub fn new(endpoint: SocketAddr) -> Self {
        Self::with_timeout(endpoint, Self::DEFAULT_TIMEOUT)
    }

    /// Create an unconnected stream with an explicit connect/write timeout.
    pub fn with_timeout(endpoint: SocketAddr, timeout: Duration) -> Self {
        Self {
            endpoint,
            timeout,
            stream: None,
        }
    }

    /// The endpoint this stream connects to.
    pub fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    fn drop_stream(&mut self, reason: &str) {
        if self.stream.take().is_some() {
            info!(endpoint = %self.endpoint, reason, "tcp connection closed");
        }
    }
}

impl RadioStream for TcpRadioStream {
    fn connect(&mut self) -> Result<()> {
        self.stop();

        let stream = TcpStream::connect_timeout(&self.endpoint, self.timeout).map_err(|e| {
            TransportError::Connect {
                endpoint: self.endpoint,
                source: e,
            }
        })?;
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;

        debug!(endpoint = %self.endpoint, "connected to radio");
        self.stream = Some(stream);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn available(&mut self) -> Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(0);
        };

        let mut peek_buf = [0u8; 512];
        match stream.peek(&mut peek_buf) {
            Ok(0) => {
                self.drop_stream("peer closed");
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(0),
            Err(err) => {
                self.drop_stream("peek failed");
                Err(TransportError::Io(err))
            }
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let mut byte = [0u8; 1];
        match stream.read(&mut byte) {
            Ok(0) => {
                self.drop_stream("peer closed");
                Ok(None)
            }
            Ok(_) => Ok(Some(byte[0])),
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(None),
            Err(err) => {
                self.drop_stream("read failed");
                Err(TransportError::Io(err))
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let deadline = Instant::now() + self.timeout;
        let mut offset = 0usize;
        while offset < buf.len() {
            match stream.write(&buf[offset..]) {
                Ok(0) => break,
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    std::thread::yield_now();
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(offset)
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(std::net::Shutdown::Both);
            debug!(endpoint = %self.endpoint, "tcp connection stopped");
        }
    }

    fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

impl std::fmt::Debug for TcpRadioStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpRadioStream")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.stream.is_some())
            .finish()
    }
}
