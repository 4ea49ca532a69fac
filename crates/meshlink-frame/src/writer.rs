use meshlink_transport::RadioStream;
use tracing::trace;

use crate::error::{FrameError, Result};

/// Hand a complete frame to `stream` in one write.
///
/// A short write is reported as [`FrameError::ShortWrite`]; the caller
/// decides whether to reconnect and retry.
pub fn write_frame<S: RadioStream + ?Sized>(stream: &mut S, frame: &[u8]) -> Result<()> {
    let written = stream.write(frame)?;
    if written != frame.len() {
        return Err(FrameError::ShortWrite {
            written,
            expected: frame.len(),
        });
    }
    trace!(len = frame.len(), transport = stream.transport_name(), "frame written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use meshlink_transport::TransportError;

    use super::*;

    struct CappedWriter {
        cap: usize,
        data: Vec<u8>,
        connected: bool,
    }

    impl RadioStream for CappedWriter {
        fn connect(&mut self) -> meshlink_transport::Result<()> {
            self.connected = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn available(&mut self) -> meshlink_transport::Result<usize> {
            Ok(0)
        }

        fn read_byte(&mut self) -> meshlink_transport::Result<Option<u8>> {
            Ok(None)
        }

        fn write(&mut self, buf: &[u8]) -> meshlink_transport::Result<usize> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            let n = buf.len().min(self.cap);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn stop(&mut self) {
            self.connected = false;
        }

        fn transport_name(&self) -> &'static str {
            "capped"
        }
    }

    #[test]
    fn full_write_succeeds() {
        let mut stream = CappedWriter {
            cap: usize::MAX,
            data: Vec::new(),
            connected: true,
        };
        write_frame(&mut stream, &[0x94, 0xc3, 0x00, 0x00]).unwrap();
        assert_eq!(stream.data, vec![0x94, 0xc3, 0x00, 0x00]);
    }

    #[test]
    fn short_write_is_reported() {
        let mut stream = CappedWriter {
            cap: 2,
            data: Vec::new(),
            connected: true,
        };
        let err = write_frame(&mut stream, &[0x94, 0xc3, 0x00, 0x01, 0x08]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::ShortWrite {
                written: 2,
                expected: 5
            }
        ));
    }

    #[test]
    fn disconnected_stream_propagates_transport_error() {
        let mut stream = CappedWriter {
            cap: usize::MAX,
            data: Vec::new(),
            connected: false,
        };
        let err = write_frame(&mut stream, &[0x94]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::NotConnected)
        ));
    }
}
