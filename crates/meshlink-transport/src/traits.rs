use crate::error::Result;

/// A duplex, non-blocking byte channel to the radio.
///
/// This is the fundamental I/O abstraction used by the client. Reads never
/// block: when nothing is buffered, [`available`](RadioStream::available)
/// reports zero and [`read_byte`](RadioStream::read_byte) returns `None`.
pub trait RadioStream {
    /// Establish (or re-establish) the underlying connection.
    ///
    /// Any existing connection is closed first.
    fn connect(&mut self) -> Result<()>;

    /// Whether the stream currently holds a live connection.
    fn is_connected(&self) -> bool;

    /// Number of bytes that can be read without blocking.
    ///
    /// A peer that closed the connection is detected here; afterwards
    /// [`is_connected`](RadioStream::is_connected) returns `false`.
    fn available(&mut self) -> Result<usize>;

    /// Read a single byte, or `None` when nothing is buffered.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Write `buf`, returning how many bytes were accepted.
    ///
    /// A return value smaller than `buf.len()` is a short write.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Forcibly close the connection. Idempotent.
    fn stop(&mut self);

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: RadioStream + ?Sized> RadioStream for Box<T> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
