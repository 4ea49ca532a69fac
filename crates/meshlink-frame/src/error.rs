/// Errors that can occur during frame encoding or transmission.
///
/// Framing corruption on the receive side is never reported here: the
/// decoder resynchronizes silently.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The serialized envelope exceeds the frame payload limit.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The protobuf encoder rejected the envelope.
    #[error("envelope encode failed: {0}")]
    Encode(#[from] prost::EncodeError),

    /// The transport accepted fewer bytes than the frame holds.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },

    /// Transport-level error while reading or writing frames.
    #[error("transport error: {0}")]
    Transport(#[from] meshlink_transport::TransportError),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
