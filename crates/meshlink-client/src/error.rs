use meshlink_transport::LinkStatus;

/// Conditions the client cannot recover from.
///
/// The host decides whether to exit or rebuild the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FatalError {
    /// The network link reported that no network hardware is present.
    #[error("network hardware is absent")]
    HardwareAbsent,

    /// The network link reported a status code the client does not know.
    #[error("unrecognized link status code {0}")]
    UnknownStatus(u8),
}

impl FatalError {
    /// The fatal condition for `status`, if it is one.
    pub fn from_status(status: LinkStatus) -> Option<Self> {
        match status {
            LinkStatus::HardwareAbsent => Some(Self::HardwareAbsent),
            LinkStatus::Unknown(code) => Some(Self::UnknownStatus(code)),
            _ => None,
        }
    }
}

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] meshlink_transport::TransportError),

    /// Frame-level error, including envelopes too large to frame.
    #[error("frame error: {0}")]
    Frame(#[from] meshlink_frame::FrameError),

    /// The link is unusable and will not recover.
    #[error("fatal: {0}")]
    Fatal(#[from] FatalError),

    /// A text or data payload exceeds what a single packet can carry.
    #[error("payload of {size} bytes exceeds packet limit of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame could not be handed to the transport, even after one
    /// reconnect and retry.
    #[error("send failed after reconnect: {0}")]
    SendFailed(#[source] meshlink_frame::FrameError),
}

impl ClientError {
    /// Whether the client must be torn down.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
