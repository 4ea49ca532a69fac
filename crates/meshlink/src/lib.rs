//! Host-side client for mesh radios.
//!
//! meshlink talks to a mesh radio over a serial port or over TCP to the
//! radio's network bridge, frames protobuf envelopes on the byte stream, and
//! runs a poll-driven client that keeps the link alive and dispatches what
//! the radio sends.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte-stream transports (serial, TCP) and network link status
//! - [`proto`]: envelope message definitions
//! - [`frame`]: magic-prefixed, length-delimited framing
//! - [`client`]: connection management, heartbeats, dispatch and node reports
//!   (behind the `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use meshlink_transport::*;
}

/// Re-export protocol message types.
pub mod proto {
    pub use meshlink_proto::*;
}

/// Re-export frame types.
pub mod frame {
    pub use meshlink_frame::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use meshlink_client::*;
}
