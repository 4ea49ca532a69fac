//! Byte-stream transports for a mesh radio.
//!
//! Provides a unified interface over the two ways a host reaches the radio:
//! - A serial port (USB/UART)
//! - A TCP socket to the radio's network bridge
//!
//! This is the lowest layer of meshlink. Everything else builds on top of
//! the [`RadioStream`] trait provided here. The [`NetworkLink`] trait reports
//! the status of the network underneath a TCP stream.

pub mod error;
pub mod link;
#[cfg(feature = "serial")]
pub mod serial;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use link::{Credentials, HostNetwork, LinkStatus, NetworkLink};
#[cfg(feature = "serial")]
pub use serial::SerialRadioStream;
pub use tcp::{TcpRadioStream, DEFAULT_RADIO_ENDPOINT};
pub use traits::RadioStream;
