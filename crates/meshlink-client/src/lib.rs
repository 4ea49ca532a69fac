//! Poll-driven client for a mesh radio.
//!
//! This is the "just works" layer. Pick a [`Transport`], build a
//! [`MeshClient`], register handlers and call [`MeshClient::poll`] from the
//! host loop. Each step keeps the link up, sends heartbeats, and decodes
//! whatever the radio sent.
//!
//! ```no_run
//! use meshlink_client::{ClientConfig, MeshClient, SocketConfig, Transport};
//! use meshlink_proto::BROADCAST_ADDR;
//!
//! let mut client = MeshClient::new(Transport::socket(SocketConfig::default()), ClientConfig::default());
//! client.on_text(|meta, text| println!("{:08x}: {text}", meta.from));
//! loop {
//!     let outcome = client.poll()?;
//!     if outcome.can_send {
//!         client.send_text("hello mesh", BROADCAST_ADDR, 0)?;
//!     }
//!     if outcome.is_idle() {
//!         std::thread::sleep(client.config().poll_backoff);
//!     }
//! }
//! # Ok::<(), meshlink_client::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod heartbeat;
pub mod node_report;

pub use client::{MeshClient, PollOutcome, Transport};
#[cfg(feature = "serial")]
pub use config::SerialConfig;
pub use config::{ClientConfig, SocketConfig};
pub use connection::{ConnectionManager, ConnectionState};
pub use dispatch::{Dispatched, Handlers, PacketMeta};
pub use error::{ClientError, FatalError, Result};
pub use heartbeat::HeartbeatScheduler;
pub use node_report::{
    generate_nonce, NodeRecord, NodeReportHandler, NodeReportProgress, NodeReportTracker,
    ReportRecord, SPECIAL_NONCE,
};
