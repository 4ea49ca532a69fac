//! Protobuf envelope types exchanged with a mesh radio.
//!
//! Only the subset of the radio's schema needed to route traffic is modelled.
//! Configuration sections are carried as opaque bytes; field numbers match the
//! device firmware so unknown fields and variants are skipped on decode.
//!
//! - [`ToRadio`]: host to radio envelope
//! - [`FromRadio`]: radio to host envelope

pub mod envelope;
pub mod mesh;
pub mod node;
pub mod settings;

pub use envelope::{from_radio, to_radio, FromRadio, Heartbeat, ToRadio};
pub use mesh::{mesh_packet, Data, MeshPacket, PortNum, BROADCAST_ADDR, MAX_DATA_PAYLOAD};
pub use node::{DeviceMetadata, DeviceMetrics, MyNodeInfo, NodeInfo, Position, QueueStatus, User};
pub use settings::{
    config, module_config, Channel, ChannelRole, ChannelSettings, Config, LogLevel, LogRecord,
    ModuleConfig,
};

/// Re-exported so callers can encode/decode without a direct prost dependency.
pub use prost::Message;
