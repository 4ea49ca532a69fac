use crate::settings::{Channel, Config, LogRecord, ModuleConfig};
use crate::mesh::MeshPacket;
use crate::node::{DeviceMetadata, MyNodeInfo, NodeInfo, QueueStatus};

/// Keepalive sent by the host so the radio keeps the API session open.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Heartbeat {
    #[prost(uint32, tag = "1")]
    pub nonce: u32,
}

/// Envelope sent from the host to the radio.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ToRadio {
    #[prost(oneof = "to_radio::PayloadVariant", tags = "1, 3, 4, 7")]
    pub payload_variant: ::core::option::Option<to_radio::PayloadVariant>,
}

pub mod to_radio {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        /// Application packet to transmit on the mesh.
        #[prost(message, tag = "1")]
        Packet(super::MeshPacket),
        /// Ask the radio to stream its configuration and node database.
        #[prost(uint32, tag = "3")]
        WantConfigId(u32),
        /// Tell the radio the client is going away.
        #[prost(bool, tag = "4")]
        Disconnect(bool),
        #[prost(message, tag = "7")]
        Heartbeat(super::Heartbeat),
    }
}

impl ToRadio {
    /// Wrap an application packet.
    pub fn packet(packet: MeshPacket) -> Self {
        Self {
            payload_variant: Some(to_radio::PayloadVariant::Packet(packet)),
        }
    }

    /// Configuration request carrying `nonce`.
    pub fn want_config(nonce: u32) -> Self {
        Self {
            payload_variant: Some(to_radio::PayloadVariant::WantConfigId(nonce)),
        }
    }

    /// Keepalive envelope.
    pub fn heartbeat(nonce: u32) -> Self {
        Self {
            payload_variant: Some(to_radio::PayloadVariant::Heartbeat(Heartbeat { nonce })),
        }
    }

    /// Session teardown notice.
    pub fn disconnect() -> Self {
        Self {
            payload_variant: Some(to_radio::PayloadVariant::Disconnect(true)),
        }
    }
}

/// Envelope received from the radio.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct FromRadio {
    /// Monotonic id assigned by the radio.
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(
        oneof = "from_radio::PayloadVariant",
        tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13"
    )]
    pub payload_variant: ::core::option::Option<from_radio::PayloadVariant>,
}

pub mod from_radio {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(message, tag = "2")]
        Packet(super::MeshPacket),
        /// Identity of the radio the host is attached to.
        #[prost(message, tag = "3")]
        MyInfo(super::MyNodeInfo),
        /// One entry of the node database.
        #[prost(message, tag = "4")]
        NodeInfo(super::NodeInfo),
        #[prost(message, tag = "5")]
        Config(super::Config),
        #[prost(message, tag = "6")]
        LogRecord(super::LogRecord),
        /// End of a configuration stream; echoes the request nonce.
        #[prost(uint32, tag = "7")]
        ConfigCompleteId(u32),
        #[prost(bool, tag = "8")]
        Rebooted(bool),
        #[prost(message, tag = "9")]
        ModuleConfig(super::ModuleConfig),
        #[prost(message, tag = "10")]
        Channel(super::Channel),
        #[prost(message, tag = "11")]
        QueueStatus(super::QueueStatus),
        #[prost(message, tag = "13")]
        Metadata(super::DeviceMetadata),
    }
}

impl FromRadio {
    /// Short name of the active variant, for logging.
    pub fn variant_name(&self) -> &'static str {
        use from_radio::PayloadVariant as V;
        match &self.payload_variant {
            None => "empty",
            Some(V::Packet(_)) => "packet",
            Some(V::MyInfo(_)) => "my_info",
            Some(V::NodeInfo(_)) => "node_info",
            Some(V::Config(_)) => "config",
            Some(V::LogRecord(_)) => "log_record",
            Some(V::ConfigCompleteId(_)) => "config_complete_id",
            Some(V::Rebooted(_)) => "rebooted",
            Some(V::ModuleConfig(_)) => "module_config",
            Some(V::Channel(_)) => "channel",
            Some(V::QueueStatus(_)) => "queue_status",
            Some(V::Metadata(_)) => "metadata",
        }
    }

    /// The nonce carried by an end-of-config marker, if this is one.
    pub fn config_complete_id(&self) -> Option<u32> {
        match self.payload_variant {
            Some(from_radio::PayloadVariant::ConfigCompleteId(id)) => Some(id),
            _ => None,
        }
    }
}
