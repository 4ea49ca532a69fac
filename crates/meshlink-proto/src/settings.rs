//! Configuration records streamed during a node report.
//!
//! Section bodies are kept as raw protobuf bytes: the client routes these
//! records but never interprets their fields.

/// Device configuration section. Exactly one section per record.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Config {
    #[prost(oneof = "config::PayloadVariant", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10")]
    pub payload_variant: ::core::option::Option<config::PayloadVariant>,
}

pub mod config {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(bytes = "vec", tag = "1")]
        Device(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "2")]
        Position(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "3")]
        Power(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "4")]
        Network(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "5")]
        Display(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "6")]
        Lora(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "7")]
        Bluetooth(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "8")]
        Security(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "9")]
        Sessionkey(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "10")]
        DeviceUi(::prost::alloc::vec::Vec<u8>),
    }
}

impl Config {
    /// Name of the section this record carries.
    pub fn section(&self) -> &'static str {
        use config::PayloadVariant as V;
        match &self.payload_variant {
            None => "none",
            Some(V::Device(_)) => "device",
            Some(V::Position(_)) => "position",
            Some(V::Power(_)) => "power",
            Some(V::Network(_)) => "network",
            Some(V::Display(_)) => "display",
            Some(V::Lora(_)) => "lora",
            Some(V::Bluetooth(_)) => "bluetooth",
            Some(V::Security(_)) => "security",
            Some(V::Sessionkey(_)) => "sessionkey",
            Some(V::DeviceUi(_)) => "device_ui",
        }
    }
}

/// Module configuration section.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModuleConfig {
    #[prost(
        oneof = "module_config::PayloadVariant",
        tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13"
    )]
    pub payload_variant: ::core::option::Option<module_config::PayloadVariant>,
}

pub mod module_config {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum PayloadVariant {
        #[prost(bytes = "vec", tag = "1")]
        Mqtt(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "2")]
        Serial(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "3")]
        ExternalNotification(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "4")]
        StoreForward(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "5")]
        RangeTest(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "6")]
        Telemetry(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "7")]
        CannedMessage(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "8")]
        Audio(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "9")]
        RemoteHardware(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "10")]
        NeighborInfo(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "11")]
        AmbientLighting(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "12")]
        DetectionSensor(::prost::alloc::vec::Vec<u8>),
        #[prost(bytes = "vec", tag = "13")]
        Paxcounter(::prost::alloc::vec::Vec<u8>),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChannelRole {
    Disabled = 0,
    Primary = 1,
    Secondary = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChannelSettings {
    #[prost(bytes = "vec", tag = "2")]
    pub psk: ::prost::alloc::vec::Vec<u8>,
    #[prost(string, tag = "3")]
    pub name: ::prost::alloc::string::String,
    #[prost(fixed32, tag = "4")]
    pub id: u32,
    #[prost(bool, tag = "5")]
    pub uplink_enabled: bool,
    #[prost(bool, tag = "6")]
    pub downlink_enabled: bool,
}

/// One channel slot of the radio.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Channel {
    #[prost(int32, tag = "1")]
    pub index: i32,
    #[prost(message, optional, tag = "2")]
    pub settings: ::core::option::Option<ChannelSettings>,
    #[prost(enumeration = "ChannelRole", tag = "3")]
    pub role: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum LogLevel {
    Unset = 0,
    Trace = 5,
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

/// Log line forwarded by the radio firmware.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogRecord {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
    #[prost(fixed32, tag = "2")]
    pub time: u32,
    #[prost(string, tag = "3")]
    pub source: ::prost::alloc::string::String,
    #[prost(enumeration = "LogLevel", tag = "4")]
    pub level: i32,
}
