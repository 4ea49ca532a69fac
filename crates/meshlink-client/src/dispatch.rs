use meshlink_proto::{mesh_packet, MeshPacket, PortNum};
use serde::Serialize;
use tracing::{debug, trace};

/// Addressing shared by every inbound application packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketMeta {
    /// Sending node number.
    pub from: u32,
    /// Destination node number, or [`BROADCAST_ADDR`](meshlink_proto::BROADCAST_ADDR).
    pub to: u32,
    /// Channel index the packet arrived on.
    pub channel: u32,
    /// Packet id assigned by the sender.
    pub id: u32,
}

impl From<&MeshPacket> for PacketMeta {
    fn from(packet: &MeshPacket) -> Self {
        Self {
            from: packet.from,
            to: packet.to,
            channel: packet.channel,
            id: packet.id,
        }
    }
}

/// Receives text messages.
pub type TextHandler = Box<dyn FnMut(PacketMeta, &str)>;
/// Receives decoded payloads for any port.
pub type PortHandler = Box<dyn FnMut(PacketMeta, PortNum, &[u8])>;
/// Receives payloads the radio could not decrypt, with the packet's public key.
pub type EncryptedHandler = Box<dyn FnMut(PacketMeta, &[u8], &[u8])>;

/// Which slot handled a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Text,
    Port,
    Encrypted,
    /// No handler registered for the packet's category.
    Dropped,
}

/// Single-slot handler registry for inbound application packets.
///
/// Registering a handler replaces the previous one for that category.
/// Text messages go to the text handler when one is registered and the
/// payload is valid UTF-8; otherwise they fall through to the port handler
/// like any other decoded payload.
#[derive(Default)]
pub struct Handlers {
    text: Option<TextHandler>,
    port: Option<PortHandler>,
    encrypted: Option<EncryptedHandler>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_text<F>(&mut self, handler: F)
    where
        F: FnMut(PacketMeta, &str) + 'static,
    {
        self.text = Some(Box::new(handler));
    }

    pub fn on_port<F>(&mut self, handler: F)
    where
        F: FnMut(PacketMeta, PortNum, &[u8]) + 'static,
    {
        self.port = Some(Box::new(handler));
    }

    pub fn on_encrypted<F>(&mut self, handler: F)
    where
        F: FnMut(PacketMeta, &[u8], &[u8]) + 'static,
    {
        self.encrypted = Some(Box::new(handler));
    }

    /// Remove every registered handler.
    pub fn clear(&mut self) {
        self.text = None;
        self.port = None;
        self.encrypted = None;
    }

    /// Route `packet` to the matching handler.
    pub fn dispatch(&mut self, packet: &MeshPacket) -> Dispatched {
        let meta = PacketMeta::from(packet);
        let routed = match &packet.payload_variant {
            Some(mesh_packet::PayloadVariant::Decoded(data)) => {
                let port = PortNum::try_from(data.portnum).unwrap_or(PortNum::UnknownApp);
                self.dispatch_decoded(meta, port, &data.payload)
            }
            Some(mesh_packet::PayloadVariant::Encrypted(blob)) => match self.encrypted.as_mut() {
                Some(handler) => {
                    handler(meta, &packet.public_key, blob);
                    Dispatched::Encrypted
                }
                None => Dispatched::Dropped,
            },
            None => Dispatched::Dropped,
        };

        if routed == Dispatched::Dropped {
            trace!(from = meta.from, id = meta.id, "no handler for packet");
        }
        routed
    }

    fn dispatch_decoded(&mut self, meta: PacketMeta, port: PortNum, payload: &[u8]) -> Dispatched {
        if port == PortNum::TextMessageApp {
            if let Some(handler) = self.text.as_mut() {
                match std::str::from_utf8(payload) {
                    Ok(text) => {
                        handler(meta, text);
                        return Dispatched::Text;
                    }
                    Err(err) => debug!(from = meta.from, error = %err, "text payload is not UTF-8"),
                }
            }
        }

        match self.port.as_mut() {
            Some(handler) => {
                handler(meta, port, payload);
                Dispatched::Port
            }
            None => Dispatched::Dropped,
        }
    }
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("text", &self.text.is_some())
            .field("port", &self.port.is_some())
            .field("encrypted", &self.encrypted.is_some())
            .finish()
    }
}
