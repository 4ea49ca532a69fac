use std::marker::PhantomData;

use bytes::{BufMut, BytesMut};
use prost::Message;
use tracing::debug;

use crate::decoder::{DecoderStats, FrameDecoder};
use crate::error::{FrameError, Result};

/// Frame header: magic (2) + length (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Magic bytes that open every frame.
pub const MAGIC: [u8; 2] = [0x94, 0xc3];

/// Largest payload a frame may carry.
pub const MAX_PAYLOAD: usize = 512;

/// Encode a raw payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬────────────┬──────────────────┐
/// │ Magic (2B)   │ Length     │ Payload          │
/// │ 0x94 0xc3    │ (2B BE)    │ (Length bytes)   │
/// └──────────────┴────────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u16(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Serialize `msg` and append it to `dst` as one frame.
///
/// Nothing is appended when the message does not fit.
pub fn encode_message<M: Message>(msg: &M, dst: &mut BytesMut) -> Result<()> {
    let size = msg.encoded_len();
    if size > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size,
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + size);
    dst.put_slice(&MAGIC);
    dst.put_u16(size as u16);
    msg.encode(dst)?;
    Ok(())
}

/// Typed frame codec: encodes `Tx` envelopes and parses `Rx` envelopes.
///
/// A single instance owns both the transmit buffer and the receive state
/// machine. Every operation takes `&mut self`, so an encode can never
/// interleave with an in-progress decode.
pub struct FrameCodec<Tx, Rx> {
    decoder: FrameDecoder,
    tx: BytesMut,
    decode_errors: u64,
    _marker: PhantomData<fn(Tx) -> Rx>,
}

impl<Tx, Rx> Default for FrameCodec<Tx, Rx>
where
    Tx: Message,
    Rx: Message + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Tx, Rx> FrameCodec<Tx, Rx>
where
    Tx: Message,
    Rx: Message + Default,
{
    pub fn new() -> Self {
        Self {
            decoder: FrameDecoder::new(),
            tx: BytesMut::with_capacity(HEADER_SIZE + MAX_PAYLOAD),
            decode_errors: 0,
            _marker: PhantomData,
        }
    }

    /// Encode `msg` into a complete frame.
    ///
    /// The returned slice borrows the codec's transmit buffer and is
    /// overwritten by the next call.
    pub fn encode(&mut self, msg: &Tx) -> Result<&[u8]> {
        self.tx.clear();
        encode_message(msg, &mut self.tx)?;
        Ok(&self.tx[..])
    }

    /// Feed one received byte.
    ///
    /// Returns an envelope when `byte` completes a frame whose payload
    /// decodes. Undecodable payloads are dropped and parsing continues.
    pub fn feed(&mut self, byte: u8) -> Option<Rx> {
        let payload = self.decoder.feed(byte)?;
        match Rx::decode(payload) {
            Ok(msg) => Some(msg),
            Err(err) => {
                self.decode_errors += 1;
                debug!(len = payload.len(), error = %err, "dropping undecodable frame");
                None
            }
        }
    }

    /// Feed a run of bytes, collecting every envelope they complete.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Vec<Rx> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Whether a received frame is partially assembled.
    pub fn in_frame(&self) -> bool {
        self.decoder.in_frame()
    }

    /// Drop any partially received frame.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Framing counters from the receive side.
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Complete frames whose payload failed to decode.
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors
    }
}

impl<Tx, Rx> std::fmt::Debug for FrameCodec<Tx, Rx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCodec")
            .field("decoder", &self.decoder)
            .field("decode_errors", &self.decode_errors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshlink_proto::{
        from_radio, mesh_packet, Data, FromRadio, MeshPacket, NodeInfo, PortNum, ToRadio, User,
    };

    type HostCodec = FrameCodec<ToRadio, FromRadio>;
    type RadioCodec = FrameCodec<FromRadio, ToRadio>;

    #[test]
    fn test_encode_frame_header() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &mut buf).unwrap();

        assert_eq!(&buf[..4], &[0x94, 0xc3, 0x00, 0x05]);
        assert_eq!(&buf[4..], b"hello");
    }

    #[test]
    fn test_encode_frame_payload_too_large() {
        let mut buf = BytesMut::new();
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let result = encode_frame(&payload, &mut buf);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_length_is_big_endian() {
        let mut buf = BytesMut::new();
        let payload = vec![7u8; 300];
        encode_frame(&payload, &mut buf).unwrap();
        assert_eq!(&buf[2..4], &[0x01, 0x2c]);
        assert_eq!(buf.len(), HEADER_SIZE + 300);
    }

    #[test]
    fn test_envelope_survives_bytewise_feed() {
        let mut host = HostCodec::new();
        let mut radio = RadioCodec::new();

        let inbound = FromRadio {
            id: 12,
            payload_variant: Some(from_radio::PayloadVariant::NodeInfo(NodeInfo {
                num: 0xdead_beef,
                user: Some(User {
                    long_name: "Base Camp".to_string(),
                    short_name: "BC".to_string(),
                    ..User::default()
                }),
                ..NodeInfo::default()
            })),
        };
        let wire = radio.encode(&inbound).unwrap().to_vec();

        let mut received = Vec::new();
        for &b in &wire {
            if let Some(msg) = host.feed(b) {
                received.push(msg);
            }
        }
        assert_eq!(received, vec![inbound]);
    }

    #[test]
    fn test_garbage_then_frame_recovers() {
        let mut host = HostCodec::new();
        let mut radio = RadioCodec::new();
        let inbound = FromRadio {
            id: 1,
            payload_variant: Some(from_radio::PayloadVariant::ConfigCompleteId(42)),
        };

        let mut wire = vec![0x13, 0x37, 0x94, 0x00, 0xc3, 0x94, 0x94];
        wire.extend_from_slice(radio.encode(&inbound).unwrap());

        assert_eq!(host.feed_slice(&wire), vec![inbound]);
    }

    #[test]
    fn test_undecodable_payload_is_dropped() {
        let mut host = HostCodec::new();
        let mut radio = RadioCodec::new();

        // field 2 length-delimited claiming 10 bytes with only 1 present
        let mut wire = vec![0x94, 0xc3, 0x00, 0x02, 0x12, 0x0a];
        let good = FromRadio {
            id: 3,
            payload_variant: Some(from_radio::PayloadVariant::Rebooted(true)),
        };
        wire.extend_from_slice(radio.encode(&good).unwrap());

        assert_eq!(host.feed_slice(&wire), vec![good]);
        assert_eq!(host.decode_errors(), 1);
        assert_eq!(host.stats().frames, 2);
    }

    #[test]
    fn test_encode_rejects_oversized_envelope() {
        let mut host = HostCodec::new();
        let packet = MeshPacket {
            payload_variant: Some(mesh_packet::PayloadVariant::Decoded(Data {
                portnum: PortNum::PrivateApp as i32,
                payload: vec![0x55; 600],
                ..Data::default()
            })),
            ..MeshPacket::default()
        };

        let result = host.encode(&ToRadio::packet(packet));
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { max: 512, .. })));
    }

    #[test]
    fn test_encode_does_not_disturb_partial_receive() {
        let mut host = HostCodec::new();
        let mut radio = RadioCodec::new();
        let inbound = FromRadio {
            id: 8,
            payload_variant: Some(from_radio::PayloadVariant::ConfigCompleteId(8)),
        };
        let wire = radio.encode(&inbound).unwrap().to_vec();
        let (head, tail) = wire.split_at(3);

        assert!(host.feed_slice(head).is_empty());
        assert!(host.in_frame());
        host.encode(&ToRadio::heartbeat(0)).unwrap();
        assert_eq!(host.feed_slice(tail), vec![inbound]);
    }

    #[test]
    fn test_encode_buffer_is_reused() {
        let mut host = HostCodec::new();
        let first = host.encode(&ToRadio::want_config(1)).unwrap().to_vec();
        let second = host.encode(&ToRadio::heartbeat(0)).unwrap().to_vec();

        assert_eq!(first, vec![0x94, 0xc3, 0x00, 0x02, 0x18, 0x01]);
        assert_eq!(second, vec![0x94, 0xc3, 0x00, 0x02, 0x3a, 0x00]);
    }
}
