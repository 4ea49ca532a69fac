use bytes::{Buf, BytesMut};
use prost::Message;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_message, FrameCodec};
use crate::error::FrameError;

/// [`tokio_util::codec`] adapter over [`FrameCodec`].
///
/// Lets a radio stream be driven with `FramedRead`/`FramedWrite` on any
/// `AsyncRead`/`AsyncWrite`. Resynchronization and oversized-header
/// handling are identical to the blocking codec.
#[derive(Debug)]
pub struct RadioFrameCodec<Tx, Rx> {
    inner: FrameCodec<Tx, Rx>,
}

impl<Tx, Rx> RadioFrameCodec<Tx, Rx>
where
    Tx: Message,
    Rx: Message + Default,
{
    pub fn new() -> Self {
        Self {
            inner: FrameCodec::new(),
        }
    }

    /// The underlying byte-level codec.
    pub fn get_ref(&self) -> &FrameCodec<Tx, Rx> {
        &self.inner
    }
}

impl<Tx, Rx> Default for RadioFrameCodec<Tx, Rx>
where
    Tx: Message,
    Rx: Message + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Tx, Rx> Decoder for RadioFrameCodec<Tx, Rx>
where
    Tx: Message,
    Rx: Message + Default,
{
    type Item = Rx;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Some(msg) = self.inner.feed(byte) {
                return Ok(Some(msg));
            }
        }
        Ok(None)
    }
}

impl<Tx, Rx> Encoder<Tx> for RadioFrameCodec<Tx, Rx>
where
    Tx: Message,
    Rx: Message + Default,
{
    type Error = FrameError;

    fn encode(&mut self, item: Tx, dst: &mut BytesMut) -> Result<(), Self::Error> {
        encode_message(&item, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use meshlink_proto::{from_radio, FromRadio, ToRadio};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    type HostCodec = RadioFrameCodec<ToRadio, FromRadio>;
    type RadioCodec = RadioFrameCodec<FromRadio, ToRadio>;

    fn complete(id: u32) -> FromRadio {
        FromRadio {
            id,
            payload_variant: Some(from_radio::PayloadVariant::ConfigCompleteId(id)),
        }
    }

    #[test]
    fn decode_waits_for_whole_frame() {
        let mut radio = RadioCodec::new();
        let mut wire = BytesMut::new();
        radio.encode(complete(5), &mut wire).unwrap();
        let tail = wire.split_off(3);

        let mut host = HostCodec::new();
        assert_eq!(host.decode(&mut wire).unwrap(), None);
        assert!(wire.is_empty());
        assert!(host.get_ref().in_frame());

        let mut tail = tail;
        assert_eq!(host.decode(&mut tail).unwrap(), Some(complete(5)));
    }

    #[test]
    fn decode_leaves_following_frame_buffered() {
        let mut radio = RadioCodec::new();
        let mut wire = BytesMut::new();
        radio.encode(complete(1), &mut wire).unwrap();
        radio.encode(complete(2), &mut wire).unwrap();

        let mut host = HostCodec::new();
        assert_eq!(host.decode(&mut wire).unwrap(), Some(complete(1)));
        assert!(!wire.is_empty());
        assert_eq!(host.decode(&mut wire).unwrap(), Some(complete(2)));
        assert_eq!(host.decode(&mut wire).unwrap(), None);
    }

    #[tokio::test]
    async fn framed_roundtrip_over_duplex() {
        let (host_io, radio_io) = tokio::io::duplex(1024);

        let mut sink = FramedWrite::new(radio_io, RadioCodec::new());
        sink.send(complete(7)).await.unwrap();
        sink.send(complete(8)).await.unwrap();
        drop(sink);

        let mut stream = FramedRead::new(host_io, HostCodec::new());
        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.config_complete_id(), Some(7));
        assert_eq!(second.config_complete_id(), Some(8));
        assert!(stream.next().await.is_none());
    }
}
