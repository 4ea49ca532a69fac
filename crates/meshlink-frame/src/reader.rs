use meshlink_transport::RadioStream;
use prost::Message;

use crate::codec::FrameCodec;
use crate::error::Result;

/// What a single [`FrameCodec::read_from`] pass consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSummary {
    /// Bytes pulled from the stream.
    pub bytes: usize,
    /// Envelopes decoded and handed to the callback.
    pub messages: usize,
    /// The stream reported the connection closed during the pass.
    pub closed: bool,
}

impl<Tx, Rx> FrameCodec<Tx, Rx>
where
    Tx: Message,
    Rx: Message + Default,
{
    /// Drain up to `budget` buffered bytes from `stream`.
    ///
    /// Every envelope completed along the way is passed to `on_message` in
    /// arrival order. Never blocks: the pass ends as soon as the stream has
    /// nothing buffered. Bytes beyond `budget` stay in the stream.
    pub fn read_from<S, F>(
        &mut self,
        stream: &mut S,
        budget: usize,
        mut on_message: F,
    ) -> Result<ReadSummary>
    where
        S: RadioStream + ?Sized,
        F: FnMut(Rx),
    {
        let mut summary = ReadSummary::default();

        while summary.bytes < budget {
            let Some(byte) = stream.read_byte()? else {
                break;
            };
            summary.bytes += 1;
            if let Some(msg) = self.feed(byte) {
                summary.messages += 1;
                on_message(msg);
            }
        }

        summary.closed = !stream.is_connected();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use meshlink_proto::{from_radio, FromRadio, ToRadio};
    use meshlink_transport::{RadioStream, TransportError};

    use super::*;

    type HostCodec = FrameCodec<ToRadio, FromRadio>;

    /// In-memory stream that yields `input` and records writes.
    #[derive(Default)]
    struct ScriptedStream {
        input: VecDeque<u8>,
        connected: bool,
        close_when_drained: bool,
    }

    impl ScriptedStream {
        fn with_input(bytes: &[u8]) -> Self {
            Self {
                input: bytes.iter().copied().collect(),
                connected: true,
                close_when_drained: false,
            }
        }
    }

    impl RadioStream for ScriptedStream {
        fn connect(&mut self) -> meshlink_transport::Result<()> {
            self.connected = true;
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn available(&mut self) -> meshlink_transport::Result<usize> {
            Ok(self.input.len())
        }

        fn read_byte(&mut self) -> meshlink_transport::Result<Option<u8>> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            let next = self.input.pop_front();
            if next.is_none() && self.close_when_drained {
                self.connected = false;
            }
            Ok(next)
        }

        fn write(&mut self, buf: &[u8]) -> meshlink_transport::Result<usize> {
            Ok(buf.len())
        }

        fn stop(&mut self) {
            self.connected = false;
        }

        fn transport_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn complete(id: u32) -> FromRadio {
        FromRadio {
            id,
            payload_variant: Some(from_radio::PayloadVariant::ConfigCompleteId(id)),
        }
    }

    fn wire_for(messages: &[FromRadio]) -> Vec<u8> {
        let mut radio = FrameCodec::<FromRadio, ToRadio>::new();
        let mut wire = Vec::new();
        for msg in messages {
            wire.extend_from_slice(radio.encode(msg).unwrap());
        }
        wire
    }

    #[test]
    fn read_multiple_envelopes_in_order() {
        let wire = wire_for(&[complete(1), complete(2), complete(3)]);
        let mut stream = ScriptedStream::with_input(&wire);
        let mut codec = HostCodec::new();

        let mut seen = Vec::new();
        let summary = codec
            .read_from(&mut stream, usize::MAX, |msg| seen.push(msg.id))
            .unwrap();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(summary.messages, 3);
        assert_eq!(summary.bytes, wire.len());
        assert!(!summary.closed);
    }

    #[test]
    fn budget_leaves_remaining_bytes_in_stream() {
        let wire = wire_for(&[complete(1), complete(2)]);
        let half = wire.len() / 2;
        let mut stream = ScriptedStream::with_input(&wire);
        let mut codec = HostCodec::new();

        let mut seen = Vec::new();
        let first = codec
            .read_from(&mut stream, half, |msg| seen.push(msg.id))
            .unwrap();
        assert_eq!(first.bytes, half);
        assert_eq!(seen, vec![1]);

        let second = codec
            .read_from(&mut stream, usize::MAX, |msg| seen.push(msg.id))
            .unwrap();
        assert_eq!(second.bytes, wire.len() - half);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn frame_split_across_passes() {
        let wire = wire_for(&[complete(9)]);
        let mut codec = HostCodec::new();
        let mut seen = Vec::new();

        let mut stream = ScriptedStream::with_input(&wire[..3]);
        codec
            .read_from(&mut stream, usize::MAX, |msg| seen.push(msg.id))
            .unwrap();
        assert!(seen.is_empty());
        assert!(codec.in_frame());

        stream.input.extend(wire[3..].iter().copied());
        codec
            .read_from(&mut stream, usize::MAX, |msg| seen.push(msg.id))
            .unwrap();
        assert_eq!(seen, vec![9]);
    }

    #[test]
    fn closed_stream_is_reported() {
        let mut stream = ScriptedStream::with_input(&[0x00, 0x01]);
        stream.close_when_drained = true;
        let mut codec = HostCodec::new();

        let summary = codec.read_from(&mut stream, usize::MAX, |_| {}).unwrap();
        assert_eq!(summary.bytes, 2);
        assert!(summary.closed);
    }

    #[test]
    fn read_error_propagates() {
        let mut stream = ScriptedStream::default();
        let mut codec = HostCodec::new();
        let err = codec.read_from(&mut stream, 16, |_| {}).unwrap_err();
        assert!(matches!(
            err,
            crate::FrameError::Transport(TransportError::NotConnected)
        ));
    }
}
