//! Magic-prefixed, length-delimited protobuf framing for mesh radio streams.
//!
//! Every envelope on the wire is framed with:
//! - A 2-byte magic number (`0x94 0xc3`) used to resynchronize after corruption
//! - A 2-byte big-endian payload length (at most [`MAX_PAYLOAD`])
//! - The protobuf-encoded envelope
//!
//! Incoming bytes are parsed one at a time by [`FrameDecoder`], so partial
//! reads, stray bytes and truncated frames never wedge the stream.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod tokio_codec;

pub use codec::{encode_frame, encode_message, FrameCodec, HEADER_SIZE, MAGIC, MAX_PAYLOAD};
pub use decoder::{DecodeState, DecoderStats, FrameDecoder};
pub use error::{FrameError, Result};
pub use reader::ReadSummary;
pub use writer::write_frame;

#[cfg(feature = "async")]
pub use tokio_codec::RadioFrameCodec;
