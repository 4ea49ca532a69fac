use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{MAGIC, MAX_PAYLOAD};

/// Position of the decoder within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Looking for the first magic byte.
    ScanMagic0,
    /// First magic byte seen; expecting the second.
    ScanMagic1,
    /// Expecting the high byte of the payload length.
    ReadLenHi,
    /// Expecting the low byte of the payload length.
    ReadLenLo { hi: u8 },
    /// Accumulating `len` payload bytes.
    ReadPayload { len: usize },
}

/// Counters for framing anomalies seen by a [`FrameDecoder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Complete frames assembled.
    pub frames: u64,
    /// Bytes discarded while hunting for the magic number.
    pub skipped_bytes: u64,
    /// Headers rejected because the length exceeded [`MAX_PAYLOAD`].
    pub oversized: u64,
}

/// Byte-at-a-time frame parser.
///
/// Owns the receive buffer. A completed payload is lent out by
/// [`feed`](FrameDecoder::feed) and stays valid until the next call.
#[derive(Debug)]
pub struct FrameDecoder {
    state: DecodeState,
    buf: BytesMut,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: DecodeState::ScanMagic0,
            buf: BytesMut::with_capacity(MAX_PAYLOAD),
            stats: DecoderStats::default(),
        }
    }

    /// Advance the parser by one byte.
    ///
    /// Returns the payload of a frame when `byte` completes one. Bad magic
    /// and oversized lengths reset the parser to scanning.
    pub fn feed(&mut self, byte: u8) -> Option<&[u8]> {
        match self.state {
            DecodeState::ScanMagic0 => {
                if byte == MAGIC[0] {
                    self.state = DecodeState::ScanMagic1;
                } else {
                    self.stats.skipped_bytes += 1;
                }
                None
            }
            DecodeState::ScanMagic1 => {
                if byte == MAGIC[1] {
                    self.state = DecodeState::ReadLenHi;
                } else {
                    // The mismatching byte may itself start the next frame.
                    self.stats.skipped_bytes += 1;
                    self.restart_with(byte);
                }
                None
            }
            DecodeState::ReadLenHi => {
                self.state = DecodeState::ReadLenLo { hi: byte };
                None
            }
            DecodeState::ReadLenLo { hi } => {
                let len = u16::from_be_bytes([hi, byte]) as usize;
                if len > MAX_PAYLOAD {
                    debug!(len, max = MAX_PAYLOAD, "oversized frame header, resyncing");
                    self.stats.oversized += 1;
                    self.state = DecodeState::ScanMagic0;
                    return None;
                }
                self.buf.clear();
                if len == 0 {
                    return Some(self.complete());
                }
                self.state = DecodeState::ReadPayload { len };
                None
            }
            DecodeState::ReadPayload { len } => {
                self.buf.extend_from_slice(&[byte]);
                if self.buf.len() < len {
                    return None;
                }
                Some(self.complete())
            }
        }
    }

    /// Current parser state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Whether a frame is partially assembled.
    pub fn in_frame(&self) -> bool {
        self.state != DecodeState::ScanMagic0
    }

    /// Drop any partial frame and return to scanning.
    pub fn reset(&mut self) {
        if self.in_frame() {
            trace!(state = ?self.state, "discarding partial frame");
        }
        self.state = DecodeState::ScanMagic0;
        self.buf.clear();
    }

    /// Anomaly counters since construction.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn restart_with(&mut self, byte: u8) {
        self.state = if byte == MAGIC[0] {
            DecodeState::ScanMagic1
        } else {
            DecodeState::ScanMagic0
        };
    }

    fn complete(&mut self) -> &[u8] {
        self.state = DecodeState::ScanMagic0;
        self.stats.frames += 1;
        &self.buf[..]
    }
}
