use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + body length (3) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Magic bytes opening every frame.
pub const MAGIC: [u8; 2] = [0x0D, 0xA4];

/// Largest body the 24-bit length field can describe.
pub const MAX_BODY_SIZE: usize = (1 << 24) - 1;

/// Default read size used by [`crate::FrameReader`].
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// One complete frame body cut out of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based position of this frame among the frames emitted so far.
    pub index: u64,
    /// Stream offset of the frame header.
    pub offset: u64,
    /// The frame body (an encoded envelope).
    pub body: Bytes,
}

impl Frame {
    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.body.len()
    }
}

/// Parse the body length from a 5-byte header.
///
/// Returns `None` when the magic does not match.
pub fn parse_header(header: &[u8; HEADER_SIZE]) -> Option<usize> {
    if header[0..2] != MAGIC {
        return None;
    }
    Some(body_length(header[2], header[3], header[4]))
}

/// 24-bit little-endian body length.
pub(crate) fn body_length(low: u8, mid: u8, high: u8) -> usize {
    usize::from(low) | (usize::from(mid) << 8) | (usize::from(high) << 16)
}

/// Append a frame around `body` to `dst`.
///
/// Recordings are never written by this crate; this exists to build fixtures.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────┐
/// │ Magic (2B)   │ Length       │ Body             │
/// │ 0x0D 0xA4    │ (3B LE)      │ (Length bytes)   │
/// └──────────────┴──────────────┴──────────────────┘
/// ```
///
/// Returns [`FrameError::BodyTooLarge`] (at offset 0) when `body` does not
/// fit the 24-bit length field; `dst` is left untouched in that case.
pub fn encode_frame(body: &[u8], dst: &mut BytesMut) -> Result<()> {
    if body.len() > MAX_BODY_SIZE {
        return Err(FrameError::BodyTooLarge {
            offset: 0,
            size: body.len(),
            max: MAX_BODY_SIZE,
        });
    }

    let len = body.len() as u32;
    dst.reserve(HEADER_SIZE + body.len());
    dst.put_slice(&MAGIC);
    dst.put_slice(&len.to_le_bytes()[..3]);
    dst.put_slice(body);
    Ok(())
}

/// Configuration for frame decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Largest accepted body. Default: [`MAX_BODY_SIZE`].
    pub max_body_size: usize,
    /// Bytes requested per `read` call on the source.
    pub read_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_body_size: MAX_BODY_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
