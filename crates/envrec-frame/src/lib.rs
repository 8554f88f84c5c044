//! Incremental decoding of length-prefixed envelope frames.
//!
//! A recording is a plain concatenation of frames. Every frame is:
//! - A 2-byte magic number (`0x0D 0xA4`) for stream synchronization
//! - A 3-byte little-endian body length
//! - The body itself, one encoded envelope
//!
//! [`FrameDecoder`] is the sans-io state machine; [`FrameReader`] drives it
//! from any `std::io::Read`.

pub mod codec;
pub mod decoder;
pub mod error;
pub mod reader;

pub use codec::{
    encode_frame, parse_header, Frame, FrameConfig, DEFAULT_READ_CHUNK_SIZE, HEADER_SIZE, MAGIC,
    MAX_BODY_SIZE,
};
pub use decoder::{FrameDecoder, Frames};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
