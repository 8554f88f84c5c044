/// Errors reported while splitting a byte stream into frames.
///
/// Everything except [`FrameError::Io`] is recoverable: the decoder has
/// already resynchronised (or, for truncation, reached the end) by the time
/// the error is handed out.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The bytes at `offset` are not the frame magic `0x0D 0xA4`.
    #[error("invalid frame magic at offset {offset} (found {:#04x} {:#04x}, expected 0x0d 0xa4)", .found[0], .found[1])]
    InvalidMagic { offset: u64, found: [u8; 2] },

    /// A header at `offset` announced a body larger than the configured maximum.
    #[error("frame at offset {offset} announces {size} byte body (max {max})")]
    BodyTooLarge { offset: u64, size: usize, max: usize },

    /// The stream ended before the frame starting at `offset` was complete.
    #[error("stream ended mid-frame at offset {offset} ({buffered} of {expected} bytes)")]
    Truncated {
        offset: u64,
        expected: usize,
        buffered: usize,
    },

    /// An I/O error occurred while reading from the byte source.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether decoding can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FrameError::Io(_))
    }

    /// Byte offset in the stream the error refers to, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            FrameError::InvalidMagic { offset, .. }
            | FrameError::BodyTooLarge { offset, .. }
            | FrameError::Truncated { offset, .. } => Some(*offset),
            FrameError::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
