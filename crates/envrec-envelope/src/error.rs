use envrec_frame::FrameError;

/// A registered decoder rejected an envelope's payload.
///
/// Scoped to one envelope; the envelope itself is still delivered.
#[derive(Debug, thiserror::Error)]
#[error("payload of dataType {data_type} ({message}) failed to decode: {source}")]
pub struct PayloadDecodeError {
    /// The envelope's `dataType`.
    pub data_type: i32,
    /// Name of the message the registered decoder expected.
    pub message: &'static str,
    #[source]
    pub source: prost::DecodeError,
}

/// Errors surfaced while turning a byte stream into envelopes.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Framing failed: bad magic, oversized header, truncation or I/O.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// A complete frame body is not a valid envelope encoding.
    #[error("frame {frame_index} at offset {offset} is not a valid envelope: {source}")]
    Envelope {
        frame_index: u64,
        offset: u64,
        #[source]
        source: prost::DecodeError,
    },
}

impl StreamError {
    /// Whether decoding continues after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            StreamError::Frame(err) => err.is_recoverable(),
            StreamError::Envelope { .. } => true,
        }
    }

    /// Byte offset in the stream the error refers to, if any.
    pub fn offset(&self) -> Option<u64> {
        match self {
            StreamError::Frame(err) => err.offset(),
            StreamError::Envelope { offset, .. } => Some(*offset),
        }
    }

    /// Index of the frame the error refers to, for envelope errors.
    pub fn frame_index(&self) -> Option<u64> {
        match self {
            StreamError::Envelope { frame_index, .. } => Some(*frame_index),
            StreamError::Frame(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
