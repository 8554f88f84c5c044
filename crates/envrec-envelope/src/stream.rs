use std::io::Read;

use envrec_frame::{Frame, FrameConfig, FrameError, FrameReader};
use tracing::{debug, trace};

use crate::envelope::{decode_envelope, Envelope};
use crate::error::{PayloadDecodeError, Result, StreamError};
use crate::registry::{DecodedMessage, DecoderRegistry};

/// Outcome of payload dispatch for one envelope.
#[derive(Debug)]
pub enum Payload {
    /// A registered decoder produced a message.
    Decoded(Box<dyn DecodedMessage>),
    /// No decoder is registered for the envelope's `dataType`.
    Unknown,
    /// The registered decoder rejected the payload bytes.
    Failed(PayloadDecodeError),
}

impl Payload {
    pub fn decoded(&self) -> Option<&dyn DecodedMessage> {
        match self {
            Payload::Decoded(message) => Some(message.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PayloadDecodeError> {
        match self {
            Payload::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// One decoded envelope with its position in the stream.
#[derive(Debug)]
pub struct Record {
    pub frame_index: u64,
    /// Stream offset of the frame header.
    pub offset: u64,
    pub envelope: Envelope,
    pub payload: Payload,
}

/// Running counters kept by [`EnvelopeReader`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub frames: u64,
    pub envelopes: u64,
    pub decoded_payloads: u64,
    pub unknown_payloads: u64,
    pub failed_payloads: u64,
    pub invalid_envelopes: u64,
    pub framing_errors: u64,
    /// Bytes dropped while resynchronising or discarded as a truncated tail.
    pub skipped_bytes: u64,
    pub truncations: u64,
}

impl StreamStats {
    /// Count of every non-fatal problem seen.
    pub fn error_count(&self) -> u64 {
        self.failed_payloads + self.invalid_envelopes + self.framing_errors + self.truncations
    }
}

/// Decodes envelopes, and their payloads, from any `Read` source.
///
/// Iterates `Result<Record, StreamError>` in stream order. Every error
/// except [`FrameError::Io`] is recoverable and iteration simply continues;
/// the sequence ends when the source is exhausted or fails.
pub struct EnvelopeReader<'r, R> {
    frames: FrameReader<R>,
    registry: &'r DecoderRegistry,
    stats: StreamStats,
}

impl<'r, R: Read> EnvelopeReader<'r, R> {
    /// Create a reader with default frame configuration.
    pub fn new(inner: R, registry: &'r DecoderRegistry) -> Self {
        Self::with_config(inner, registry, FrameConfig::default())
    }

    /// Create a reader with explicit frame configuration.
    pub fn with_config(inner: R, registry: &'r DecoderRegistry, config: FrameConfig) -> Self {
        Self {
            frames: FrameReader::with_config(inner, config),
            registry,
            stats: StreamStats::default(),
        }
    }

    /// Read the next record or error (blocking).
    pub fn read_record(&mut self) -> Option<Result<Record>> {
        let result = match self.frames.read_frame()? {
            Ok(frame) => self.decode_frame(frame),
            Err(err) => {
                self.count_frame_error(&err);
                Err(StreamError::Frame(err))
            }
        };
        Some(result)
    }

    /// Counters for everything read so far.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// The registry payloads are dispatched through.
    pub fn registry(&self) -> &'r DecoderRegistry {
        self.registry
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> R {
        self.frames.into_inner()
    }

    fn decode_frame(&mut self, frame: Frame) -> Result<Record> {
        self.stats.frames += 1;

        let envelope = match decode_envelope(&frame.body) {
            Ok(envelope) => envelope,
            Err(source) => {
                self.stats.invalid_envelopes += 1;
                debug!(
                    frame_index = frame.index,
                    offset = frame.offset,
                    error = %source,
                    "frame is not a valid envelope"
                );
                return Err(StreamError::Envelope {
                    frame_index: frame.index,
                    offset: frame.offset,
                    source,
                });
            }
        };
        self.stats.envelopes += 1;

        let payload = match self
            .registry
            .dispatch(envelope.data_type, envelope.payload())
        {
            Ok(Some(message)) => {
                self.stats.decoded_payloads += 1;
                Payload::Decoded(message)
            }
            Ok(None) => {
                self.stats.unknown_payloads += 1;
                trace!(data_type = envelope.data_type, "no decoder registered");
                Payload::Unknown
            }
            Err(err) => {
                self.stats.failed_payloads += 1;
                debug!(frame_index = frame.index, error = %err, "payload decode failed");
                Payload::Failed(err)
            }
        };

        Ok(Record {
            frame_index: frame.index,
            offset: frame.offset,
            envelope,
            payload,
        })
    }

    fn count_frame_error(&mut self, err: &FrameError) {
        match err {
            FrameError::InvalidMagic { .. } | FrameError::BodyTooLarge { .. } => {
                self.stats.framing_errors += 1;
                self.stats.skipped_bytes += 1;
            }
            FrameError::Truncated { buffered, .. } => {
                self.stats.truncations += 1;
                self.stats.skipped_bytes += *buffered as u64;
            }
            FrameError::Io(_) => {}
        }
    }
}

impl<R: Read> Iterator for EnvelopeReader<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record()
    }
}
