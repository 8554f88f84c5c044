use std::fmt;

use prost::Message;
use serde::Serialize;

/// Seconds plus microseconds since the Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Message, Serialize)]
pub struct TimeStamp {
    #[prost(sint32, tag = "1")]
    pub seconds: i32,
    #[prost(sint32, tag = "2")]
    pub microseconds: i32,
}

impl TimeStamp {
    pub fn new(seconds: i32, microseconds: i32) -> Self {
        Self {
            seconds,
            microseconds,
        }
    }

    /// Total microseconds since the epoch.
    pub fn as_micros(&self) -> i64 {
        i64::from(self.seconds) * 1_000_000 + i64::from(self.microseconds)
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.seconds, self.microseconds)
    }
}

/// One recorded event: metadata plus the encoded payload.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    /// Identifier of the payload schema.
    #[prost(sint32, tag = "1")]
    pub data_type: i32,
    /// Encoded payload; its schema is selected by `data_type`.
    #[prost(bytes = "vec", tag = "2")]
    pub serialized_data: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub sent: Option<TimeStamp>,
    #[prost(message, optional, tag = "4")]
    pub received: Option<TimeStamp>,
    #[prost(message, optional, tag = "5")]
    pub sample_time_stamp: Option<TimeStamp>,
    #[prost(uint32, tag = "6")]
    pub sender_stamp: u32,
}

impl Envelope {
    /// The encoded payload.
    pub fn payload(&self) -> &[u8] {
        &self.serialized_data
    }

    /// `sent`, or the epoch when absent.
    pub fn sent(&self) -> TimeStamp {
        self.sent.unwrap_or_default()
    }

    /// `received`, or the epoch when absent.
    pub fn received(&self) -> TimeStamp {
        self.received.unwrap_or_default()
    }

    /// `sample_time_stamp`, or the epoch when absent.
    pub fn sample_time_stamp(&self) -> TimeStamp {
        self.sample_time_stamp.unwrap_or_default()
    }
}

/// Decode one frame body into an [`Envelope`].
///
/// All or nothing: a malformed body yields no partial envelope.
pub fn decode_envelope(body: &[u8]) -> Result<Envelope, prost::DecodeError> {
    Envelope::decode(body)
}
