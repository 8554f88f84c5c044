//! Envelope decoding and `dataType`-keyed payload dispatch.
//!
//! Each frame body from [`envrec_frame`] is a protobuf-encoded [`Envelope`].
//! Its `serialized_data` is a second protobuf message whose schema is picked
//! by `data_type` through a [`DecoderRegistry`]. [`EnvelopeReader`] wires
//! both steps over any `std::io::Read`.

pub mod envelope;
pub mod error;
pub mod messages;
pub mod registry;
pub mod stream;

pub use envelope::{decode_envelope, Envelope, TimeStamp};
pub use error::{PayloadDecodeError, Result, StreamError};
pub use messages::{standard_registry, GeodeticWgs84Reading, TestMessage2, TestMessage5};
pub use registry::{
    decode_known, DecodedMessage, DecoderRegistry, KnownMessage, PayloadDecoder,
    RegisteredDecoder,
};
pub use stream::{EnvelopeReader, Payload, Record, StreamStats};
