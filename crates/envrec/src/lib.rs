//! Decode recordings made of framed, protobuf-encoded envelopes.
//!
//! # Crate Structure
//!
//! - [`frame`]: Incremental splitting of a byte stream into frames
//! - [`envelope`]: Envelope decoding, payload registry and the record stream
//!
//! The `envrec` binary (behind the `cli` feature) prints recordings as
//! JSON, tables or the classic text layout.

/// Re-export frame types.
pub mod frame {
    pub use envrec_frame::*;
}

/// Re-export envelope types.
pub mod envelope {
    pub use envrec_envelope::*;
}
