use std::io::{ErrorKind, Read};

use tracing::debug;

use crate::codec::{Frame, FrameConfig};
use crate::decoder::FrameDecoder;
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` source.
///
/// Iterates `Result<Frame>` in stream order. Recoverable errors are yielded
/// inline and iteration continues; at end of input a trailing partial frame
/// is reported once as [`FrameError::Truncated`]. An I/O error is yielded
/// once and ends the iteration.
pub struct FrameReader<T> {
    inner: T,
    decoder: FrameDecoder,
    chunk: Vec<u8>,
    done: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            decoder: FrameDecoder::with_config(config),
            chunk: vec![0u8; config.read_chunk_size.max(1)],
            done: false,
        }
    }

    /// Read the next frame or recoverable error (blocking).
    ///
    /// Returns `None` once the source is exhausted.
    pub fn read_frame(&mut self) -> Option<Result<Frame>> {
        loop {
            if let Some(result) = self.decoder.decode_next() {
                return Some(result);
            }
            if self.done {
                return None;
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(FrameError::Io(err)));
                }
            };

            if read == 0 {
                self.done = true;
                debug!(
                    position = self.decoder.position(),
                    frames = self.decoder.frames_emitted(),
                    "end of input"
                );
                return self.decoder.finish().map(Err);
            }

            self.decoder.extend(&self.chunk[..read]);
        }
    }

    /// Stream offset of the first byte not yet turned into a frame.
    pub fn position(&self) -> u64 {
        self.decoder.position()
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        self.decoder.config()
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame()
    }
}
