use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::codec::{body_length, Frame, FrameConfig, HEADER_SIZE, MAGIC};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingHeader,
    AwaitingBody { offset: u64, len: usize },
}

/// Sans-io frame splitter.
///
/// Bytes go in through [`feed`](Self::feed) in chunks of any size; complete
/// frame bodies come out in stream order. The output does not depend on how
/// the input was chunked.
///
/// On bad magic the decoder drops a single byte and tries again, so a
/// corrupted region costs one [`FrameError::InvalidMagic`] per skipped byte
/// and the next intact header is still found.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    state: State,
    /// Stream offset of `buf[0]`.
    position: u64,
    frames: u64,
    config: FrameConfig,
}

impl FrameDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            state: State::AwaitingHeader,
            position: 0,
            frames: 0,
            config,
        }
    }

    /// Append `chunk` and drain every frame it completes.
    ///
    /// The returned iterator is lazy; bytes not drained stay buffered and
    /// come out of the next call to [`decode_next`](Self::decode_next).
    pub fn feed(&mut self, chunk: &[u8]) -> Frames<'_> {
        self.extend(chunk);
        Frames { decoder: self }
    }

    /// Append `chunk` without decoding.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Try to cut the next frame out of the buffer.
    ///
    /// Returns `None` when more bytes are needed. Errors returned here are
    /// all recoverable; call again to continue.
    pub fn decode_next(&mut self) -> Option<Result<Frame>> {
        loop {
            match self.state {
                State::AwaitingHeader => {
                    if self.buf.len() < HEADER_SIZE {
                        return None;
                    }

                    let offset = self.position;
                    if self.buf[0..2] != MAGIC {
                        let found = [self.buf[0], self.buf[1]];
                        self.skip(1);
                        trace!(offset, "bad frame magic, skipping one byte");
                        return Some(Err(FrameError::InvalidMagic { offset, found }));
                    }

                    let len = body_length(self.buf[2], self.buf[3], self.buf[4]);
                    if len > self.config.max_body_size {
                        self.skip(1);
                        trace!(offset, len, "oversized frame, skipping one byte");
                        return Some(Err(FrameError::BodyTooLarge {
                            offset,
                            size: len,
                            max: self.config.max_body_size,
                        }));
                    }

                    self.skip(HEADER_SIZE);
                    self.state = State::AwaitingBody { offset, len };
                }
                State::AwaitingBody { offset, len } => {
                    if self.buf.len() < len {
                        return None;
                    }

                    let body = self.buf.split_to(len).freeze();
                    self.position += len as u64;
                    self.state = State::AwaitingHeader;

                    let index = self.frames;
                    self.frames += 1;
                    trace!(index, offset, len, "frame complete");
                    return Some(Ok(Frame {
                        index,
                        offset,
                        body,
                    }));
                }
            }
        }
    }

    /// Signal end of input.
    ///
    /// Returns [`FrameError::Truncated`] when an incomplete frame was still
    /// buffered; that tail is discarded. The decoder is reset to an empty
    /// buffer either way. Drain [`decode_next`](Self::decode_next) before
    /// calling this, or complete frames still in the buffer are lost too.
    pub fn finish(&mut self) -> Option<FrameError> {
        let buffered = self.buf.len();
        let err = match self.state {
            State::AwaitingHeader if buffered == 0 => None,
            State::AwaitingHeader => Some(FrameError::Truncated {
                offset: self.position,
                expected: HEADER_SIZE,
                buffered,
            }),
            State::AwaitingBody { offset, len } => Some(FrameError::Truncated {
                offset,
                expected: HEADER_SIZE + len,
                buffered: HEADER_SIZE + buffered,
            }),
        };

        self.skip(buffered);
        self.state = State::AwaitingHeader;
        err
    }

    /// Number of bytes buffered but not yet emitted.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Stream offset of the first buffered byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of frames emitted so far.
    pub fn frames_emitted(&self) -> u64 {
        self.frames
    }

    /// Whether the decoder sits between a parsed header and its body.
    pub fn is_mid_frame(&self) -> bool {
        matches!(self.state, State::AwaitingBody { .. })
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn skip(&mut self, n: usize) {
        self.buf.advance(n);
        self.position += n as u64;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Draining iterator returned by [`FrameDecoder::feed`].
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Frames<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.decode_next()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::prelude::*;

    use super::*;
    use crate::codec::encode_frame;

    fn wire(bodies: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for body in bodies {
            encode_frame(body, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    fn bodies(results: Vec<Result<Frame>>) -> Vec<Vec<u8>> {
        results
            .into_iter()
            .map(|r| r.unwrap().body.to_vec())
            .collect()
    }

    #[test]
    fn single_frame_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let out: Vec<_> = decoder
            .feed(&[0x0D, 0xA4, 0x03, 0x00, 0x00, 0xAA, 0xBB, 0xCC])
            .collect();

        assert_eq!(out.len(), 1);
        let frame = out.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(frame.offset, 0);
        assert_eq!(frame.body.as_ref(), &[0xAA, 0xBB, 0xCC]);
        assert_eq!(decoder.buffered(), 0);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn empty_body_is_emitted_immediately() {
        let mut decoder = FrameDecoder::new();
        let out: Vec<_> = decoder.feed(&[0x0D, 0xA4, 0x00, 0x00, 0x00]).collect();

        assert_eq!(bodies(out), vec![Vec::<u8>::new()]);
        assert!(!decoder.is_mid_frame());
    }

    #[test]
    fn multiple_frames_keep_order_and_offsets() {
        let bytes = wire(&[b"one", b"", b"three"]);
        let mut decoder = FrameDecoder::new();
        let frames: Vec<Frame> = decoder.feed(&bytes).map(|r| r.unwrap()).collect();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].body.as_ref(), b"one");
        assert_eq!(frames[1].body.as_ref(), b"");
        assert_eq!(frames[2].body.as_ref(), b"three");
        assert_eq!(
            frames.iter().map(|f| f.offset).collect::<Vec<_>>(),
            vec![0, 8, 13]
        );
        assert_eq!(
            frames.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(decoder.position(), bytes.len() as u64);
    }

    #[test]
    fn header_split_across_chunks() {
        let bytes = wire(&[b"split"]);
        let mut decoder = FrameDecoder::new();

        assert_eq!(decoder.feed(&bytes[..2]).count(), 0);
        assert_eq!(decoder.feed(&bytes[2..4]).count(), 0);
        assert!(!decoder.is_mid_frame());
        assert_eq!(decoder.feed(&bytes[4..7]).count(), 0);
        assert!(decoder.is_mid_frame());

        let out: Vec<_> = decoder.feed(&bytes[7..]).collect();
        assert_eq!(bodies(out), vec![b"split".to_vec()]);
    }

    #[test]
    fn bad_magic_resyncs_one_byte_at_a_time() {
        let mut bytes = vec![0x01, 0x02, 0x03];
        bytes.extend(wire(&[b"payload"]));

        let mut decoder = FrameDecoder::new();
        let out: Vec<_> = decoder.feed(&bytes).collect();

        assert_eq!(out.len(), 4);
        for (i, result) in out[..3].iter().enumerate() {
            match result {
                Err(FrameError::InvalidMagic { offset, .. }) => assert_eq!(*offset, i as u64),
                other => panic!("expected InvalidMagic, got {other:?}"),
            }
        }
        let frame = out[3].as_ref().unwrap();
        assert_eq!(frame.offset, 3);
        assert_eq!(frame.index, 0);
        assert_eq!(frame.body.as_ref(), b"payload");
    }

    #[test]
    fn bad_magic_reports_found_bytes() {
        let mut decoder = FrameDecoder::new();
        let first = decoder.feed(&[0x0D, 0xA5, 0, 0, 0]).next().unwrap();

        assert!(matches!(
            first,
            Err(FrameError::InvalidMagic {
                offset: 0,
                found: [0x0D, 0xA5]
            })
        ));
        assert_eq!(decoder.buffered(), 4);
    }

    #[test]
    fn garbage_header_never_yields_a_frame() {
        let mut decoder = FrameDecoder::new();
        let out: Vec<_> = decoder.feed(&[0xFF; 16]).collect();

        assert_eq!(out.len(), 12);
        assert!(out
            .iter()
            .all(|r| matches!(r, Err(FrameError::InvalidMagic { .. }))));
        assert_eq!(decoder.frames_emitted(), 0);
        assert_eq!(decoder.buffered(), HEADER_SIZE - 1);
        assert!(matches!(
            decoder.finish(),
            Some(FrameError::Truncated {
                offset: 12,
                expected: HEADER_SIZE,
                buffered: 4
            })
        ));
    }

    #[test]
    fn oversized_body_resyncs() {
        let cfg = FrameConfig {
            max_body_size: 4,
            ..FrameConfig::default()
        };
        let mut bytes = vec![0x0D, 0xA4, 0x10, 0x00, 0x00];
        bytes.extend(wire(&[b"ok"]));

        let mut decoder = FrameDecoder::with_config(cfg);
        let out: Vec<_> = decoder.feed(&bytes).collect();

        assert!(matches!(
            out[0],
            Err(FrameError::BodyTooLarge {
                offset: 0,
                size: 16,
                max: 4
            })
        ));
        let frame = out.last().unwrap().as_ref().unwrap();
        assert_eq!(frame.offset, 5);
        assert_eq!(frame.body.as_ref(), b"ok");
    }

    #[test]
    fn truncated_body_reported_on_finish() {
        let mut decoder = FrameDecoder::new();
        let emitted = decoder
            .feed(&[0x0D, 0xA4, 0x05, 0x00, 0x00, 0x01, 0x02])
            .count();

        assert_eq!(emitted, 0);
        assert!(matches!(
            decoder.finish(),
            Some(FrameError::Truncated {
                offset: 0,
                expected: 10,
                buffered: 7
            })
        ));
        assert_eq!(decoder.buffered(), 0);
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn short_tail_is_truncation() {
        let mut bytes = wire(&[b"full"]);
        bytes.extend([0x0D, 0xA4]);

        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(&bytes).count(), 1);
        assert!(matches!(
            decoder.finish(),
            Some(FrameError::Truncated {
                offset: 9,
                expected: HEADER_SIZE,
                buffered: 2
            })
        ));
    }

    #[test]
    fn undrained_frames_survive_until_decode_next() {
        let bytes = wire(&[b"a", b"b"]);
        let mut decoder = FrameDecoder::new();

        let first = decoder.feed(&bytes).next().unwrap().unwrap();
        assert_eq!(first.body.as_ref(), b"a");

        let second = decoder.decode_next().unwrap().unwrap();
        assert_eq!(second.body.as_ref(), b"b");
        assert!(decoder.decode_next().is_none());
    }

    fn decode_chunked(bytes: &[u8], sizes: &[usize]) -> Vec<Vec<u8>> {
        let mut decoder = FrameDecoder::new();
        let mut out = Vec::new();
        let mut rest = bytes;
        let mut sizes = sizes.iter().cycle();
        while !rest.is_empty() {
            let n = (*sizes.next().unwrap()).clamp(1, rest.len());
            let (chunk, tail) = rest.split_at(n);
            out.extend(decoder.feed(chunk).map(|r| r.unwrap().body.to_vec()));
            rest = tail;
        }
        assert!(decoder.finish().is_none());
        out
    }

    #[test]
    fn byte_by_byte_matches_single_chunk() {
        let bytes = wire(&[b"alpha", b"", b"gamma-delta"]);
        assert_eq!(
            decode_chunked(&bytes, &[1]),
            decode_chunked(&bytes, &[bytes.len()])
        );
    }

    proptest! {
        #[test]
        fn single_frame_roundtrip(body in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let bytes = wire(&[&body]);
            let mut decoder = FrameDecoder::new();
            let out: Vec<_> = decoder.feed(&bytes).collect();

            prop_assert_eq!(out.len(), 1);
            let frame = out.into_iter().next().unwrap().unwrap();
            prop_assert_eq!(frame.body.as_ref(), body.as_slice());
        }

        #[test]
        fn chunking_invariance(
            frames in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..256), 0..16),
            sizes in proptest::collection::vec(1usize..64, 1..8),
        ) {
            let refs: Vec<&[u8]> = frames.iter().map(Vec::as_slice).collect();
            let bytes = wire(&refs);

            let chunked = decode_chunked(&bytes, &sizes);
            prop_assert_eq!(&chunked, &frames);
        }
    }
}
