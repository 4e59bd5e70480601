//! Length-prefixed frame codec.
//!
//! Implements a [`tokio_util::codec`] compatible codec for the wire format
//! described in [`super`]: a 4-byte big-endian unsigned length followed by
//! exactly that many payload bytes.
//!
//! The decoder is a streaming state machine over the input buffer: while
//! fewer than four bytes are available it waits for the header; once the
//! header is readable it validates the length against the cap *before*
//! reserving space, then waits until the full body is buffered. Partial
//! input stays in the buffer, so feeding the decoder byte by byte yields
//! exactly the frames that one contiguous chunk would.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use super::error::{ProtocolError, ProtocolResult, MAX_FRAME_SIZE};

/// Length of the frame header in bytes.
const HEADER_LEN: usize = 4;

/// Frame codec for use with [`tokio_util::codec::Framed`].
///
/// Empty frames (length 0) are valid. Frames above the configured maximum
/// are rejected on both the encode and decode path.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Creates a codec with the protocol-wide maximum frame size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    /// Creates a codec with a tighter cap, mainly for tests.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` exceeds [`MAX_FRAME_SIZE`].
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        assert!(
            max_size <= MAX_FRAME_SIZE,
            "max_size {max_size} exceeds protocol limit {MAX_FRAME_SIZE}"
        );
        Self {
            max_frame_size: max_size,
        }
    }

    /// The maximum payload size this codec accepts.
    #[must_use]
    pub const fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> ProtocolResult<Option<Bytes>> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        // Length is checked before any allocation happens.
        if length > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: length,
                max: self.max_frame_size,
            });
        }

        let total = HEADER_LEN + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        Ok(Some(src.split_to(length).freeze()))
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> ProtocolResult<()> {
        if item.len() > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: item.len(),
                max: self.max_frame_size,
            });
        }

        dst.reserve(HEADER_LEN + item.len());
        #[allow(clippy::cast_possible_truncation)] // bounded by max_frame_size above
        dst.put_u32(item.len() as u32);
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut codec = FrameCodec::new();
        let payload = Bytes::from_static(b"hello roster");

        let mut buf = BytesMut::new();
        codec.encode(payload.clone(), &mut buf).unwrap();
        assert_eq!(&buf[..HEADER_LEN], &[0, 0, 0, 12]);

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_header_and_partial_body_wait() {
        let mut codec = FrameCodec::new();

        let mut buf = BytesMut::from(&[0u8, 0, 0][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 3);

        let mut buf = BytesMut::from(&[0u8, 0, 0, 10, 1, 2, 3][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 7);
    }

    #[test]
    fn oversized_length_prefix_is_rejected_before_allocation() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32(20 * 1024 * 1024);
        buf.extend_from_slice(&[0u8; 16]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::FrameTooLarge { size, max }
                if size == 20 * 1024 * 1024 && max == MAX_FRAME_SIZE
        ));
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let mut codec = FrameCodec::with_max_size(8);
        let mut buf = BytesMut::new();
        let err = codec.encode(Bytes::from(vec![0u8; 9]), &mut buf).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge { size: 9, max: 8 }));
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_frame_is_valid() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Bytes::new(), &mut buf).unwrap();
        assert_eq!(&buf[..], &[0, 0, 0, 0]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(Bytes::from_static(b"first"), &mut buf).unwrap();
        codec.encode(Bytes::from_static(b"second"), &mut buf).unwrap();

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "first");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "second");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn byte_at_a_time_yields_the_same_frames_as_one_chunk() {
        let frames: Vec<Bytes> = vec![
            Bytes::new(),
            Bytes::from_static(b"a"),
            Bytes::from(vec![0xAB; 300]),
            Bytes::from_static(b"tail"),
        ];

        let mut wire = BytesMut::new();
        let mut codec = FrameCodec::new();
        for f in &frames {
            codec.encode(f.clone(), &mut wire).unwrap();
        }

        // One chunk.
        let mut chunk_buf = wire.clone();
        let mut whole = Vec::new();
        while let Some(frame) = codec.decode(&mut chunk_buf).unwrap() {
            whole.push(frame);
        }

        // One byte at a time.
        let mut dribble_buf = BytesMut::new();
        let mut dribbled = Vec::new();
        for byte in wire.iter() {
            dribble_buf.put_u8(*byte);
            while let Some(frame) = codec.decode(&mut dribble_buf).unwrap() {
                dribbled.push(frame);
            }
        }

        assert_eq!(whole, frames);
        assert_eq!(dribbled, frames);
    }
}
