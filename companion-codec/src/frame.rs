//! Message framing: `u32 length ∥ u8 type ∥ length
//! bytes payload`. `length` counts the payload only, not the type byte.

use crate::error::FrameError;
use crate::primitive;

/// One decoded `(type, payload)` frame. The payload is left unparsed —
/// handshake and graph decoding happen one layer up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub msg_type: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(msg_type: u8, payload: Vec<u8>) -> Self {
        Self { msg_type, payload }
    }
}

/// Attempts to decode one frame from the front of `input`. Returns the
/// decoded frame and the unconsumed remainder, or `Incomplete` if `input`
/// doesn't yet hold a full frame.
pub fn decode_frame(input: &[u8]) -> Result<(&[u8], Frame), FrameError> {
    let (rest, length) = primitive::decode_u32(input).map_err(|_| FrameError::Incomplete)?;
    let length = length as usize;
    // 1 type byte + `length` payload bytes must both be present.
    if rest.len() < 1 + length {
        return Err(FrameError::Incomplete);
    }
    let msg_type = rest[0];
    let payload = rest[1..1 + length].to_vec();
    let remainder = &rest[1 + length..];
    Ok((remainder, Frame { msg_type, payload }))
}

/// Encodes `frame` as a complete wire frame. Sends are atomic at the frame
/// level: callers write this in one go.
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 1 + frame.payload.len());
    primitive::encode_u32(frame.payload.len() as u32, &mut out);
    primitive::encode_u8(frame.msg_type, &mut out);
    out.extend_from_slice(&frame.payload);
    out
}

#[cfg(feature = "tokio")]
mod tokio_codec {
    use bytes::{Buf, BufMut, BytesMut};
    use tokio_util::codec::{Decoder, Encoder};

    use super::{Frame, FrameError};

    /// `tokio_util::codec::{Decoder, Encoder}` for [`Frame`]s over a
    /// `Framed<TcpStream, _>`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FrameCodec;

    impl Decoder for FrameCodec {
        type Item = Frame;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            match super::decode_frame(src) {
                Ok((remaining, frame)) => {
                    let consumed = src.len() - remaining.len();
                    src.advance(consumed);
                    Ok(Some(frame))
                }
                Err(FrameError::Incomplete) => Ok(None),
                Err(err) => Err(err),
            }
        }

        /// A clean EOF with nothing buffered ends the stream; an EOF with a
        /// partial frame still buffered is the peer closing mid-frame.
        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            match self.decode(src)? {
                Some(frame) => Ok(Some(frame)),
                None if src.is_empty() => Ok(None),
                None => Err(FrameError::TruncatedByPeerClose { bytes_consumed: src.len() }),
            }
        }
    }

    impl Encoder<Frame> for FrameCodec {
        type Error = FrameError;

        fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
            dst.put_slice(&super::encode_frame(&item));
            Ok(())
        }
    }

    impl Encoder<&Frame> for FrameCodec {
        type Error = FrameError;

        fn encode(&mut self, item: &Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
            dst.put_slice(&super::encode_frame(item));
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn clean_eof_with_empty_buffer_ends_the_stream() {
            let mut codec = FrameCodec;
            let mut buf = BytesMut::new();
            assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        }

        #[test]
        fn eof_with_a_partial_frame_buffered_is_truncated_by_peer_close() {
            let mut codec = FrameCodec;
            let mut buf = BytesMut::new();
            buf.put_slice(&[0, 0, 0, 5, 1, 2, 3]);
            assert_eq!(
                codec.decode_eof(&mut buf),
                Err(FrameError::TruncatedByPeerClose { bytes_consumed: 7 })
            );
        }
    }
}

#[cfg(feature = "tokio")]
pub use tokio_codec::FrameCodec;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_round_trips() {
        let frame = Frame::new(1, br#"{"version":"1"}"#.to_vec());
        let bytes = encode_frame(&frame);
        let (rest, decoded) = decode_frame(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, frame);
    }

    #[test]
    fn partial_header_is_incomplete() {
        assert_eq!(decode_frame(&[0, 0]), Err(FrameError::Incomplete));
    }

    #[test]
    fn header_present_but_payload_short_is_incomplete() {
        let frame = Frame::new(0, vec![1, 2, 3, 4]);
        let bytes = encode_frame(&frame);
        assert_eq!(decode_frame(&bytes[..bytes.len() - 1]), Err(FrameError::Incomplete));
    }

    #[test]
    fn empty_payload_keep_alive_round_trips() {
        let frame = Frame::new(0, Vec::new());
        let bytes = encode_frame(&frame);
        assert_eq!(bytes, vec![0, 0, 0, 0, 0]);
        let (rest, decoded) = decode_frame(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded, frame);
    }

    #[test]
    fn concatenated_frames_split_at_every_offset_decode_the_same() {
        let a = encode_frame(&Frame::new(0, Vec::new()));
        let b = encode_frame(&Frame::new(1, b"hi".to_vec()));
        let mut combined = a.clone();
        combined.extend_from_slice(&b);

        for split in 0..=combined.len() {
            let mut buffered = combined[..split].to_vec();
            let mut offset = split;
            let mut decoded = Vec::new();
            loop {
                match decode_frame(&buffered) {
                    Ok((rest, frame)) => {
                        decoded.push(frame);
                        buffered = rest.to_vec();
                    }
                    Err(FrameError::Incomplete) => break,
                    Err(other) => panic!("unexpected error at split {split}: {other:?}"),
                }
            }
            while offset < combined.len() && decoded.len() < 2 {
                buffered.push(combined[offset]);
                offset += 1;
                match decode_frame(&buffered) {
                    Ok((rest, frame)) => {
                        decoded.push(frame);
                        buffered = rest.to_vec();
                    }
                    Err(FrameError::Incomplete) => continue,
                    Err(other) => panic!("unexpected error feeding byte {offset}: {other:?}"),
                }
            }
            assert_eq!(decoded, vec![Frame::new(0, Vec::new()), Frame::new(1, b"hi".to_vec())]);
        }
    }
}
