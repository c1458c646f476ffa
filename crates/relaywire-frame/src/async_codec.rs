use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, DEFAULT_MAX_BODY};
use crate::error::FrameError;
use crate::frame::Frame;
use crate::writer::check_body_size;

/// `tokio_util` codec speaking the same 17-byte prefix format.
///
/// Use with `FramedRead` / `FramedWrite` over any async byte stream.
#[derive(Debug, Clone)]
pub struct RelayCodec {
    max_body_size: usize,
}

impl RelayCodec {
    pub fn new(max_body_size: usize) -> Self {
        Self { max_body_size }
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size
    }
}

impl Default for RelayCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY)
    }
}

impl Decoder for RelayCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src, self.max_body_size)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(FrameError::Truncated {
                expected: expected_len(src),
                received: src.len() as u64,
            }),
        }
    }
}

impl Encoder<Frame> for RelayCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        check_body_size(&frame, self.max_body_size)?;
        encode_frame(&frame, dst);
        Ok(())
    }
}

/// Total frame length announced by a buffered partial frame, if known.
fn expected_len(src: &BytesMut) -> u64 {
    let mut raw = [0u8; crate::PREFIX_SIZE];
    if src.len() < raw.len() {
        return raw.len() as u64;
    }
    raw.copy_from_slice(&src[..crate::PREFIX_SIZE]);
    match crate::decode_prefix(&raw) {
        Ok(prefix) => prefix.size.saturating_add(crate::PREFIX_SIZE as u64),
        Err(_) => raw.len() as u64,
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    #[tokio::test]
    async fn roundtrip_over_duplex() {
        let (client, server) = tokio::io::duplex(64);
        let mut sink = FramedWrite::new(client, RelayCodec::default());
        let mut stream = FramedRead::new(server, RelayCodec::default());

        let body = vec![0x5A; 10_000];
        let writer = tokio::spawn(async move {
            sink.send(Frame::new(0, "ping")).await.unwrap();
            sink.send(Frame::new(1, body)).await.unwrap();
            sink.send(Frame::new(2, "")).await.unwrap();
        });

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, Frame::new(0, "ping"));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.body.len(), 10_000);
        let third = stream.next().await.unwrap().unwrap();
        assert_eq!((third.flags, third.body.len()), (2, 0));

        writer.await.unwrap();
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn encoder_rejects_oversized_body() {
        let mut codec = RelayCodec::new(2);
        let mut dst = BytesMut::new();
        let err = codec.encode(Frame::new(0, "abc"), &mut dst).unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { .. }));
        assert!(dst.is_empty());
    }

    #[test]
    fn eof_mid_frame_is_truncated() {
        let mut codec = RelayCodec::default();
        let mut src = BytesMut::new();
        encode_frame(&Frame::new(0, "hello"), &mut src);
        src.truncate(src.len() - 2);

        let err = codec.decode_eof(&mut src).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 22,
                received: 20
            }
        ));
    }
}
