use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use relaywire_transport::{Stream, TransportError};
use tracing::trace;

use crate::codec::{checked_body_len, decode_prefix, FrameConfig, PREFIX_SIZE};
use crate::error::{FrameError, Result};
use crate::frame::Frame;

/// Read until `buf` is full or the stream reports EOF.
///
/// Returns the number of bytes read; anything short of `buf.len()` means EOF.
fn fill<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(filled)
}

/// Read exactly `buf.len()` bytes or fail.
///
/// EOF before the first byte is [`FrameError::ConnectionClosed`]; EOF after
/// it is [`FrameError::Truncated`]. Short reads never escape this function.
pub fn read_full<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<()> {
    let filled = fill(src, buf)?;
    if filled == buf.len() {
        Ok(())
    } else if filled == 0 {
        Err(FrameError::ConnectionClosed)
    } else {
        Err(FrameError::Truncated {
            expected: buf.len() as u64,
            received: filled as u64,
        })
    }
}

/// Read one complete frame (blocking).
///
/// The body is accumulated in requests of at most `config.buffer_size`
/// bytes. Any failure aborts the frame; the stream position is then
/// unknown and the caller must not keep reading from it.
pub fn read_frame<R: Read>(src: &mut R, config: &FrameConfig) -> Result<Frame> {
    let mut raw = [0u8; PREFIX_SIZE];
    read_full(src, &mut raw)?;
    let prefix = decode_prefix(&raw)?;
    let body_len = checked_body_len(prefix.size, config.max_body_size)?;

    if body_len == 0 {
        trace!(flags = prefix.flags, size = 0, "frame received");
        return Ok(Frame::new(prefix.flags, Bytes::new()));
    }

    // Capacity follows the bytes that actually arrive, not the declared size.
    let chunk_size = config.buffer_size.max(1);
    let mut body = BytesMut::with_capacity(body_len.min(chunk_size));
    let mut remaining = body_len;
    while remaining > 0 {
        let want = chunk_size.min(remaining);
        let start = body.len();
        body.resize(start + want, 0);
        let got = fill(src, &mut body[start..])?;
        if got < want {
            return Err(FrameError::Truncated {
                expected: prefix.size,
                received: (start + got) as u64,
            });
        }
        remaining -= got;
    }

    trace!(flags = prefix.flags, size = body_len, "frame received");
    Ok(Frame::new(prefix.flags, body.freeze()))
}

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached
    /// cleanly between frames.
    pub fn read_frame(&mut self) -> Result<Frame> {
        read_frame(&mut self.inner, &self.config)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<Stream> {
    /// Create a frame reader for a socket stream and apply the read timeout.
    pub fn with_config_stream(inner: Stream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
        TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
            FrameError::Io(source)
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::{encode, encode_prefix};

    fn wire(frames: &[Frame]) -> Vec<u8> {
        frames.iter().flat_map(|f| encode(f).to_vec()).collect()
    }

    #[test]
    fn read_single_frame() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[Frame::new(0, "ping")])));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame, Frame::new(0, "ping"));
    }

    #[test]
    fn read_multiple_frames_in_order() {
        let frames = [Frame::new(1, "one"), Frame::new(2, ""), Frame::new(3, "three")];
        let mut reader = FrameReader::new(Cursor::new(wire(&frames)));
        for expected in &frames {
            assert_eq!(&reader.read_frame().unwrap(), expected);
        }
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn zero_size_frame_has_empty_body() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[Frame::new(0x80, "")])));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.flags, 0x80);
        assert!(frame.body.is_empty());
    }

    #[test]
    fn fragmented_body_is_reassembled() {
        let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let bytes = wire(&[Frame::new(7, body.clone())]);
        let src = ChunkedReader::new(bytes, 1000);
        let config = FrameConfig {
            buffer_size: 4096,
            ..FrameConfig::default()
        };

        let mut reader = FrameReader::with_config(src, config);
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.flags, 7);
        assert_eq!(frame.body.len(), 100_000);
        assert_eq!(frame.body.as_ref(), body.as_slice());

        let max_request = reader.get_ref().max_request;
        assert!(max_request <= 4096, "requested {max_request} bytes at once");
    }

    #[test]
    fn byte_by_byte_delivery() {
        let src = ChunkedReader::new(wire(&[Frame::new(4, "slow")]), 1);
        let frame = FrameReader::new(src).read_frame().unwrap();
        assert_eq!(frame, Frame::new(4, "slow"));
    }

    #[test]
    fn eof_inside_prefix_is_truncated() {
        let bytes = encode_prefix(0, 4)[..9].to_vec();
        let err = FrameReader::new(Cursor::new(bytes)).read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 17,
                received: 9
            }
        ));
    }

    #[test]
    fn eof_inside_body_is_truncated() {
        let mut bytes = encode_prefix(2, 16).to_vec();
        bytes.extend_from_slice(b"only-part");
        let err = FrameReader::new(Cursor::new(bytes)).read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 16,
                received: 9
            }
        ));
    }

    #[test]
    fn corrupt_prefix_in_stream() {
        let mut bytes = encode_prefix(0, 3).to_vec();
        bytes[9] = 0xFF;
        bytes.extend_from_slice(b"abc");
        let err = FrameReader::new(Cursor::new(bytes)).read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidPrefix { .. }));
    }

    #[test]
    fn oversized_body_rejected_before_reading() {
        let bytes = encode_prefix(0, 1 << 40).to_vec();
        let config = FrameConfig {
            max_body_size: 1024,
            ..FrameConfig::default()
        };
        let err = FrameReader::with_config(Cursor::new(bytes), config)
            .read_frame()
            .unwrap_err();
        assert!(matches!(err, FrameError::BodyTooLarge { .. }));
    }

    #[test]
    fn huge_declared_size_with_short_body_is_truncated() {
        let mut bytes = encode_prefix(0, 1 << 40).to_vec();
        bytes.extend_from_slice(b"0123456789");
        let config = FrameConfig {
            max_body_size: usize::MAX,
            ..FrameConfig::default()
        };
        let err = FrameReader::with_config(Cursor::new(bytes), config)
            .read_frame()
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                expected: 1099511627776,
                received: 10
            }
        ));
    }

    #[test]
    fn interrupted_read_retries() {
        let src = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(&[Frame::new(8, "ok")])),
        };
        let frame = FrameReader::new(src).read_frame().unwrap();
        assert_eq!(frame, Frame::new(8, "ok"));
    }

    #[test]
    fn would_block_propagates_io_error() {
        let err = FrameReader::new(WouldBlockReader).read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.write_frame(&Frame::new(0, "ping")).unwrap();
        assert_eq!(reader.read_frame().unwrap(), Frame::new(0, "ping"));
    }

    #[test]
    #[cfg(unix)]
    fn large_frame_across_threads() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let body = vec![0xAB; 1024 * 1024];
        let expected = body.clone();

        let writer = std::thread::spawn(move || {
            let mut writer = crate::writer::FrameWriter::new(left);
            writer.write_frame(&Frame::new(1, body)).unwrap();
        });

        let frame = FrameReader::new(right).read_frame().unwrap();
        assert_eq!(frame.body.as_ref(), expected.as_slice());
        writer.join().unwrap();
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        assert_eq!(reader.config().buffer_size, crate::DEFAULT_BUFFER_SIZE);
        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    /// Delivers at most `chunk` bytes per call and records the largest request.
    struct ChunkedReader {
        inner: Cursor<Vec<u8>>,
        chunk: usize,
        max_request: usize,
    }

    impl ChunkedReader {
        fn new(bytes: Vec<u8>, chunk: usize) -> Self {
            Self {
                inner: Cursor::new(bytes),
                chunk,
                max_request: 0,
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.max_request = self.max_request.max(buf.len());
            let n = buf.len().min(self.chunk);
            self.inner.read(&mut buf[..n])
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    struct WouldBlockReader;

    impl Read for WouldBlockReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }
}
