use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::frame::Frame;

/// Frame prefix: flags (1) + size LE (8) + check BE (8) = 17 bytes.
pub const PREFIX_SIZE: usize = 17;

/// Default chunk size for body reads: 64 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default maximum body size: 64 MiB.
pub const DEFAULT_MAX_BODY: usize = 64 * 1024 * 1024;

/// The decoded fields of a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
    pub flags: u8,
    pub size: u64,
}

/// Encode a prefix.
///
/// Wire format:
/// ```text
/// ┌─────────┬──────────────┬──────────────┬────────────────┐
/// │ Flags   │ Size         │ Check        │ Body           │
/// │ (1B)    │ (8B LE)      │ (8B BE)      │ (Size bytes)   │
/// └─────────┴──────────────┴──────────────┴────────────────┘
/// ```
///
/// `check` repeats `size` in the opposite byte order.
pub fn encode_prefix(flags: u8, size: u64) -> [u8; PREFIX_SIZE] {
    let mut prefix = [0u8; PREFIX_SIZE];
    prefix[0] = flags;
    prefix[1..9].copy_from_slice(&size.to_le_bytes());
    prefix[9..17].copy_from_slice(&size.to_be_bytes());
    prefix
}

/// Decode a prefix, verifying that size and check agree.
pub fn decode_prefix(prefix: &[u8; PREFIX_SIZE]) -> Result<Prefix> {
    let mut buf = &prefix[..];
    let flags = buf.get_u8();
    let size = buf.get_u64_le();
    let check = buf.get_u64();

    if size != check {
        return Err(FrameError::InvalidPrefix { size, check });
    }
    Ok(Prefix { flags, size })
}

/// Append the wire form of `frame` to `dst`.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) {
    let size = frame.body.len() as u64;
    dst.reserve(PREFIX_SIZE + frame.body.len());
    dst.put_u8(frame.flags);
    dst.put_u64_le(size);
    dst.put_u64(size);
    dst.put_slice(&frame.body);
}

/// The wire form of `frame` as a standalone buffer.
pub fn encode(frame: &Frame) -> Bytes {
    let mut dst = BytesMut::with_capacity(frame.wire_size());
    encode_frame(frame, &mut dst);
    dst.freeze()
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_body: usize) -> Result<Option<Frame>> {
    if src.len() < PREFIX_SIZE {
        return Ok(None);
    }

    let mut raw = [0u8; PREFIX_SIZE];
    raw.copy_from_slice(&src[..PREFIX_SIZE]);
    let prefix = decode_prefix(&raw)?;
    let body_len = checked_body_len(prefix.size, max_body)?;

    let total = PREFIX_SIZE + body_len;
    if src.len() < total {
        src.reserve((total - src.len()).min(DEFAULT_BUFFER_SIZE));
        return Ok(None);
    }

    src.advance(PREFIX_SIZE);
    let body = src.split_to(body_len).freeze();

    Ok(Some(Frame::new(prefix.flags, body)))
}

/// Convert a declared body size to `usize`, enforcing `max_body`.
pub(crate) fn checked_body_len(size: u64, max_body: usize) -> Result<usize> {
    match usize::try_from(size) {
        Ok(len) if len <= max_body => Ok(len),
        _ => Err(FrameError::BodyTooLarge {
            size,
            max: max_body,
        }),
    }
}

/// Configuration shared by frame readers, writers and relays.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest body accepted in either direction. Default: 64 MiB.
    pub max_body_size: usize,
    /// Upper bound on a single body read request. Default: 64 KiB.
    pub buffer_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY,
            buffer_size: DEFAULT_BUFFER_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
