use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use relaywire_transport::Stream;
use tracing::trace;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::frame::Frame;
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Write every byte of `buf`, then flush.
///
/// Short writes are continued; a write that accepts zero bytes is
/// reported as [`ErrorKind::WriteZero`].
pub fn write_all<W: Write>(dst: &mut W, buf: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < buf.len() {
        match dst.write(&buf[offset..]) {
            Ok(0) => {
                return Err(FrameError::Io(std::io::Error::new(
                    ErrorKind::WriteZero,
                    format!("stream accepted {offset} of {} bytes", buf.len()),
                )))
            }
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    loop {
        match dst.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

/// Reject bodies over `max` before anything is encoded.
pub fn check_body_size(frame: &Frame, max: usize) -> Result<()> {
    if frame.body.len() > max {
        return Err(FrameError::BodyTooLarge {
            size: frame.body.len() as u64,
            max,
        });
    }
    Ok(())
}

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_batch(std::slice::from_ref(frame))
    }

    /// Encode `frames` in order into one buffer and write it in one go.
    ///
    /// Size limits are checked for every frame first, so a rejected batch
    /// writes nothing.
    pub fn write_batch(&mut self, frames: &[Frame]) -> Result<()> {
        for frame in frames {
            check_body_size(frame, self.config.max_body_size)?;
        }

        self.buf.clear();
        for frame in frames {
            encode_frame(frame, &mut self.buf);
        }
        write_all(&mut self.inner, &self.buf)?;

        trace!(frames = frames.len(), bytes = self.buf.len(), "frames written");
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<Stream> {
    /// Create a frame writer for a socket stream and apply the write timeout.
    pub fn with_config_stream(inner: Stream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
