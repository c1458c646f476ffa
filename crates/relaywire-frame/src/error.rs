/// Errors that can occur while encoding, decoding, reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The size and check fields of a prefix disagree.
    #[error("invalid prefix (checksum): size {size} does not match check {check}")]
    InvalidPrefix { size: u64, check: u64 },

    /// The body exceeds the configured maximum size.
    #[error("frame body too large ({size} bytes, max {max})")]
    BodyTooLarge { size: u64, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended cleanly before the first byte of a frame.
    #[error("connection closed")]
    ConnectionClosed,

    /// The stream ended in the middle of a prefix or body.
    #[error("connection closed mid-frame ({received} of {expected} bytes)")]
    Truncated { expected: u64, received: u64 },
}

pub type Result<T> = std::result::Result<T, FrameError>;
