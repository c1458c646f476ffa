use bytes::Bytes;

use crate::codec::PREFIX_SIZE;

/// Conventional flag bits.
///
/// The codec never interprets flags; these only name the bits peers
/// commonly agree on.
pub mod flags {
    /// The body carries an error or control payload.
    pub const ERROR: u8 = 0b0000_0001;
    /// The sender deliberately sent no body.
    pub const EMPTY: u8 = 0b0000_0010;
    /// The body is compressed.
    pub const COMPRESSED: u8 = 0b0000_0100;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// One application-level message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Opaque flag bits, preserved exactly on the wire.
    pub flags: u8,
    /// The message body. Empty, never absent, for zero-size frames.
    pub body: Bytes,
    /// Side value some flag conventions attach (secondary length, revision).
    ///
    /// Local metadata only: the prefix has no field for it, so it is not
    /// encoded and decoded frames always carry `None`.
    pub options: Option<u64>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(flags: u8, body: impl Into<Bytes>) -> Self {
        Self {
            flags,
            body: body.into(),
            options: None,
        }
    }

    /// Attach an options value.
    pub fn with_options(mut self, options: u64) -> Self {
        self.options = Some(options);
        self
    }

    /// An error frame (flag bit 0 set).
    pub fn error(body: impl Into<Bytes>) -> Self {
        Self::new(flags::ERROR, body)
    }

    pub fn is_error(&self) -> bool {
        flags::has_flag(self.flags, flags::ERROR)
    }

    /// The total wire size of this frame (prefix + body).
    pub fn wire_size(&self) -> usize {
        PREFIX_SIZE + self.body.len()
    }
}
