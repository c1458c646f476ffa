//! Length-prefixed frame codec.
//!
//! Every frame on the wire is a fixed 17-byte prefix followed by the body:
//! - 1 byte of flags
//! - the body size as a little-endian `u64`
//! - the same size again as a big-endian `u64` (integrity check)
//!
//! There are no delimiters between frames and no resynchronization marker,
//! so frames are always read completely or not at all.

pub mod codec;
pub mod error;
pub mod frame;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_frame, decode_prefix, encode, encode_frame, encode_prefix, FrameConfig, Prefix,
    DEFAULT_BUFFER_SIZE, DEFAULT_MAX_BODY, PREFIX_SIZE,
};
pub use error::{FrameError, Result};
pub use frame::{flags, Frame};
pub use reader::{read_frame, read_full, FrameReader};
pub use writer::{check_body_size, write_all, FrameWriter};

#[cfg(feature = "async")]
pub use async_codec::RelayCodec;
