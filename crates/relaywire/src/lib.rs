//! Length-prefixed binary framing over stream sockets.
//!
//! relaywire moves opaque frames between two processes over TCP or a local
//! Unix stream socket. Each frame is a 17-byte prefix (flags, size, and the
//! size again as a check) followed by the body.
//!
//! # Crate Structure
//!
//! - [`transport`]: endpoints, stream sockets and listeners
//! - [`frame`]: the wire codec, frame reader and frame writer
//! - [`relay`]: connection management for clients ([`Relay`]) and servers ([`RelayListener`])

/// Re-export transport types.
pub mod transport {
    pub use relaywire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use relaywire_frame::*;
}

/// Re-export relay types.
pub mod relay {
    pub use relaywire_relay::*;
}

pub use relaywire_frame::{flags, Frame, FrameConfig};
pub use relaywire_relay::{ErrorClass, Relay, RelayError, RelayListener, Session};
pub use relaywire_transport::{Endpoint, EndpointKind};
