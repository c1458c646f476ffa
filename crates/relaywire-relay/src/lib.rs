//! Connection management for relaywire.
//!
//! A [`Relay`] owns one connection to one [`Endpoint`] and exchanges whole
//! frames over it: `connect`, then any sequence of `send` and `wait_frame`,
//! then `close`. The serving side is [`RelayListener`], which hands out one
//! [`Session`] per accepted connection.
//!
//! There is no retry or reconnection at this layer. Every error surfaces to
//! the caller, who decides whether resending is safe.

pub mod error;
pub mod listener;
pub mod relay;

pub use error::{ErrorClass, RelayError, Result};
pub use listener::{RelayListener, Session};
pub use relay::Relay;

pub use relaywire_frame::{flags, Frame, FrameConfig};
pub use relaywire_transport::{Connector, Endpoint, EndpointKind, SocketConnector};
