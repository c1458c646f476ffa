//! Endpoint descriptors and blocking stream sockets.
//!
//! This is the lowest layer of relaywire. It knows how to reach a peer:
//! - TCP streams for [`EndpointKind::Network`] endpoints
//! - Unix domain stream sockets for [`EndpointKind::Local`] endpoints
//!
//! Everything above works on the [`Stream`] type and the [`Connector`]
//! capability provided here.

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use endpoint::{Endpoint, EndpointKind};
pub use error::{Result, TransportError};
pub use listener::Listener;
pub use tcp::NetworkListener;
pub use traits::{Connector, SocketConnector, Stream};

#[cfg(unix)]
pub use uds::LocalListener;
