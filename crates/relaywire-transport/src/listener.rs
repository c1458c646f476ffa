use crate::endpoint::{Endpoint, EndpointKind};
use crate::error::{Result, TransportError};
use crate::tcp::NetworkListener;
use crate::traits::Stream;
#[cfg(unix)]
use crate::uds::LocalListener;

/// A bound listener for either endpoint kind.
pub enum Listener {
    Network(NetworkListener),
    #[cfg(unix)]
    Local(LocalListener),
}

impl Listener {
    /// Bind and listen on `endpoint`.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        match (endpoint.kind(), endpoint.port()) {
            (EndpointKind::Network, Some(port)) => {
                NetworkListener::bind(endpoint.address(), port).map(Listener::Network)
            }
            (EndpointKind::Network, None) => Err(TransportError::InvalidEndpoint(format!(
                "network endpoint {endpoint} has no port"
            ))),
            #[cfg(unix)]
            (EndpointKind::Local, _) => LocalListener::bind(endpoint.address()).map(Listener::Local),
            #[cfg(not(unix))]
            (EndpointKind::Local, _) => Err(TransportError::Bind {
                endpoint: endpoint.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "local endpoints require Unix domain sockets",
                ),
            }),
        }
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        match self {
            Listener::Network(listener) => listener.accept(),
            #[cfg(unix)]
            Listener::Local(listener) => listener.accept(),
        }
    }

    /// The endpoint this listener actually serves (resolves port 0).
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        match self {
            Listener::Network(listener) => listener.local_endpoint(),
            #[cfg(unix)]
            Listener::Local(listener) => Endpoint::local(listener.path()),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match self {
            Listener::Network(_) => "tcp",
            #[cfg(unix)]
            Listener::Local(_) => "unix-domain-socket",
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener")
            .field("transport", &self.transport_name())
            .finish()
    }
}
