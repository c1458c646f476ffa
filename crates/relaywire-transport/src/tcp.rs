use std::net::{SocketAddr, TcpListener};

use tracing::info;

use crate::endpoint::Endpoint;
use crate::error::{Result, TransportError};
use crate::traits::Stream;

/// Listening side of a network (TCP) endpoint.
pub struct NetworkListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl NetworkListener {
    /// Bind to `host:port`. Port 0 picks a free port; see [`Self::local_addr`].
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        let bind_err = |source: std::io::Error| TransportError::Bind {
            endpoint: format!("tcp://{host}:{port}"),
            source,
        };
        let listener = TcpListener::bind((host, port)).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        info!(%local_addr, "listening on tcp");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<Stream> {
        let (stream, _addr) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        Ok(Stream::from_tcp(stream))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The endpoint clients should dial to reach this listener.
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        Endpoint::network(self.local_addr.ip().to_string(), self.local_addr.port().into())
    }
}
