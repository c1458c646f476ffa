use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Which socket family an endpoint is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// Stream socket over the network (TCP).
    Network,
    /// Stream socket bound to a filesystem path (Unix domain socket).
    Local,
}

impl EndpointKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointKind::Network => "network",
            EndpointKind::Local => "local",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointKind {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "network" | "tcp" => Ok(EndpointKind::Network),
            "local" | "unix" => Ok(EndpointKind::Local),
            other => Err(TransportError::InvalidEndpoint(format!(
                "unknown endpoint kind {other:?} (expected network or local)"
            ))),
        }
    }
}

/// Immutable description of what to connect to.
///
/// Network endpoints always carry a port. Local endpoints never do: a port
/// supplied for a local endpoint is accepted and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    address: String,
    port: Option<u16>,
    kind: EndpointKind,
}

impl Endpoint {
    /// Build and validate an endpoint.
    ///
    /// `port` is taken wider than `u16` so that out-of-range values coming
    /// from configuration are reported instead of silently truncated.
    pub fn new(kind: EndpointKind, address: impl Into<String>, port: Option<u32>) -> Result<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(TransportError::InvalidEndpoint(
                "address must not be empty".to_string(),
            ));
        }

        let port = match kind {
            EndpointKind::Network => {
                let port = port.ok_or_else(|| {
                    TransportError::InvalidEndpoint(format!(
                        "network endpoint {address} requires a port"
                    ))
                })?;
                let port = u16::try_from(port).map_err(|_| {
                    TransportError::InvalidEndpoint(format!(
                        "port {port} out of range (0..=65535)"
                    ))
                })?;
                Some(port)
            }
            EndpointKind::Local => None,
        };

        Ok(Self {
            address,
            port,
            kind,
        })
    }

    /// A TCP endpoint.
    pub fn network(host: impl Into<String>, port: u32) -> Result<Self> {
        Self::new(EndpointKind::Network, host, Some(port))
    }

    /// A Unix domain socket endpoint. The path must be valid UTF-8.
    pub fn local(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = path.to_str().ok_or_else(|| {
            TransportError::InvalidEndpoint(format!(
                "socket path is not valid UTF-8: {}",
                path.display()
            ))
        })?;
        Self::new(EndpointKind::Local, path, None)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The TCP port; always `None` for local endpoints.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    /// The socket path of a local endpoint.
    pub fn path(&self) -> Option<&Path> {
        match self.kind {
            EndpointKind::Local => Some(Path::new(&self.address)),
            EndpointKind::Network => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.port) {
            (EndpointKind::Network, Some(port)) if self.address.contains(':') => {
                write!(f, "tcp://[{}]:{port}", self.address)
            }
            (EndpointKind::Network, Some(port)) => write!(f, "tcp://{}:{port}", self.address),
            _ => write!(f, "unix://{}", self.address),
        }
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    /// Accepts `tcp://host:port`, `unix:///path`, `host:port` or a bare path.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("unix://") {
            return Endpoint::local(path);
        }
        if let Some(rest) = s.strip_prefix("tcp://") {
            return parse_host_port(rest);
        }
        if s.starts_with('/') || s.starts_with('.') || !s.contains(':') {
            return Endpoint::local(s);
        }
        parse_host_port(s)
    }
}

fn parse_host_port(s: &str) -> Result<Endpoint> {
    let (host, port) = s.rsplit_once(':').ok_or_else(|| {
        TransportError::InvalidEndpoint(format!("expected host:port, got {s:?}"))
    })?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let port: u32 = port
        .parse()
        .map_err(|_| TransportError::InvalidEndpoint(format!("invalid port {port:?}")))?;
    Endpoint::network(host, port)
}
