use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use tracing::debug;

use crate::endpoint::{Endpoint, EndpointKind};
use crate::error::{Result, TransportError};

/// A connected stream socket. Implements Read + Write.
///
/// Wraps a TCP stream for network endpoints and a Unix domain socket stream
/// for local endpoints.
pub struct Stream {
    inner: StreamInner,
}

enum StreamInner {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            StreamInner::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl Stream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self {
            inner: StreamInner::Tcp(stream),
        }
    }

    #[cfg(unix)]
    pub(crate) fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: StreamInner::Unix(stream),
        }
    }

    /// Open a blocking stream to `endpoint`.
    pub fn connect(endpoint: &Endpoint) -> Result<Self> {
        let connect_err = |source: std::io::Error| TransportError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        let stream = match (endpoint.kind(), endpoint.port()) {
            (EndpointKind::Network, Some(port)) => {
                let stream = TcpStream::connect((endpoint.address(), port)).map_err(connect_err)?;
                stream.set_nodelay(true).map_err(connect_err)?;
                Self::from_tcp(stream)
            }
            (EndpointKind::Network, None) => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "network endpoint {endpoint} has no port"
                )))
            }
            #[cfg(unix)]
            (EndpointKind::Local, _) => {
                let stream = std::os::unix::net::UnixStream::connect(endpoint.address())
                    .map_err(connect_err)?;
                Self::from_unix(stream)
            }
            #[cfg(not(unix))]
            (EndpointKind::Local, _) => {
                return Err(connect_err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "local endpoints require Unix domain sockets",
                )))
            }
        };

        debug!(%endpoint, "connected");
        Ok(stream)
    }

    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            StreamInner::Tcp(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            StreamInner::Tcp(stream) => Ok(Self::from_tcp(stream.try_clone()?)),
            #[cfg(unix)]
            StreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Shut down both halves of the socket.
    ///
    /// A peer that already went away is not an error here.
    pub fn shutdown(&self) -> Result<()> {
        let result = match &self.inner {
            StreamInner::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(unix)]
            StreamInner::Unix(stream) => stream.shutdown(Shutdown::Both),
        };
        match result {
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            other => other.map_err(Into::into),
        }
    }

    /// Human-readable description of the remote side.
    pub fn peer_description(&self) -> String {
        match &self.inner {
            StreamInner::Tcp(stream) => stream
                .peer_addr()
                .map(|addr| format!("tcp://{addr}"))
                .unwrap_or_else(|_| "tcp://unknown".to_string()),
            #[cfg(unix)]
            StreamInner::Unix(_) => match self.peer_credentials() {
                Some((uid, _gid, pid)) => format!("unix:pid={pid},uid={uid}"),
                None => "unix:unknown".to_string(),
            },
        }
    }

    /// Get the credentials of the connected peer (Linux, local streams only).
    ///
    /// Returns `(uid, gid, pid)` via `SO_PEERCRED`, or `None` if unavailable.
    #[cfg(target_os = "linux")]
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        use std::os::fd::AsRawFd;

        let fd = match &self.inner {
            StreamInner::Unix(stream) => stream.as_raw_fd(),
            StreamInner::Tcp(_) => return None,
        };

        let mut cred = libc::ucred {
            pid: 0,
            uid: 0,
            gid: 0,
        };
        let mut len = std::mem::size_of::<libc::ucred>() as libc::socklen_t;

        // SAFETY: `cred` and `len` are valid writable pointers for the provided sizes,
        // and `fd` is an open Unix socket descriptor owned by this stream.
        let rc = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_PEERCRED,
                (&mut cred as *mut libc::ucred).cast::<libc::c_void>(),
                &mut len,
            )
        };

        if rc == 0 && len as usize == std::mem::size_of::<libc::ucred>() {
            Some((cred.uid, cred.gid, cred.pid as u32))
        } else {
            None
        }
    }

    /// Get the credentials of the connected peer.
    ///
    /// Returns `None` on platforms that do not expose peer credentials.
    #[cfg(not(target_os = "linux"))]
    pub fn peer_credentials(&self) -> Option<(u32, u32, u32)> {
        None
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.inner {
            StreamInner::Tcp(_) => "tcp",
            #[cfg(unix)]
            StreamInner::Unix(_) => "unix",
        };
        f.debug_struct("Stream").field("type", &kind).finish()
    }
}

/// The socket capability a relay drives.
///
/// `connect` allocates and connects a new handle; `close` consumes it, so a
/// handle can only ever be released once.
pub trait Connector {
    /// The connected handle.
    type Conn: Read + Write;

    fn connect(&mut self, endpoint: &Endpoint) -> Result<Self::Conn>;

    fn close(&mut self, conn: Self::Conn) -> Result<()>;
}

/// Connector backed by real OS sockets.
#[derive(Debug, Clone, Default)]
pub struct SocketConnector {
    /// Socket-level read timeout applied after connect.
    pub read_timeout: Option<Duration>,
    /// Socket-level write timeout applied after connect.
    pub write_timeout: Option<Duration>,
}

impl SocketConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(read_timeout: Option<Duration>, write_timeout: Option<Duration>) -> Self {
        Self {
            read_timeout,
            write_timeout,
        }
    }
}

impl Connector for SocketConnector {
    type Conn = Stream;

    fn connect(&mut self, endpoint: &Endpoint) -> Result<Stream> {
        let stream = Stream::connect(endpoint)?;
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        Ok(stream)
    }

    fn close(&mut self, conn: Stream) -> Result<()> {
        let result = conn.shutdown();
        drop(conn);
        debug!("stream closed");
        result
    }
}
