use bytes::BytesMut;
use relaywire_frame::{check_body_size, encode_frame, read_frame, write_all, Frame, FrameConfig};
use relaywire_transport::{Connector, Endpoint, EndpointKind, SocketConnector};
use tracing::{debug, trace, warn};

use crate::error::{RelayError, Result};

/// A live connection and its per-connection state.
struct Connection<S> {
    stream: S,
    buf: BytesMut,
    /// Set after any failed read or write; the stream position is unknown.
    desynchronized: bool,
}

/// One logical connection to one endpoint.
///
/// Starts disconnected. [`connect`](Self::connect) is idempotent, and `send`
/// and `wait_frame` connect on demand. [`close`](Self::close) releases the
/// socket; dropping a connected relay closes it.
///
/// After a failed `send` or `wait_frame` the relay keeps its socket but
/// refuses further traffic with [`RelayError::Desynchronized`] until it is
/// closed and reconnected.
pub struct Relay<C: Connector = SocketConnector> {
    endpoint: Endpoint,
    config: FrameConfig,
    connector: C,
    conn: Option<Connection<C::Conn>>,
}

impl Relay<SocketConnector> {
    /// A relay over OS sockets with default configuration.
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            config: FrameConfig::default(),
            connector: SocketConnector::new(),
            conn: None,
        }
    }

    /// A relay over OS sockets. Socket timeouts come from `config`.
    pub fn with_config(endpoint: Endpoint, config: FrameConfig) -> Result<Self> {
        let connector = SocketConnector::with_timeouts(config.read_timeout, config.write_timeout);
        Self::with_connector(endpoint, config, connector)
    }

    /// Validate raw endpoint parts and build a relay for them.
    ///
    /// A network endpoint needs a port in `0..=65535`; a local endpoint
    /// ignores the port. Nothing touches a socket here.
    pub fn with_address(
        kind: EndpointKind,
        address: impl Into<String>,
        port: Option<u32>,
    ) -> Result<Self> {
        let endpoint = Endpoint::new(kind, address, port).map_err(RelayError::configuration)?;
        Ok(Self::new(endpoint))
    }
}

impl<C: Connector> Relay<C> {
    /// A relay driving an explicit connector.
    pub fn with_connector(endpoint: Endpoint, config: FrameConfig, connector: C) -> Result<Self> {
        if config.buffer_size == 0 {
            return Err(RelayError::Configuration(
                "buffer size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            endpoint,
            config,
            connector,
            conn: None,
        })
    }

    /// Connect if not already connected.
    ///
    /// On failure the relay stays disconnected.
    pub fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let stream = self
            .connector
            .connect(&self.endpoint)
            .map_err(RelayError::Connection)?;
        debug!(endpoint = %self.endpoint, "relay connected");

        self.conn = Some(Connection {
            stream,
            buf: BytesMut::new(),
            desynchronized: false,
        });
        Ok(())
    }

    /// Release the socket.
    ///
    /// Fails with [`RelayError::NotConnected`] if there is nothing to close.
    /// The relay is disconnected afterwards even when the release fails.
    pub fn close(&mut self) -> Result<()> {
        let conn = self.conn.take().ok_or(RelayError::NotConnected)?;
        debug!(endpoint = %self.endpoint, "relay closing");
        self.connector.close(conn.stream).map_err(RelayError::Close)
    }

    /// Send one frame.
    pub fn send(&mut self, frame: &Frame) -> Result<()> {
        self.send_batch(std::slice::from_ref(frame))
    }

    /// Send several frames, in order, as one contiguous write.
    pub fn send_batch(&mut self, frames: &[Frame]) -> Result<()> {
        for frame in frames {
            check_body_size(frame, self.config.max_body_size).map_err(RelayError::Send)?;
        }

        self.connect()?;
        let conn = usable(self.conn.as_mut())?;

        conn.buf.clear();
        for frame in frames {
            encode_frame(frame, &mut conn.buf);
        }

        if let Err(err) = write_all(&mut conn.stream, &conn.buf) {
            conn.desynchronized = true;
            return Err(RelayError::Send(err));
        }

        trace!(frames = frames.len(), bytes = conn.buf.len(), "sent");
        Ok(())
    }

    /// Block until one complete frame has been received.
    pub fn wait_frame(&mut self) -> Result<Frame> {
        self.connect()?;
        let conn = usable(self.conn.as_mut())?;

        match read_frame(&mut conn.stream, &self.config) {
            Ok(frame) => Ok(frame),
            Err(err) => {
                conn.desynchronized = true;
                Err(RelayError::Prefix(err))
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// True when the connection must be closed before further use.
    pub fn is_desynchronized(&self) -> bool {
        self.conn.as_ref().is_some_and(|conn| conn.desynchronized)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

fn usable<S>(conn: Option<&mut Connection<S>>) -> Result<&mut Connection<S>> {
    match conn {
        Some(conn) if conn.desynchronized => Err(RelayError::Desynchronized),
        Some(conn) => Ok(conn),
        None => Err(RelayError::NotConnected),
    }
}

impl<C: Connector> Drop for Relay<C> {
    fn drop(&mut self) {
        if self.conn.is_some() {
            if let Err(err) = self.close() {
                warn!(endpoint = %self.endpoint, error = %err, "close on drop failed");
            }
        }
    }
}

impl<C: Connector> std::fmt::Debug for Relay<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("endpoint", &self.endpoint)
            .field("connected", &self.is_connected())
            .field("desynchronized", &self.is_desynchronized())
            .finish()
    }
}
