use relaywire_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter};
use relaywire_transport::{Endpoint, Listener, Stream};
use tracing::debug;

use crate::error::{RelayError, Result};

/// Accepts connections on an endpoint and wraps each in a [`Session`].
pub struct RelayListener {
    listener: Listener,
    config: FrameConfig,
}

impl RelayListener {
    /// Bind with default frame configuration.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        Self::bind_with_config(endpoint, FrameConfig::default())
    }

    pub fn bind_with_config(endpoint: &Endpoint, config: FrameConfig) -> Result<Self> {
        let listener = Listener::bind(endpoint).map_err(RelayError::Listen)?;
        Ok(Self { listener, config })
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<Session> {
        let stream = self.listener.accept().map_err(RelayError::Listen)?;
        Session::from_stream(stream, self.config.clone())
    }

    /// The endpoint clients should connect to.
    pub fn local_endpoint(&self) -> Result<Endpoint> {
        self.listener.local_endpoint().map_err(RelayError::Listen)
    }

    pub fn transport_name(&self) -> &'static str {
        self.listener.transport_name()
    }
}

/// The serving end of one accepted connection.
pub struct Session {
    reader: FrameReader<Stream>,
    writer: FrameWriter<Stream>,
    peer: String,
}

impl Session {
    /// Split an accepted stream into framed read and write halves.
    pub fn from_stream(stream: Stream, config: FrameConfig) -> Result<Self> {
        let peer = stream.peer_description();
        let reader_stream = stream.try_clone().map_err(RelayError::Listen)?;
        let reader = FrameReader::with_config_stream(reader_stream, config.clone())
            .map_err(RelayError::Prefix)?;
        let writer = FrameWriter::with_config_stream(stream, config).map_err(RelayError::Send)?;

        debug!(%peer, "session opened");
        Ok(Self {
            reader,
            writer,
            peer,
        })
    }

    /// Receive the next frame.
    ///
    /// A clean EOF between frames is [`RelayError::Disconnected`].
    pub fn recv(&mut self) -> Result<Frame> {
        self.reader.read_frame().map_err(|err| match err {
            FrameError::ConnectionClosed => RelayError::Disconnected,
            other => RelayError::Prefix(other),
        })
    }

    pub fn send(&mut self, frame: &Frame) -> Result<()> {
        self.writer.write_frame(frame).map_err(RelayError::Send)
    }

    pub fn send_batch(&mut self, frames: &[Frame]) -> Result<()> {
        self.writer.write_batch(frames).map_err(RelayError::Send)
    }

    /// Description of the connected peer, for logs and output.
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("peer", &self.peer).finish()
    }
}
