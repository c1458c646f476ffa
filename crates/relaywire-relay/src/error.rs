use relaywire_frame::FrameError;
use relaywire_transport::TransportError;

/// The four classes of failure a relay reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Invalid construction arguments. Never fixed by retrying.
    Configuration,
    /// Socket allocation or connect failed.
    Connection,
    /// Malformed, incomplete or inconsistent prefix; the stream is desynchronized.
    Prefix,
    /// Write failure or misuse of the connection lifecycle.
    Transport,
}

/// Errors that can occur in relay operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Invalid endpoint or relay configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Connecting to the endpoint failed.
    #[error("connection error: {0}")]
    Connection(#[source] TransportError),

    /// Binding or accepting on a listening endpoint failed.
    #[error("listen error: {0}")]
    Listen(#[source] TransportError),

    /// Receiving a frame failed.
    #[error("prefix error: {0}")]
    Prefix(#[source] FrameError),

    /// Writing frames failed.
    #[error("send failed: {0}")]
    Send(#[source] FrameError),

    /// Releasing the socket failed. The relay is disconnected regardless.
    #[error("close failed: {0}")]
    Close(#[source] TransportError),

    /// `close` was called on a relay that is not connected.
    #[error("relay is not connected")]
    NotConnected,

    /// An earlier failure left the stream position unknown.
    #[error("connection is desynchronized; close and reconnect")]
    Desynchronized,

    /// The peer closed the connection between frames.
    #[error("peer disconnected")]
    Disconnected,
}

impl RelayError {
    /// Map this error onto the four-class taxonomy.
    pub fn class(&self) -> ErrorClass {
        match self {
            RelayError::Configuration(_) => ErrorClass::Configuration,
            RelayError::Connection(_) | RelayError::Listen(_) => ErrorClass::Connection,
            RelayError::Prefix(_) => ErrorClass::Prefix,
            RelayError::Send(_)
            | RelayError::Close(_)
            | RelayError::NotConnected
            | RelayError::Desynchronized
            | RelayError::Disconnected => ErrorClass::Transport,
        }
    }

    pub(crate) fn configuration(err: TransportError) -> Self {
        match err {
            TransportError::InvalidEndpoint(reason) => RelayError::Configuration(reason),
            other => RelayError::Configuration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
