use std::fmt;
use std::io;

use relaywire_frame::FrameError;
use relaywire_relay::RelayError;
use relaywire_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Bind { source, .. }
        | TransportError::Connect { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
        TransportError::InvalidEndpoint(_) | TransportError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::InvalidPrefix { .. } | FrameError::BodyTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed | FrameError::Truncated { .. } => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

pub fn relay_error(context: &str, err: RelayError) -> CliError {
    match err {
        RelayError::Configuration(_) => CliError::new(USAGE, format!("{context}: {err}")),
        RelayError::Connection(err) | RelayError::Listen(err) | RelayError::Close(err) => {
            transport_error(context, err)
        }
        RelayError::Prefix(err) | RelayError::Send(err) => frame_error(context, err),
        RelayError::Disconnected => CliError::new(FAILURE, format!("{context}: {err}")),
        RelayError::NotConnected | RelayError::Desynchronized => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refused_connect_is_transport_error() {
        let err = RelayError::Connection(TransportError::Connect {
            endpoint: "tcp://127.0.0.1:1".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        });
        let cli = relay_error("connect failed", err);
        assert_eq!(cli.code, TRANSPORT_ERROR);
        assert!(cli.message.starts_with("connect failed: "));
    }

    #[test]
    fn read_timeout_maps_to_timeout() {
        let err = RelayError::Prefix(FrameError::Io(io::Error::from(io::ErrorKind::WouldBlock)));
        assert_eq!(relay_error("receive failed", err).code, TIMEOUT);
    }

    #[test]
    fn corrupt_prefix_is_data_invalid() {
        let err = RelayError::Prefix(FrameError::InvalidPrefix { size: 1, check: 2 });
        let cli = relay_error("receive failed", err);
        assert_eq!(cli.code, DATA_INVALID);
        assert!(cli.message.contains("invalid prefix (checksum)"));
    }

    #[test]
    fn bad_endpoint_is_usage_error() {
        let err = RelayError::Configuration("port 70000 out of range".to_string());
        assert_eq!(relay_error("invalid endpoint", err).code, USAGE);
        let err = TransportError::InvalidEndpoint("empty".to_string());
        assert_eq!(transport_error("invalid endpoint", err).code, USAGE);
    }

    #[test]
    fn hangup_is_failure() {
        assert_eq!(relay_error("receive failed", RelayError::Disconnected).code, FAILURE);
        let err = FrameError::Truncated {
            expected: 10,
            received: 3,
        };
        assert_eq!(frame_error("receive failed", err).code, FAILURE);
    }
}
