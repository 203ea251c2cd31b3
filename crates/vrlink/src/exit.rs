use std::fmt;
use std::io;

use vrlink_device::DeviceError;
use vrlink_session::{ErrorKind, SessionError};
use vrlink_transport::TransportError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
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
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { source, .. } if source.kind() == io::ErrorKind::PermissionDenied => {
            io_error(context, source)
        }
        TransportError::Io(source) => io_error(context, source),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        other => {
            let code = match other.kind() {
                ErrorKind::Timeout => TIMEOUT,
                ErrorKind::Framing | ErrorKind::UnexpectedReply | ErrorKind::ProtocolViolation => {
                    DATA_INVALID
                }
                ErrorKind::Transport => TRANSPORT_ERROR,
            };
            CliError::new(code, format!("{context}: {other}"))
        }
    }
}

pub fn device_error(context: &str, err: DeviceError) -> CliError {
    match err {
        DeviceError::Session(err) => session_error(context, err),
        DeviceError::Records(_) | DeviceError::InvalidArgument(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        DeviceError::MalformedReply { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        DeviceError::LockPoisoned => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timeouts_map_to_timeout_code() {
        let err = DeviceError::Session(SessionError::Timeout {
            waited: Duration::from_secs(1),
            partial: 0,
        });
        assert_eq!(device_error("load", err).code, TIMEOUT);
    }

    #[test]
    fn protocol_errors_are_invalid_data() {
        let err = DeviceError::Session(SessionError::UnexpectedReply {
            expected: 0x30,
            found: 0xFF,
        });
        assert_eq!(device_error("load", err).code, DATA_INVALID);

        let err = DeviceError::MalformedReply {
            opcode: 0x01,
            reason: "short".to_string(),
        };
        assert_eq!(device_error("recognizer", err).code, DATA_INVALID);
    }

    #[test]
    fn argument_errors_are_usage() {
        let err = DeviceError::InvalidArgument("baud".to_string());
        assert_eq!(device_error("system baud", err).code, USAGE);
    }

    #[test]
    fn open_failures() {
        let denied = TransportError::Open {
            path: "/dev/ttyUSB0".to_string(),
            baud_rate: 38400,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(transport_error("open", denied).code, PERMISSION_DENIED);

        let missing = TransportError::Open {
            path: "/dev/ttyUSB9".to_string(),
            baud_rate: 38400,
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(transport_error("open", missing).code, TRANSPORT_ERROR);
    }
}
