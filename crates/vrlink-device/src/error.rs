use vrlink_frame::opcode_name;
use vrlink_session::{ErrorKind, RecordError, SessionError};
use vrlink_transport::TransportError;

/// Errors returned by module commands.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The exchange with the module failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A record-id list was rejected before sending.
    #[error("invalid record list: {0}")]
    Records(#[from] RecordError),

    /// An argument is out of range; nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The module answered in the right family with an unusable payload.
    #[error("malformed {} reply: {reason}", name(.opcode))]
    MalformedReply { opcode: u8, reason: String },

    /// Another thread panicked while holding the shared module.
    #[error("shared module lock poisoned")]
    LockPoisoned,
}

impl DeviceError {
    /// The session error kind, when the failure happened on the wire.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Session(err) => Some(err.kind()),
            _ => None,
        }
    }

    pub(crate) fn malformed(opcode: u8, reason: impl Into<String>) -> Self {
        Self::MalformedReply {
            opcode,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<TransportError> for DeviceError {
    fn from(err: TransportError) -> Self {
        Self::Session(SessionError::Transport(err))
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;

fn name(opcode: &u8) -> &'static str {
    opcode_name(*opcode)
}
